// Copyright (c) 2018-2022 The Botho Foundation

#![no_std]
#![deny(missing_docs)]

//! Types shared by every crate in the workspace: the cluster member address
//! and the logging setup.

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod address;

pub use crate::address::{AddressIssue, InvalidAddress, ServerAddress, DEFAULT_PORT};

#[cfg(feature = "log")]
pub mod logger;
