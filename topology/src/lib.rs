// Copyright (c) 2018-2022 The Botho Foundation

#![deny(missing_docs)]

//! Topology descriptors for replica set members.
//!
//! A cluster monitor sends each member a handshake command and hands the
//! decoded reply to [TopologyDescriptor::derive], which turns it into a
//! normalized view of the member's role, the peers it knows about and the
//! size limits for traffic sent to it. Replies are read through the
//! [HandshakeResponse] trait, so any decoded representation can be used;
//! [Document] is the in-memory one.

mod command;
mod descriptor;
mod document;
mod error;
mod response;
mod tag_set;

pub use crate::{
    command::CommandStatus,
    descriptor::{
        MemberKind, ServerRole, TopologyDescriptor, DEFAULT_MAX_DOCUMENT_SIZE,
        DEFAULT_MAX_MESSAGE_SIZE, MESSAGE_HEADROOM,
    },
    document::{Document, Value},
    error::{CommandError, MemberListIssue, TopologyError},
    response::{FieldShapeError, HandshakeResponse},
    tag_set::TagSet,
};
pub use rsm_common::{AddressIssue, InvalidAddress, ServerAddress, DEFAULT_PORT};
