// Copyright (c) 2018-2022 The Botho Foundation

//! Error types for topology derivation.

use crate::response::FieldShapeError;
use displaydoc::Display;
use rsm_common::InvalidAddress;
use thiserror::Error;

/// Errors that can occur while deriving a topology descriptor.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum TopologyError {
    /// Malformed `{field}` member list: {source}
    MalformedTopologyField {
        /// Name of the member list field
        field: &'static str,
        /// What was wrong with the list
        source: MemberListIssue,
    },
}

/// Why a member list was rejected.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum MemberListIssue {
    /// {0}
    Shape(#[from] FieldShapeError),
    /// {0}
    Address(#[from] InvalidAddress),
}

/// Errors reported by a node in its command reply.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum CommandError {
    /// Command failed (code {code:?}): {message}
    Failed {
        /// Server error code, if one was given
        code: Option<i32>,
        /// Server error message
        message: String,
    },
}
