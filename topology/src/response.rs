// Copyright (c) 2018-2022 The Botho Foundation

//! Read access to a decoded handshake response.

use crate::document::Value;
use displaydoc::Display;
use thiserror::Error;

/// A present field that does not have the shape a strict lookup requires.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum FieldShapeError {
    /// Expected an array, found {found}
    NotAnArray {
        /// Rendering of the value that was found
        found: String,
    },
    /// Element {index} is not a string: {found}
    NotAString {
        /// Position of the element in the array
        index: usize,
        /// Rendering of the element
        found: String,
    },
}

/// Typed, defaulting lookups over a decoded handshake response.
///
/// Implementations decide how a value of the wrong type is treated; the
/// contract is only that a lookup never fails. Absent and ill-typed fields
/// produce the default (or `None`, or an empty list). The one exception is
/// [HandshakeResponse::try_get_string_array], used for fields whose shape
/// must not be guessed.
pub trait HandshakeResponse {
    /// True when the response contains `name`.
    fn has_field(&self, name: &str) -> bool;

    /// Boolean field, or `default`.
    fn get_bool(&self, name: &str, default: bool) -> bool;

    /// String field, or `None`.
    fn get_string(&self, name: &str) -> Option<String>;

    /// Integer field, or `default`.
    fn get_int(&self, name: &str, default: i32) -> i32;

    /// Array field as strings, or an empty list.
    fn get_string_array(&self, name: &str) -> Vec<String>;

    /// Array field whose elements must all be strings. Absent gives an empty
    /// list; anything else that is not an array of strings is an error.
    fn try_get_string_array(&self, name: &str) -> Result<Vec<String>, FieldShapeError>;

    /// Subdocument field as ordered `(name, value)` pairs, or an empty list.
    fn get_subdocument(&self, name: &str) -> Vec<(String, Value)>;
}

impl<T: HandshakeResponse + ?Sized> HandshakeResponse for &T {
    fn has_field(&self, name: &str) -> bool {
        (**self).has_field(name)
    }

    fn get_bool(&self, name: &str, default: bool) -> bool {
        (**self).get_bool(name, default)
    }

    fn get_string(&self, name: &str) -> Option<String> {
        (**self).get_string(name)
    }

    fn get_int(&self, name: &str, default: i32) -> i32 {
        (**self).get_int(name, default)
    }

    fn get_string_array(&self, name: &str) -> Vec<String> {
        (**self).get_string_array(name)
    }

    fn try_get_string_array(&self, name: &str) -> Result<Vec<String>, FieldShapeError> {
        (**self).try_get_string_array(name)
    }

    fn get_subdocument(&self, name: &str) -> Vec<(String, Value)> {
        (**self).get_subdocument(name)
    }
}
