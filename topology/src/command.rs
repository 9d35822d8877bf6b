// Copyright (c) 2018-2022 The Botho Foundation

//! The generic command status carried by every reply, the handshake included.

use crate::{error::CommandError, response::HandshakeResponse};

/// Outcome of a command as reported in its reply (`ok`, `code`, `errmsg`).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommandStatus {
    /// The `ok` flag; a reply without one did not succeed.
    pub ok: bool,
    /// Server error code.
    pub code: Option<i32>,
    /// Server error message.
    pub error_message: Option<String>,
}

impl CommandStatus {
    /// Read the status fields of a reply.
    pub fn from_response<R: HandshakeResponse + ?Sized>(response: &R) -> Self {
        Self {
            ok: response.get_bool("ok", false),
            code: response
                .has_field("code")
                .then(|| response.get_int("code", 0)),
            error_message: response.get_string("errmsg"),
        }
    }

    /// `Ok(())` for a successful command, otherwise the reported failure.
    pub fn check(&self) -> Result<(), CommandError> {
        if self.ok {
            return Ok(());
        }
        Err(CommandError::Failed {
            code: self.code,
            message: self
                .error_message
                .clone()
                .unwrap_or_else(|| "unknown error".to_owned()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use assert_matches::assert_matches;

    #[test]
    fn test_ok_reply() {
        let reply = Document::new().with("ismaster", true).with("ok", 1.0);
        let status = CommandStatus::from_response(&reply);
        assert!(status.ok);
        assert_eq!(status.code, None);
        assert_eq!(status.check(), Ok(()));
    }

    #[test]
    fn test_failed_reply() {
        let reply = Document::new()
            .with("ok", 0.0)
            .with("errmsg", "not authorized")
            .with("code", 13);
        let status = CommandStatus::from_response(&reply);

        assert!(!status.ok);
        assert_matches!(
            status.check(),
            Err(CommandError::Failed { code: Some(13), ref message }) if message == "not authorized"
        );
    }

    #[test]
    fn test_missing_ok_is_failure() {
        let status = CommandStatus::from_response(&Document::new());
        let err = status.check().unwrap_err();
        assert_eq!(err.to_string(), "Command failed (code None): unknown error");
    }
}
