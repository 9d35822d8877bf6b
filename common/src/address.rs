// Copyright (c) 2018-2022 The Botho Foundation

//! The ServerAddress type

use alloc::{
    borrow::ToOwned,
    string::{String, ToString},
};
use core::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};
use displaydoc::Display;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// The port a data-store node listens on when an address does not name one.
pub const DEFAULT_PORT: u16 = 27017;

/// Why an address failed to parse
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AddressIssue {
    /// the text is empty
    Empty,
    /// the host part is empty
    EmptyHost,
    /// the host contains ':' but is not a bracketed IPv6 literal
    UnbracketedColon,
    /// the port is not a decimal number
    InvalidPort,
    /// the port is outside 1..=65535
    PortOutOfRange,
}

/// Invalid address {text:?}: {reason}
#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
pub struct InvalidAddress {
    /// The text that failed to parse
    pub text: String,
    /// What was wrong with it
    pub reason: AddressIssue,
}

impl InvalidAddress {
    fn new(text: &str, reason: AddressIssue) -> Self {
        Self {
            text: text.to_owned(),
            reason,
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InvalidAddress {}

/// A network endpoint of a cluster member, normalized to `host:port`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ServerAddress {
    host: String,
    port: u16,
}

impl ServerAddress {
    /// Build an address from a host and an explicit port.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, InvalidAddress> {
        let host = host.into();
        if port == 0 {
            return Err(InvalidAddress::new(
                &alloc::format!("{host}:{port}"),
                AddressIssue::PortOutOfRange,
            ));
        }
        if let Err(reason) = check_host(&host) {
            return Err(InvalidAddress {
                text: host,
                reason,
            });
        }
        Ok(Self { host, port })
    }

    /// Parse `host` or `host:port`.
    ///
    /// The port is whatever follows the last `:`; when the text has no port
    /// the [DEFAULT_PORT] is used. IPv6 hosts must be bracketed, e.g.
    /// `[::1]:27017`.
    pub fn parse(text: &str) -> Result<Self, InvalidAddress> {
        if text.is_empty() {
            return Err(InvalidAddress::new(text, AddressIssue::Empty));
        }

        // A bracketed literal with no port still contains colons, so only a
        // colon after the closing bracket separates the port.
        let port_sep = match text.rfind(']') {
            Some(close) => text[close..].rfind(':').map(|i| close + i),
            None => text.rfind(':'),
        };

        let (host, port) = match port_sep {
            Some(idx) => (&text[..idx], parse_port(text, &text[idx + 1..])?),
            None => (text, DEFAULT_PORT),
        };

        check_host(host).map_err(|reason| InvalidAddress::new(text, reason))?;

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    /// The host name or IP literal (IPv6 literals keep their brackets).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port, explicit or defaulted.
    pub fn port(&self) -> u16 {
        self.port
    }
}

fn parse_port(text: &str, port: &str) -> Result<u16, InvalidAddress> {
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InvalidAddress::new(text, AddressIssue::InvalidPort));
    }
    match port.parse::<u32>() {
        Ok(value @ 1..=65535) => Ok(value as u16),
        _ => Err(InvalidAddress::new(text, AddressIssue::PortOutOfRange)),
    }
}

fn check_host(host: &str) -> Result<(), AddressIssue> {
    if host.is_empty() {
        return Err(AddressIssue::EmptyHost);
    }
    let bracketed = host.len() > 2 && host.starts_with('[') && host.ends_with(']');
    if host.contains(':') && !bracketed {
        return Err(AddressIssue::UnbracketedColon);
    }
    Ok(())
}

impl Display for ServerAddress {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for ServerAddress {
    type Err = InvalidAddress;

    fn from_str(src: &str) -> Result<ServerAddress, Self::Err> {
        Self::parse(src)
    }
}

impl Serialize for ServerAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ServerAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(de::Error::custom)
    }
}
