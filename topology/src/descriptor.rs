// Copyright (c) 2018-2022 The Botho Foundation

//! Derivation of a member's topology descriptor from its handshake response.

use crate::{
    error::{MemberListIssue, TopologyError},
    response::HandshakeResponse,
    tag_set::TagSet,
};
use displaydoc::Display;
use rsm_common::ServerAddress;
use serde::Serialize;
use tracing::{debug, trace};

/// Largest document a node accepts when it does not say otherwise (4 MiB).
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 4 * 1024 * 1024;

/// Lower bound for the largest wire message sent to a node.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16_000_000;

/// Room left in a message for the header and command envelope around the
/// largest document.
pub const MESSAGE_HEADROOM: usize = 1024;

/// The role a member plays, as far as its own handshake tells.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerRole {
    /// primary
    Primary,
    /// arbiter
    Arbiter,
    /// hidden
    Hidden,
    /// passive
    Passive,
    /// secondary
    Secondary,
    /// other
    Other,
}

/// Which member list of a descriptor an address was found in.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    /// host
    Host,
    /// passive
    Passive,
    /// arbiter
    Arbiter,
}

/// What a single member reported about itself and the replica set, at the
/// moment of one handshake.
///
/// Built only by [TopologyDescriptor::derive], so two invariants always hold:
/// a member is never both arbiter and passive, and
/// `max_message_size >= max_document_size + MESSAGE_HEADROOM`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TopologyDescriptor {
    is_primary: bool,
    is_secondary: bool,
    is_arbiter_only: bool,
    is_passive: bool,
    is_hidden: bool,
    hosts: Vec<ServerAddress>,
    passives: Vec<ServerAddress>,
    arbiters: Vec<ServerAddress>,
    primary: Option<ServerAddress>,
    me: Option<ServerAddress>,
    replica_set_name: Option<String>,
    tags: TagSet,
    max_document_size: usize,
    max_message_size: usize,
    message: Option<String>,
}

impl TopologyDescriptor {
    /// Derive the descriptor of the member that sent `response`.
    ///
    /// Missing or ill-typed fields fall back to their defaults. The only
    /// failure is a malformed `hosts`, `passives` or `arbiters` list: present
    /// but not an array, holding a non-string element, or holding an
    /// unparsable address. The advertised `primary` and `me` are hints and are
    /// dropped instead.
    pub fn derive<R: HandshakeResponse + ?Sized>(response: &R) -> Result<Self, TopologyError> {
        let is_arbiter_only = response.get_bool("arbiterOnly", false);
        // Some servers report arbiters as passive too; arbiter wins.
        let is_passive = response.get_bool("passive", false) && !is_arbiter_only;

        // A non-positive size is treated as unreported rather than passed
        // through, since no node can accept documents of that size.
        let max_document_size = match response.get_int("maxBsonObjectSize", 0) {
            0 => DEFAULT_MAX_DOCUMENT_SIZE,
            reported => usize::try_from(reported)
                .ok()
                .filter(|size| *size > 0)
                .unwrap_or_else(|| {
                    debug!(reported, "ignoring non-positive maxBsonObjectSize");
                    DEFAULT_MAX_DOCUMENT_SIZE
                }),
        };
        let max_message_size =
            DEFAULT_MAX_MESSAGE_SIZE.max(max_document_size.saturating_add(MESSAGE_HEADROOM));

        let descriptor = Self {
            is_primary: response.get_bool("ismaster", false),
            is_secondary: response.get_bool("secondary", false),
            is_arbiter_only,
            is_passive,
            is_hidden: response.get_bool("hidden", false),
            hosts: member_list(response, "hosts")?,
            passives: member_list(response, "passives")?,
            arbiters: member_list(response, "arbiters")?,
            primary: advertised_address(response, "primary"),
            me: advertised_address(response, "me"),
            replica_set_name: response.get_string("setName"),
            tags: TagSet::from_document(&response.get_subdocument("tags")),
            max_document_size,
            max_message_size,
            message: response.get_string("msg"),
        };

        trace!(
            role = %descriptor.role(),
            set = ?descriptor.replica_set_name,
            members = descriptor.members().count(),
            "derived topology descriptor"
        );

        Ok(descriptor)
    }

    /// The member believes it is the primary.
    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// The member reports secondary state.
    pub fn is_secondary(&self) -> bool {
        self.is_secondary
    }

    /// The member is an arbiter and holds no data.
    pub fn is_arbiter_only(&self) -> bool {
        self.is_arbiter_only
    }

    /// The member is passive. Never true for an arbiter.
    pub fn is_passive(&self) -> bool {
        self.is_passive
    }

    /// The member is hidden from client read routing.
    pub fn is_hidden(&self) -> bool {
        self.is_hidden
    }

    /// Data-bearing voting members known to this member, in reported order.
    pub fn hosts(&self) -> &[ServerAddress] {
        &self.hosts
    }

    /// Passive members known to this member, in reported order.
    pub fn passives(&self) -> &[ServerAddress] {
        &self.passives
    }

    /// Arbiters known to this member, in reported order.
    pub fn arbiters(&self) -> &[ServerAddress] {
        &self.arbiters
    }

    /// Who this member thinks the primary is.
    pub fn primary(&self) -> Option<&ServerAddress> {
        self.primary.as_ref()
    }

    /// This member's own canonical address.
    pub fn me(&self) -> Option<&ServerAddress> {
        self.me.as_ref()
    }

    /// Replica set name; `None` for a standalone server.
    pub fn replica_set_name(&self) -> Option<&str> {
        self.replica_set_name.as_deref()
    }

    /// Operator tags.
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Largest document the member accepts, in bytes.
    pub fn max_document_size(&self) -> usize {
        self.max_document_size
    }

    /// Largest wire message to send the member, in bytes.
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Free-form diagnostic message from the member.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The member's role. When several flags are set the first of primary,
    /// arbiter, hidden, passive, secondary wins.
    pub fn role(&self) -> ServerRole {
        if self.is_primary {
            ServerRole::Primary
        } else if self.is_arbiter_only {
            ServerRole::Arbiter
        } else if self.is_hidden {
            ServerRole::Hidden
        } else if self.is_passive {
            ServerRole::Passive
        } else if self.is_secondary {
            ServerRole::Secondary
        } else {
            ServerRole::Other
        }
    }

    /// True when the member belongs to a replica set.
    pub fn is_replica_set_member(&self) -> bool {
        self.replica_set_name.is_some()
    }

    /// Every known member: hosts, then passives, then arbiters.
    pub fn members(&self) -> impl Iterator<Item = &ServerAddress> + '_ {
        self.members_by_kind().map(|(_, address)| address)
    }

    /// Every known member along with the list it came from.
    pub fn members_by_kind(&self) -> impl Iterator<Item = (MemberKind, &ServerAddress)> + '_ {
        let hosts = self.hosts.iter().map(|a| (MemberKind::Host, a));
        let passives = self.passives.iter().map(|a| (MemberKind::Passive, a));
        let arbiters = self.arbiters.iter().map(|a| (MemberKind::Arbiter, a));
        hosts.chain(passives).chain(arbiters)
    }

    /// True when `address` appears in any member list.
    pub fn knows_member(&self, address: &ServerAddress) -> bool {
        self.members().any(|member| member == address)
    }
}

fn member_list<R: HandshakeResponse + ?Sized>(
    response: &R,
    field: &'static str,
) -> Result<Vec<ServerAddress>, TopologyError> {
    let malformed =
        |source: MemberListIssue| TopologyError::MalformedTopologyField { field, source };
    response
        .try_get_string_array(field)
        .map_err(|err| malformed(err.into()))?
        .iter()
        .map(|text| ServerAddress::parse(text).map_err(|err| malformed(err.into())))
        .collect()
}

fn advertised_address<R: HandshakeResponse + ?Sized>(
    response: &R,
    field: &str,
) -> Option<ServerAddress> {
    let text = response.get_string(field)?;
    match ServerAddress::parse(&text) {
        Ok(address) => Some(address),
        Err(err) => {
            debug!(field, %err, "ignoring unparsable advertised address");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        document::{Document, Value},
        response::FieldShapeError,
    };
    use assert_matches::assert_matches;
    use rsm_common::{AddressIssue, InvalidAddress};

    fn addr(text: &str) -> ServerAddress {
        ServerAddress::parse(text).unwrap()
    }

    #[test]
    fn test_empty_response_uses_defaults() {
        let descriptor = TopologyDescriptor::derive(&Document::new()).unwrap();

        assert!(!descriptor.is_primary());
        assert!(!descriptor.is_secondary());
        assert!(!descriptor.is_arbiter_only());
        assert!(!descriptor.is_passive());
        assert!(!descriptor.is_hidden());
        assert!(descriptor.hosts().is_empty());
        assert!(descriptor.passives().is_empty());
        assert!(descriptor.arbiters().is_empty());
        assert_eq!(descriptor.primary(), None);
        assert_eq!(descriptor.me(), None);
        assert_eq!(descriptor.replica_set_name(), None);
        assert!(descriptor.tags().is_empty());
        assert_eq!(descriptor.max_document_size(), DEFAULT_MAX_DOCUMENT_SIZE);
        assert_eq!(descriptor.max_message_size(), DEFAULT_MAX_MESSAGE_SIZE);
        assert_eq!(descriptor.message(), None);
        assert_eq!(descriptor.role(), ServerRole::Other);
        assert!(!descriptor.is_replica_set_member());
    }

    #[test]
    fn test_arbiter_overrides_passive() {
        let response = Document::new()
            .with("arbiterOnly", true)
            .with("passive", true);
        let descriptor = TopologyDescriptor::derive(&response).unwrap();

        assert!(descriptor.is_arbiter_only());
        assert!(!descriptor.is_passive());
        assert_eq!(descriptor.role(), ServerRole::Arbiter);
    }

    #[test]
    fn test_passive_without_arbiter() {
        let response = Document::new()
            .with("secondary", true)
            .with("passive", true);
        let descriptor = TopologyDescriptor::derive(&response).unwrap();

        assert!(descriptor.is_passive());
        assert!(descriptor.is_secondary());
        assert_eq!(descriptor.role(), ServerRole::Passive);
    }

    #[test]
    fn test_role_precedence() {
        let cases = [
            (Document::new().with("ismaster", true).with("secondary", true), ServerRole::Primary),
            (Document::new().with("secondary", true), ServerRole::Secondary),
            (
                Document::new()
                    .with("secondary", true)
                    .with("passive", true)
                    .with("hidden", true),
                ServerRole::Hidden,
            ),
            (
                Document::new().with("arbiterOnly", true).with("hidden", true),
                ServerRole::Arbiter,
            ),
        ];

        for (response, expected) in cases {
            let descriptor = TopologyDescriptor::derive(&response).unwrap();
            assert_eq!(descriptor.role(), expected, "{response}");
        }
    }

    #[test]
    fn test_member_lists_keep_order() {
        let response = Document::new()
            .with("hosts", vec!["b:27017", "a:27017"])
            .with("passives", vec!["p"])
            .with("arbiters", vec!["arb:27019"]);
        let descriptor = TopologyDescriptor::derive(&response).unwrap();

        assert_eq!(descriptor.hosts(), [addr("b:27017"), addr("a:27017")]);
        assert_eq!(descriptor.passives(), [addr("p:27017")]);
        assert_eq!(descriptor.arbiters(), [addr("arb:27019")]);

        let all: Vec<String> = descriptor.members().map(ToString::to_string).collect();
        assert_eq!(all, ["b:27017", "a:27017", "p:27017", "arb:27019"]);

        let kinds: Vec<MemberKind> = descriptor.members_by_kind().map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            [MemberKind::Host, MemberKind::Host, MemberKind::Passive, MemberKind::Arbiter]
        );

        assert!(descriptor.knows_member(&addr("arb:27019")));
        assert!(!descriptor.knows_member(&addr("arb:27018")));
    }

    #[test]
    fn test_member_lists_are_not_deduplicated() {
        let response = Document::new().with("hosts", vec!["a", "a:27017"]);
        let descriptor = TopologyDescriptor::derive(&response).unwrap();
        assert_eq!(descriptor.hosts().len(), 2);
    }

    #[test]
    fn test_malformed_member_fails() {
        for field in ["hosts", "passives", "arbiters"] {
            let response = Document::new().with(field, vec!["good:1", "not-an-address:abc"]);
            assert_matches!(
                TopologyDescriptor::derive(&response),
                Err(TopologyError::MalformedTopologyField {
                    field: f,
                    source: MemberListIssue::Address(InvalidAddress {
                        reason: AddressIssue::InvalidPort,
                        ..
                    }),
                }) if f == field
            );
        }
    }

    #[test]
    fn test_non_string_member_fails() {
        for field in ["hosts", "passives", "arbiters"] {
            let response = Document::new().with(
                field,
                Value::Array(vec![Value::from("a:27017"), Value::Null]),
            );
            assert_matches!(
                TopologyDescriptor::derive(&response),
                Err(TopologyError::MalformedTopologyField {
                    field: f,
                    source: MemberListIssue::Shape(FieldShapeError::NotAString { index: 1, .. }),
                }) if f == field
            );
        }

        for element in [Value::Int32(5), Value::Bool(true), Value::from(Document::new())] {
            let response = Document::new().with("hosts", Value::Array(vec![element]));
            assert_matches!(
                TopologyDescriptor::derive(&response),
                Err(TopologyError::MalformedTopologyField { field: "hosts", .. })
            );
        }
    }

    #[test]
    fn test_non_array_member_list_fails() {
        let response = Document::new().with("arbiters", "arb:27017");
        assert_matches!(
            TopologyDescriptor::derive(&response),
            Err(TopologyError::MalformedTopologyField {
                field: "arbiters",
                source: MemberListIssue::Shape(FieldShapeError::NotAnArray { .. }),
            })
        );
    }

    #[test]
    fn test_bad_primary_and_me_are_dropped() {
        let response = Document::new()
            .with("primary", "bad::address")
            .with("me", "")
            .with("hosts", vec!["a:27017"]);
        let descriptor = TopologyDescriptor::derive(&response).unwrap();

        assert_eq!(descriptor.primary(), None);
        assert_eq!(descriptor.me(), None);
        assert_eq!(descriptor.hosts().len(), 1);
    }

    #[test]
    fn test_primary_and_me_parsed() {
        let response = Document::new()
            .with("primary", "a:27017")
            .with("me", "b");
        let descriptor = TopologyDescriptor::derive(&response).unwrap();

        assert_eq!(descriptor.primary(), Some(&addr("a:27017")));
        assert_eq!(descriptor.me(), Some(&addr("b:27017")));
    }

    #[test]
    fn test_non_string_optional_fields_are_absent() {
        let response = Document::new()
            .with("setName", 5)
            .with("msg", true)
            .with("primary", 27017);
        let descriptor = TopologyDescriptor::derive(&response).unwrap();

        assert_eq!(descriptor.replica_set_name(), None);
        assert_eq!(descriptor.message(), None);
        assert_eq!(descriptor.primary(), None);
    }

    #[test]
    fn test_reported_document_size_raises_message_size() {
        let response = Document::new().with("maxBsonObjectSize", 16 * 1024 * 1024);
        let descriptor = TopologyDescriptor::derive(&response).unwrap();

        assert_eq!(descriptor.max_document_size(), 16 * 1024 * 1024);
        assert_eq!(descriptor.max_message_size(), 16 * 1024 * 1024 + MESSAGE_HEADROOM);
    }

    #[test]
    fn test_small_document_size_keeps_message_floor() {
        let response = Document::new().with("maxBsonObjectSize", 1024);
        let descriptor = TopologyDescriptor::derive(&response).unwrap();

        assert_eq!(descriptor.max_document_size(), 1024);
        assert_eq!(descriptor.max_message_size(), DEFAULT_MAX_MESSAGE_SIZE);
    }

    #[test]
    fn test_reported_message_size_is_ignored() {
        let response = Document::new()
            .with("maxBsonObjectSize", 16 * 1024 * 1024)
            .with("maxMessageSizeBytes", 1000);
        let descriptor = TopologyDescriptor::derive(&response).unwrap();

        assert_eq!(descriptor.max_message_size(), 16 * 1024 * 1024 + MESSAGE_HEADROOM);
    }

    #[test]
    fn test_non_positive_document_size_falls_back() {
        for reported in [0, -1, i32::MIN] {
            let response = Document::new().with("maxBsonObjectSize", reported);
            let descriptor = TopologyDescriptor::derive(&response).unwrap();
            assert_eq!(descriptor.max_document_size(), DEFAULT_MAX_DOCUMENT_SIZE);
        }
    }

    #[test]
    fn test_headroom_invariant_at_extremes() {
        let response = Document::new().with("maxBsonObjectSize", i32::MAX);
        let descriptor = TopologyDescriptor::derive(&response).unwrap();

        assert!(descriptor.max_message_size() >= descriptor.max_document_size() + MESSAGE_HEADROOM);
    }

    #[test]
    fn test_replica_set_metadata() {
        let response = Document::new()
            .with("setName", "rs0")
            .with("msg", "isdbgrid")
            .with("tags", Document::new().with("dc", "east").with("rack", "2"));
        let descriptor = TopologyDescriptor::derive(&response).unwrap();

        assert_eq!(descriptor.replica_set_name(), Some("rs0"));
        assert!(descriptor.is_replica_set_member());
        assert_eq!(descriptor.message(), Some("isdbgrid"));
        assert_eq!(descriptor.tags().get("rack"), Some("2"));
    }

    #[test]
    fn test_derive_through_trait_object() {
        let response = Document::new().with("ismaster", true);
        let dyn_response: &dyn HandshakeResponse = &response;
        let descriptor = TopologyDescriptor::derive(dyn_response).unwrap();
        assert!(descriptor.is_primary());
    }

    #[test]
    fn test_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TopologyDescriptor>();
        assert_send_sync::<TopologyError>();
        assert_send_sync::<Document>();
    }

    #[test]
    fn test_role_display() {
        assert_eq!(ServerRole::Primary.to_string(), "primary");
        assert_eq!(ServerRole::Other.to_string(), "other");
        assert_eq!(MemberKind::Arbiter.to_string(), "arbiter");
    }
}
