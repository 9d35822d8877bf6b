// Copyright (c) 2018-2022 The Botho Foundation

//! Canned handshake responses for tests.
//!
//! Every member of the three-node set `rs0` (`node1` primary, `node2`
//! secondary, `arb` arbiter) plus a passive member and a standalone server.

use rsm_topology::{Document, Value};

/// Name of the canned replica set.
pub const SET_NAME: &str = "rs0";

/// Host list reported by the data-bearing members of the canned set.
pub const HOSTS: [&str; 2] = ["node1:27017", "node2:27017"];

/// Passive member list reported by the canned set.
pub const PASSIVES: [&str; 1] = ["backup:27017"];

/// Arbiter list reported by the canned set.
pub const ARBITERS: [&str; 1] = ["arb:27017"];

fn set_member(me: &str) -> Document {
    Document::new()
        .with("setName", SET_NAME)
        .with("hosts", HOSTS.to_vec())
        .with("passives", PASSIVES.to_vec())
        .with("arbiters", ARBITERS.to_vec())
        .with("primary", HOSTS[0])
        .with("me", me)
        .with("maxBsonObjectSize", 16 * 1024 * 1024)
        .with("maxMessageSizeBytes", 48_000_000)
        .with("ok", 1.0)
}

/// Reply of the primary, tagged `dc: east`.
pub fn primary_response() -> Document {
    set_member(HOSTS[0])
        .with("ismaster", true)
        .with("secondary", false)
        .with("tags", Document::new().with("dc", "east").with("rack", "1"))
}

/// Reply of the secondary, tagged `dc: west`.
pub fn secondary_response() -> Document {
    set_member(HOSTS[1])
        .with("ismaster", false)
        .with("secondary", true)
        .with("tags", Document::new().with("dc", "west").with("rack", 2))
}

/// Reply of a passive (priority 0) member.
pub fn passive_response() -> Document {
    set_member(PASSIVES[0])
        .with("ismaster", false)
        .with("secondary", true)
        .with("passive", true)
}

/// Reply of the arbiter. Some servers also flag arbiters as passive.
pub fn arbiter_response() -> Document {
    set_member(ARBITERS[0])
        .with("ismaster", false)
        .with("secondary", false)
        .with("arbiterOnly", true)
        .with("passive", true)
}

/// Reply of a standalone server, as old servers sent it.
pub fn standalone_response() -> Document {
    Document::new().with("ismaster", true).with("ok", 1.0)
}

/// Reply of a member that is not yet part of an initialized set.
pub fn uninitialized_response() -> Document {
    Document::new()
        .with("ismaster", false)
        .with("secondary", false)
        .with("info", "can't get local.system.replset config from self or any seed (EMPTYCONFIG)")
        .with("isreplicaset", true)
        .with("ok", 1.0)
}

/// Copy of `response` with `field` set to `value`.
pub fn with_field(response: &Document, field: &str, value: impl Into<Value>) -> Document {
    response.clone().with(field, value)
}
