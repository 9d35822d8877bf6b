// Copyright (c) 2024 Botho Foundation

//! Helpers behind the `rsm-describe` tool: loading captured handshake replies
//! and rendering descriptors for a terminal.

use anyhow::{anyhow, bail, Context, Result};
use rsm_topology::{CommandStatus, Document, ServerAddress, TagSet, TopologyDescriptor};
use std::{
    fmt::Write as _,
    fs,
    io::{self, Read},
    path::Path,
};
use tracing::debug;

/// Read a handshake reply captured as JSON. `-` reads stdin.
pub fn read_response(path: &Path) -> Result<Document> {
    rsm_common::trace_time!("loading handshake reply {}", path.display());

    let text = if path == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read handshake reply from stdin")?;
        text
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read handshake reply {}", path.display()))?
    };

    let response: Document = serde_json::from_str(&text)
        .with_context(|| format!("Handshake reply {} is not a JSON object", path.display()))?;
    debug!(path = %path.display(), fields = response.len(), "loaded handshake reply");
    Ok(response)
}

/// Check the reply's command status and derive its descriptor.
pub fn describe(response: &Document) -> Result<TopologyDescriptor> {
    CommandStatus::from_response(response)
        .check()
        .context("Handshake command was not successful")?;
    Ok(TopologyDescriptor::derive(response)?)
}

/// Parse a `name=value` tag argument.
pub fn parse_tag(arg: &str) -> Result<(String, String)> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Tag {arg:?} is not of the form name=value"))?;
    if name.is_empty() {
        bail!("Tag {arg:?} has an empty name");
    }
    Ok((name.to_owned(), value.to_owned()))
}

fn join<'a>(addresses: impl IntoIterator<Item = &'a ServerAddress>) -> String {
    let joined = addresses
        .into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        "-".to_owned()
    } else {
        joined
    }
}

fn format_tags(tags: &TagSet) -> String {
    if tags.is_empty() {
        return "-".to_owned();
    }
    tags.iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn or_dash(value: Option<impl ToString>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| v.to_string())
}

/// Multi-line, human readable rendering of a descriptor.
pub fn render_text(descriptor: &TopologyDescriptor) -> String {
    let rows = [
        ("role", descriptor.role().to_string()),
        ("replica set", or_dash(descriptor.replica_set_name())),
        ("me", or_dash(descriptor.me())),
        ("primary", or_dash(descriptor.primary())),
        ("hosts", join(descriptor.hosts())),
        ("passives", join(descriptor.passives())),
        ("arbiters", join(descriptor.arbiters())),
        ("tags", format_tags(descriptor.tags())),
        ("max document size", descriptor.max_document_size().to_string()),
        ("max message size", descriptor.max_message_size().to_string()),
        ("message", or_dash(descriptor.message())),
    ];

    let mut out = String::new();
    for (label, value) in rows {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{:<18} {value}", format!("{label}:"));
    }
    out
}

/// One line per known member: address, member list, and `primary` / `self`
/// markers.
pub fn render_members(descriptor: &TopologyDescriptor) -> String {
    let mut out = String::new();
    for (kind, address) in descriptor.members_by_kind() {
        let mut markers = Vec::new();
        if descriptor.primary() == Some(address) {
            markers.push("primary");
        }
        if descriptor.me() == Some(address) {
            markers.push("self");
        }
        let _ = write!(out, "{:<24} {kind}", address.to_string());
        if !markers.is_empty() {
            let _ = write!(out, " ({})", markers.join(", "));
        }
        out.push('\n');
    }
    out
}
