// Copyright (c) 2024 Botho Foundation

//! CLI tool for inspecting replica set member handshake replies.
//!
//! Feed it the reply a member sent to the handshake command, captured as
//! JSON, and it prints what a client would conclude about that member.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rsm_common::logger::{init_logging, LogSettings};
use rsm_describe::{describe, parse_tag, read_response, render_members, render_text};
use rsm_topology::TagSet;
use std::{path::PathBuf, process::ExitCode};
use tracing::info;

#[derive(Parser)]
#[command(name = "rsm-describe")]
#[command(about = "Inspect replica set member handshake replies")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive and print the member's topology descriptor
    Show {
        /// Handshake reply as JSON, `-` for stdin
        #[arg(short, long, env = "RSM_RESPONSE")]
        response: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text", env = "RSM_FORMAT")]
        format: Format,
    },

    /// List every member the node knows about
    Members {
        /// Handshake reply as JSON, `-` for stdin
        #[arg(short, long, env = "RSM_RESPONSE")]
        response: PathBuf,
    },

    /// Check the member's tags against required tags
    Matches {
        /// Handshake reply as JSON, `-` for stdin
        #[arg(short, long, env = "RSM_RESPONSE")]
        response: PathBuf,

        /// Required tag, as name=value (repeatable)
        #[arg(short, long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine readable.
    let mut settings = LogSettings::from_env();
    settings.stderr = true;
    if cli.verbose {
        settings.filter = Some("debug".to_owned());
    }
    init_logging(&settings);

    match cli.command {
        Commands::Show { response, format } => {
            let descriptor = describe(&read_response(&response)?)?;
            info!(role = %descriptor.role(), "described member");
            match format {
                Format::Text => print!("{}", render_text(&descriptor)),
                Format::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&descriptor)
                        .context("Failed to serialize descriptor")?
                ),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Members { response } => {
            let descriptor = describe(&read_response(&response)?)?;
            print!("{}", render_members(&descriptor));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Matches { response, tags } => {
            let descriptor = describe(&read_response(&response)?)?;
            let required: TagSet = tags.into_iter().collect();
            if descriptor.tags().matches(&required) {
                println!("match");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("no match");
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
