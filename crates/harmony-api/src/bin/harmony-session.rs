//! Harmony Session
//!
//! Drives one recommendation session from the terminal. Each stdin line is
//! sent as a chat reply; every emitted message is printed as a JSON line.
//!
//! ```text
//! harmony-session --profile me.json --candidates pool.json
//! ```
//!
//! Type `quit` (or close stdin) to end the session and print its summary.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use harmony_agents::{ChatMessage, InMemoryCandidateStore};
use harmony_api::{init_tracing, verbosity_filter, HarmonyConfig, MatchmakingService};
use harmony_core::{CandidateRecord, ProfileInput};
use serde::Serialize;

/// Interactive recommendation session
#[derive(Parser)]
#[command(name = "harmony-session")]
#[command(version)]
#[command(about = "Run a Harmony recommendation session over stdin/stdout")]
struct Cli {
    /// User profile (JSON)
    #[arg(long)]
    profile: PathBuf,

    /// Candidate pool (JSON array of candidate records)
    #[arg(long)]
    candidates: PathBuf,

    /// Configuration file; HARMONY_* environment variables override it
    #[arg(short, long)]
    config: Option<String>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(verbosity_filter(cli.verbose));

    let config = match &cli.config {
        Some(path) => HarmonyConfig::from_file(path)
            .with_context(|| format!("loading configuration from {path}"))?,
        None => HarmonyConfig::from_env().context("loading configuration from environment")?,
    };
    config.validate()?;

    let profile: ProfileInput = read_json(&cli.profile)?;
    let candidates: Vec<CandidateRecord> = read_json(&cli.candidates)?;
    tracing::info!(candidates = candidates.len(), "loaded candidate pool");

    let store = Arc::new(InMemoryCandidateStore::with_candidates(candidates));
    let service = MatchmakingService::new(config, store);
    let user = profile.id.clone();

    let mut out = io::stdout().lock();
    let start = service.start_session(profile).await?;
    print_messages(&mut out, std::slice::from_ref(&start.welcome_message))?;
    print_messages(&mut out, &service.present(&user).await?)?;

    for line in io::stdin().lock().lines() {
        let line = line?;
        let text = line.trim();
        if text.eq_ignore_ascii_case("quit") {
            break;
        }
        if text.is_empty() {
            continue;
        }
        match service.send_message(&user, text).await {
            Ok(response) => print_messages(&mut out, &response.messages)?,
            Err(e) => tracing::warn!(error = %e, kind = ?e.kind(), "message rejected"),
        }
    }

    let summary = service.end_session(&user).await?;
    write_json(&mut out, &summary)?;
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print_messages(out: &mut impl Write, messages: &[ChatMessage]) -> Result<()> {
    for message in messages {
        write_json(out, message)?;
    }
    Ok(())
}

fn write_json(out: &mut impl Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
