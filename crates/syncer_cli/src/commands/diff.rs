//! Diff command.

use super::{read_document, LocalSession};
use json_patch::Patch;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use syncer_protocol::PatchMessage;
use tracing::info;

/// What a single update from one document to another publishes.
#[derive(Debug, Serialize)]
pub struct DiffReport {
    /// Whether the update was committed.
    pub committed: bool,
    /// Version after the update.
    pub version: u64,
    /// The published patch, empty when nothing was committed.
    pub patch: Patch,
}

/// Runs the diff command.
pub fn run(old: &Path, new: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("Diffing {:?} against {:?}", old, new);

    let report = compute(&read_document(old)?, &read_document(new)?)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            if !report.committed {
                println!("No changes; version stays at {}", report.version);
                return Ok(());
            }
            println!("Version: {}", report.version);
            println!("Operations: {}", report.patch.0.len());
            for op in &report.patch.0 {
                println!("  {}", serde_json::to_string(op)?);
            }
        }
    }

    Ok(())
}

/// Starts a server on `old`, updates it to `new` and captures the result.
pub fn compute(old: &Value, new: &Value) -> Result<DiffReport, Box<dyn std::error::Error>> {
    let mut session = LocalSession::start(old)?;
    // Bootstrap.
    session.published.drain();

    session.server.update(new)?;

    let mut patch = Patch(Vec::new());
    for message in session.published.drain() {
        if let PatchMessage::Patch(published) = message.decode_patch()? {
            patch = published;
        }
    }

    Ok(DiffReport {
        committed: session.server.stats().committed > 0,
        version: session.server.version(),
        patch,
    })
}
