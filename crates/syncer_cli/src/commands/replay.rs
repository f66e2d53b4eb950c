//! Replay command.

use super::{LocalSession, REPLY_ENDPOINT};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use syncer_protocol::{Message, PatchMessage};
use tracing::{debug, info, warn};

/// Outcome of replaying a document sequence.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    /// Documents read, including the initial one.
    pub documents: usize,
    /// Updates that produced a new version.
    pub committed: u64,
    /// Updates that changed nothing.
    pub skipped: u64,
    /// Final server version.
    pub version: u64,
    /// Whether a subscriber applying every patch ended on the server state.
    pub converged: bool,
    /// Every message published after the bootstrap, in order.
    pub published: Vec<Value>,
}

/// Runs the replay command.
pub fn run(input: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("Replaying {:?}", input);

    let text = std::fs::read_to_string(input)
        .map_err(|e| format!("Failed to read {:?}: {}", input, e))?;
    let report = replay(&text)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            for (i, patch) in report.published.iter().enumerate() {
                println!("#{} {}", i + 1, patch);
            }
            println!();
            println!("Documents:  {}", report.documents);
            println!("Committed:  {}", report.committed);
            println!("Skipped:    {}", report.skipped);
            println!("Version:    {}", report.version);
            println!(
                "Converged:  {}",
                if report.converged { "yes" } else { "NO" }
            );
        }
    }

    if !report.converged {
        return Err("subscriber state diverged from server state".into());
    }
    Ok(())
}

/// Replays newline-delimited documents. Blank lines are ignored.
pub fn replay(text: &str) -> Result<ReplayReport, Box<dyn std::error::Error>> {
    let mut documents = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .map_err(|e| format!("line {}: invalid JSON: {}", line_no + 1, e))?;
        documents.push(value);
    }
    let Some((initial, rest)) = documents.split_first() else {
        return Err("no documents to replay".into());
    };

    let mut session = LocalSession::start(initial)?;
    session.published.drain();

    let (mut subscriber, _) = session
        .hub
        .request(REPLY_ENDPOINT, &Message::bootstrap())?
        .decode_snapshot()?;

    let mut published = Vec::new();
    for (i, document) in rest.iter().enumerate() {
        session.server.update(document)?;
        for message in session.published.drain() {
            match message.decode_patch()? {
                PatchMessage::Bootstrap => debug!("unexpected bootstrap during replay"),
                PatchMessage::Patch(patch) => {
                    json_patch::patch(&mut subscriber, &patch.0)
                        .map_err(|e| format!("document {}: patch failed to apply: {}", i + 2, e))?;
                    published.push(serde_json::from_str(message.as_str())?);
                }
            }
        }
    }

    let converged = subscriber == *session.server.state();
    if !converged {
        warn!("subscriber diverged from server");
    }

    let stats = session.server.stats();
    Ok(ReplayReport {
        documents: documents.len(),
        committed: stats.committed,
        skipped: stats.skipped,
        version: session.server.version(),
        converged,
        published,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn replay_counts_commits_and_skips() {
        let text = "{\"n\": 0}\n{\"n\": 1}\n\n{\"n\": 1}\n{\"n\": 2, \"m\": null}\n";
        let report = replay(text).unwrap();

        assert_eq!(report.documents, 4);
        assert_eq!(report.committed, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.version, 2);
        assert!(report.converged);
        assert_eq!(report.published.len(), 2);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(replay("\n  \n").is_err());
    }

    #[test]
    fn invalid_line_reports_its_number() {
        let err = replay("{}\nnot json\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn run_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"players\": {{}}}}").unwrap();
        writeln!(file, "{{\"players\": {{\"p1\": {{\"score\": 1}}}}}}").unwrap();
        file.flush().unwrap();

        run(file.path(), "json").unwrap();
    }

    #[test]
    fn run_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(&dir.path().join("missing.ndjson"), "text").is_err());
    }
}
