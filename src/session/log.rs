// ABOUTME: JSONL transcript logger — appends each conversation message to a log file.
// ABOUTME: One timestamped file per session under the configured sessions directory.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::history::Message;

/// A single JSONL log entry containing a timestamp and the conversation message.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub message: Message,
}

/// Appends conversation messages as JSONL lines to a transcript file.
pub struct TranscriptLogger {
    writer: BufWriter<File>,
    pub path: PathBuf,
}

impl TranscriptLogger {
    /// Open a new transcript in the default sessions directory.
    pub fn new() -> anyhow::Result<Self> {
        Self::new_in_dir(&Config::sessions_dir())
    }

    /// Open a new transcript file named with the current timestamp inside `dir`.
    pub fn new_in_dir(dir: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(dir)?;
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f").to_string();
        let path = dir.join(format!("{}.jsonl", timestamp));
        let file = File::create(&path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    /// Append a message and flush.
    pub fn log_message(&mut self, msg: &Message) -> anyhow::Result<()> {
        let entry = LogEntry {
            timestamp: Utc::now().to_rfc3339(),
            message: msg.clone(),
        };
        let line = serde_json::to_string(&entry)?;
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Read every entry back from a transcript file.
pub fn read_transcript(path: &Path) -> anyhow::Result<Vec<LogEntry>> {
    let content = fs::read_to_string(path)?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(anyhow::Error::from))
        .collect()
}
