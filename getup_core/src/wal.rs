//! Write-Ahead Log (WAL) for finished workout sessions.
//!
//! Sessions are appended to a JSONL (JSON Lines) file with file locking
//! so a replay and a history listing can share the log safely.

use crate::{Result, WorkoutSession};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// File name of the session log inside the data directory
pub const WAL_FILE_NAME: &str = "workout_sessions.wal";

/// Destination for finalized workout sessions
pub trait SessionSink {
    fn append(&mut self, session: &WorkoutSession) -> Result<()>;
}

/// JSONL-based session sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl SessionSink for JsonlSink {
    fn append(&mut self, session: &WorkoutSession) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(session)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!("Appended session {} to WAL", session.id);
        Ok(())
    }
}

/// Keeps sessions in memory; used for dry runs and tests
#[derive(Debug, Default)]
pub struct MemorySink {
    pub sessions: Vec<WorkoutSession>,
}

impl SessionSink for MemorySink {
    fn append(&mut self, session: &WorkoutSession) -> Result<()> {
        self.sessions.push(session.clone());
        Ok(())
    }
}

/// Read all sessions from a WAL file
///
/// Lines that fail to parse are logged and skipped.
pub fn read_sessions(path: &Path) -> Result<Vec<WorkoutSession>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut sessions = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<WorkoutSession>(&line) {
            Ok(session) => sessions.push(session),
            Err(e) => {
                tracing::warn!("Failed to parse session at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} sessions from WAL", sessions.len());
    Ok(sessions)
}
