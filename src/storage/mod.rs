//! Pluggable record sinks.
//!
//! The core emits its persisted state (sessions, utterances, completed
//! debate records) through the [`RecordSink`] trait; the sink's schema
//! is its own business as long as append order is preserved. The
//! file-backed [`JsonlSink`] writes one JSON object per line and retries
//! a failed write once before surfacing the error.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::SinkError;

/// A stored session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    /// "debate" or "dialectic".
    pub kind: String,
    pub topic: String,
    pub settings: Value,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(kind: impl Into<String>, topic: impl Into<String>, settings: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: kind.into(),
            topic: topic.into(),
            settings,
            created_at: Utc::now(),
        }
    }
}

/// A stored utterance belonging to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtteranceRecord {
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub metadata: Value,
    pub timestamp: DateTime<Utc>,
}

/// The stored summary of a completed debate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateRecord {
    pub session_id: String,
    pub topic: String,
    pub pro_total: u32,
    pub con_total: u32,
    pub winner: String,
    pub margin: String,
    pub trace: Value,
    pub graph: Value,
    pub verdict: Value,
    pub evaluations: Value,
    pub config: Value,
    pub created_at: DateTime<Utc>,
}

/// Destination for persisted records.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn write_session(&self, record: &SessionRecord) -> Result<(), SinkError>;
    async fn write_utterance(&self, record: &UtteranceRecord) -> Result<(), SinkError>;
    async fn write_debate_record(&self, record: &DebateRecord) -> Result<(), SinkError>;
}

// ============================================================================
// JSONL sink
// ============================================================================

/// Appends records as JSON lines to a single file.
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append_line(&self, line: &str) -> Result<(), std::io::Error> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await
    }

    /// Writes one record, retrying once on failure.
    async fn write_tagged(&self, record_type: &str, payload: Value) -> Result<(), SinkError> {
        let line = serde_json::to_string(&serde_json::json!({
            "record_type": record_type,
            "record": payload,
        }))?;

        if let Err(first) = self.append_line(&line).await {
            tracing::warn!(error = %first, path = %self.path.display(), "sink write failed, retrying once");
            if let Err(second) = self.append_line(&line).await {
                return Err(SinkError::WriteFailed(second.to_string()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RecordSink for JsonlSink {
    async fn write_session(&self, record: &SessionRecord) -> Result<(), SinkError> {
        self.write_tagged("session", serde_json::to_value(record)?).await
    }

    async fn write_utterance(&self, record: &UtteranceRecord) -> Result<(), SinkError> {
        self.write_tagged("utterance", serde_json::to_value(record)?).await
    }

    async fn write_debate_record(&self, record: &DebateRecord) -> Result<(), SinkError> {
        self.write_tagged("debate_record", serde_json::to_value(record)?).await
    }
}

// ============================================================================
// In-memory sink
// ============================================================================

/// Collects records in memory; for tests and dry runs.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<(String, Value)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(String, Value)> {
        self.records.lock().expect("sink lock not poisoned").clone()
    }

    fn push(&self, record_type: &str, payload: Value) {
        self.records
            .lock()
            .expect("sink lock not poisoned")
            .push((record_type.to_string(), payload));
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn write_session(&self, record: &SessionRecord) -> Result<(), SinkError> {
        self.push("session", serde_json::to_value(record)?);
        Ok(())
    }

    async fn write_utterance(&self, record: &UtteranceRecord) -> Result<(), SinkError> {
        self.push("utterance", serde_json::to_value(record)?);
        Ok(())
    }

    async fn write_debate_record(&self, record: &DebateRecord) -> Result<(), SinkError> {
        self.push("debate_record", serde_json::to_value(record)?);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
