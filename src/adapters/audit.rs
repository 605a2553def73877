//! JSON-lines audit log
//!
//! One line per evaluated token: timestamp, candidate and verdict. The
//! verdict itself carries no time so repeated evaluations stay comparable.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::domain::{TokenCandidate, Verdict};
use crate::ports::{AuditSink, SourceError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub candidate: TokenCandidate,
    pub verdict: Verdict,
}

pub struct JsonlAuditSink {
    path: PathBuf,
    // Serializes appends so concurrent evaluations never interleave lines
    write_lock: Mutex<()>,
}

impl JsonlAuditSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn persist(&self, candidate: &TokenCandidate, verdict: &Verdict) -> Result<(), SourceError> {
        let record = AuditRecord {
            timestamp: Utc::now(),
            candidate: candidate.clone(),
            verdict: verdict.clone(),
        };
        let mut line = serde_json::to_string(&record).map_err(|e| SourceError::Data(e.to_string()))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SourceError::Transport(format!("audit dir: {}", e)))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| SourceError::Transport(format!("audit open: {}", e)))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| SourceError::Transport(format!("audit write: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| SourceError::Transport(format!("audit flush: {}", e)))?;

        Ok(())
    }
}
