//! Manual review dispatch
//!
//! - [`JsonlReviewQueue`]: durable append-only file, one summary per line
//! - [`ChannelPublisher`]: in-process tokio channel for embedding

use async_trait::async_trait;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{ReviewPublisher, ReviewSummary};

/// Append-only JSONL review queue
pub struct JsonlReviewQueue {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonlReviewQueue {
    /// Open the queue file, creating it and its directory if needed
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "Opened review queue");

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reader over the same file
    pub fn reader(&self) -> ReviewQueueReader {
        ReviewQueueReader::new(&self.path)
    }
}

#[async_trait]
impl ReviewPublisher for JsonlReviewQueue {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn publish_for_manual_review(&self, summary: &ReviewSummary) -> StoreResult<()> {
        let json = serde_json::to_string(summary)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| StoreError::Unavailable("review queue writer poisoned".to_string()))?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;
        Ok(())
    }
}

/// Sequential reader for the JSONL queue
pub struct ReviewQueueReader {
    path: PathBuf,
}

impl ReviewQueueReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read every summary in publication order. A missing file is an empty queue.
    pub fn read_all(&self) -> StoreResult<Vec<ReviewSummary>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut summaries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            summaries.push(serde_json::from_str(&line)?);
        }
        Ok(summaries)
    }
}

/// Publishes summaries onto an unbounded tokio channel
pub struct ChannelPublisher {
    tx: UnboundedSender<ReviewSummary>,
}

impl ChannelPublisher {
    /// Create a publisher and the receiving end analysts consume
    pub fn channel() -> (Self, UnboundedReceiver<ReviewSummary>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ReviewPublisher for ChannelPublisher {
    fn name(&self) -> &str {
        "channel"
    }

    async fn publish_for_manual_review(&self, summary: &ReviewSummary) -> StoreResult<()> {
        self.tx
            .send(summary.clone())
            .map_err(|_| StoreError::Unavailable("review channel closed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fraudguard_core::{RiskLevel, TransactionStatus};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn summary(id: &str) -> ReviewSummary {
        ReviewSummary {
            transaction_id: id.to_string(),
            user_id: "U-1".to_string(),
            risk_level: RiskLevel::Medium,
            reasons: vec!["no_device_id".to_string()],
            amount: Some(dec!(-100.00)),
            status: TransactionStatus::PendingReview,
            evaluated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_jsonl_append_and_read() {
        let dir = TempDir::new().unwrap();
        let queue = JsonlReviewQueue::open(dir.path().join("queue/review_queue.jsonl")).unwrap();

        queue.publish_for_manual_review(&summary("TX-1")).await.unwrap();
        queue.publish_for_manual_review(&summary("TX-2")).await.unwrap();

        let read = queue.reader().read_all().unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].transaction_id, "TX-1");
        assert_eq!(read[1].reasons, vec!["no_device_id"]);
    }

    #[tokio::test]
    async fn test_jsonl_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("review_queue.jsonl");

        {
            let queue = JsonlReviewQueue::open(&path).unwrap();
            queue.publish_for_manual_review(&summary("TX-1")).await.unwrap();
        }
        let queue = JsonlReviewQueue::open(&path).unwrap();
        queue.publish_for_manual_review(&summary("TX-2")).await.unwrap();

        assert_eq!(ReviewQueueReader::new(&path).read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let reader = ReviewQueueReader::new(dir.path().join("absent.jsonl"));
        assert!(reader.read_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_channel_publisher() {
        let (publisher, mut rx) = ChannelPublisher::channel();
        publisher.publish_for_manual_review(&summary("TX-1")).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.transaction_id, "TX-1");

        drop(rx);
        assert!(matches!(
            publisher.publish_for_manual_review(&summary("TX-2")).await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
