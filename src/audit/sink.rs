//! Line-delimited audit output.
//!
//! Exchanges serialize their record and hand the finished line to a
//! single background writer task over a bounded channel. The writer owns
//! the output, so each record lands as one whole line regardless of how
//! many exchanges are in flight.

use std::path::Path;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::audit::record::AuditRecord;
use crate::config::{AuditConfig, AuditSinkKind};

/// Errors that can occur while emitting audit records.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("failed to create audit log directory: {0}")]
    CreateDir(std::io::Error),

    #[error("failed to open audit log file: {0}")]
    OpenFile(std::io::Error),

    #[error("audit.path is required for a file sink")]
    MissingPath,

    #[error("failed to serialize audit record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("audit channel full; record dropped")]
    ChannelFull,

    #[error("audit writer stopped; record dropped")]
    ChannelClosed,
}

/// Cloneable handle feeding the background audit writer.
#[derive(Clone, Debug)]
pub struct AuditSink {
    tx: mpsc::Sender<Vec<u8>>,
}

impl AuditSink {
    /// Spawn a writer task over any async output.
    ///
    /// The task exits after the last `AuditSink` clone is dropped and the
    /// remaining lines are written.
    pub fn spawn<W>(writer: W, capacity: usize) -> (Self, JoinHandle<()>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_writer_loop(writer, rx));
        (Self { tx }, handle)
    }

    /// Open the sink described by `config`: process stdout or an
    /// append-mode file.
    pub async fn from_config(config: &AuditConfig) -> Result<(Self, JoinHandle<()>), AuditError> {
        match config.sink {
            AuditSinkKind::Stdout => Ok(Self::spawn(tokio::io::stdout(), config.channel_capacity)),
            AuditSinkKind::File => {
                let path = config.path.as_deref().ok_or(AuditError::MissingPath)?;
                let file = open_append(path).await?;
                Ok(Self::spawn(file, config.channel_capacity))
            }
        }
    }

    /// Serialize `record` and queue it for writing without waiting.
    ///
    /// A full channel drops the record instead of stalling the exchange.
    pub fn emit(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        self.tx.try_send(line).map_err(|err| match err {
            TrySendError::Full(_) => AuditError::ChannelFull,
            TrySendError::Closed(_) => AuditError::ChannelClosed,
        })
    }
}

async fn open_append(path: &Path) -> Result<tokio::fs::File, AuditError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(AuditError::CreateDir)?;
    }

    tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(AuditError::OpenFile)
}

async fn run_writer_loop<W>(mut writer: W, mut rx: mpsc::Receiver<Vec<u8>>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        if let Err(err) = writer.write_all(&line).await {
            tracing::error!(error = %err, "Failed to write audit record");
            continue;
        }
        // Keep the stream line-buffered for consumers reading a pipe.
        if rx.is_empty() {
            if let Err(err) = writer.flush().await {
                tracing::error!(error = %err, "Failed to flush audit output");
            }
        }
    }

    if let Err(err) = writer.flush().await {
        tracing::error!(error = %err, "Failed to flush audit output on shutdown");
    }
    tracing::debug!("Audit writer stopped");
}
