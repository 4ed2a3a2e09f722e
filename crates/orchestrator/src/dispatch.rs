//! Fire-and-forget alert delivery
//!
//! Frame processing hands alerts to a bounded queue and moves on; a worker
//! task drains the queue into the configured [`AlertSink`]. When the queue is
//! full the alert is dropped with a warning instead of stalling the stream.

use std::sync::Arc;

use async_trait::async_trait;
use guardian_common::Result;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::alert::Alert;

/// Notification channel receiving alerts
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn emit(&self, alert: &Alert) -> Result<()>;
}

/// Sink writing each alert as a structured log line
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertSink;

#[async_trait]
impl AlertSink for TracingAlertSink {
    async fn emit(&self, alert: &Alert) -> Result<()> {
        let payload = serde_json::to_string(alert)?;
        warn!(kind = alert.kind().as_str(), "ALERT {}", payload);
        Ok(())
    }
}

/// Delivery counts reported when the dispatcher shuts down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: usize,
    pub failed: usize,
    pub dropped: usize,
}

/// Bounded alert queue drained by a background task
pub struct AlertDispatcher {
    tx: mpsc::Sender<Alert>,
    worker: JoinHandle<(usize, usize)>,
    dropped: usize,
}

impl AlertDispatcher {
    /// Start the worker task. Must be called within a Tokio runtime.
    pub fn spawn(sink: Arc<dyn AlertSink>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Alert>(capacity.max(1));

        let worker = tokio::spawn(async move {
            let mut delivered = 0;
            let mut failed = 0;
            while let Some(alert) = rx.recv().await {
                match sink.emit(&alert).await {
                    Ok(()) => {
                        delivered += 1;
                        debug!("Delivered {} alert", alert.kind().as_str());
                    }
                    Err(e) => {
                        failed += 1;
                        error!("Alert delivery failed ({}): {}", alert.kind().as_str(), e);
                    }
                }
            }
            (delivered, failed)
        });

        Self {
            tx,
            worker,
            dropped: 0,
        }
    }

    /// Queue an alert without waiting. Returns false if it was dropped.
    pub fn dispatch(&mut self, alert: Alert) -> bool {
        match self.tx.try_send(alert) {
            Ok(()) => true,
            Err(TrySendError::Full(alert)) => {
                self.dropped += 1;
                warn!(
                    "Alert queue full, dropping {} alert",
                    alert.kind().as_str()
                );
                false
            }
            Err(TrySendError::Closed(alert)) => {
                self.dropped += 1;
                warn!(
                    "Alert worker stopped, dropping {} alert",
                    alert.kind().as_str()
                );
                false
            }
        }
    }

    /// Close the queue and wait until every queued alert was handed to the sink
    pub async fn shutdown(self) -> DispatchStats {
        let AlertDispatcher {
            tx,
            worker,
            dropped,
        } = self;
        drop(tx);

        match worker.await {
            Ok((delivered, failed)) => DispatchStats {
                delivered,
                failed,
                dropped,
            },
            Err(e) => {
                error!("Alert worker panicked: {}", e);
                DispatchStats {
                    dropped,
                    ..Default::default()
                }
            }
        }
    }
}
