// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use tokio::sync::mpsc;
use tracing::error;

use crate::record::Record;

/// Downstream consumer of finished records.
///
/// Unbounded from the pipeline's perspective: `push` never blocks the caller
/// and never surfaces an error back into the pipeline.
pub trait OutputSink: Send + Sync {
    fn push(&self, record: Record);
}

/// Output sink backed by an unbounded channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Record>,
}

impl ChannelSink {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Record>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelSink { tx }, rx)
    }
}

impl OutputSink for ChannelSink {
    fn push(&self, record: Record) {
        if self.tx.send(record).is_err() {
            error!("Failed to forward record - output receiver dropped");
        }
    }
}
