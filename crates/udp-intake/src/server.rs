// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Pipeline lifecycle: worker pool, supervised listener loop, shutdown.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::codec::Codec;
use crate::config::IntakeConfig;
use crate::errors::{ConfigError, DecodeError};
use crate::listener::{Datagram, Listener};
use crate::metrics::PipelineMetrics;
use crate::parser;
use crate::record::Record;
use crate::sink::OutputSink;

/// Cooldown between listener restart attempts.
const LISTENER_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// The UDP intake pipeline.
///
/// Construction validates the configuration and performs no I/O; [`run`]
/// spawns the workers, binds the socket and blocks until the cancellation
/// token fires. Cancelling the token is the stop call: it is idempotent, and
/// teardown never raises (the socket closes by drop).
///
/// [`run`]: UdpIntake::run
pub struct UdpIntake {
    config: IntakeConfig,
    codec: Box<dyn Codec>,
    metrics: Arc<PipelineMetrics>,
    cancel: CancellationToken,
    bound_tx: watch::Sender<Option<SocketAddr>>,
    bound_rx: watch::Receiver<Option<SocketAddr>>,
}

impl UdpIntake {
    pub fn new(
        config: IntakeConfig,
        codec: Box<dyn Codec>,
        metrics: Arc<PipelineMetrics>,
        cancel: CancellationToken,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        metrics.set_queue_capacity(config.queue_size);
        metrics.set_workers(config.workers);
        let (bound_tx, bound_rx) = watch::channel(None);
        Ok(UdpIntake {
            config,
            codec,
            metrics,
            cancel,
            bound_tx,
            bound_rx,
        })
    }

    /// Watch resolving to the live bind address once the socket is up.
    ///
    /// With `port` 0 this is the only way to learn the ephemeral port the OS
    /// assigned; the value drops back to `None` between listener attempts.
    #[must_use]
    pub fn bound_addr(&self) -> watch::Receiver<Option<SocketAddr>> {
        self.bound_rx.clone()
    }

    /// Runs the pipeline until the cancellation token fires.
    ///
    /// Workers are spawned once, up front. The listener is supervised: any
    /// setup or socket error is logged, counted and retried after a cooldown,
    /// indefinitely, unless a stop has been requested.
    pub async fn run(self, sink: Arc<dyn OutputSink>) {
        let (queue_tx, queue_rx) = flume::bounded::<Datagram>(self.config.queue_size);

        for worker in 0..self.config.workers {
            debug!(worker, "Starting UDP intake worker");
            tokio::spawn(worker_loop(
                worker,
                self.codec.clone_codec(),
                queue_rx.clone(),
                Arc::clone(&sink),
                Arc::clone(&self.metrics),
                self.cancel.clone(),
            ));
        }
        drop(queue_rx);

        while !self.cancel.is_cancelled() {
            match self.listen_once(&queue_tx).await {
                Ok(()) => break,
                Err(e) => {
                    warn!(error = %e, "UDP listener died");
                    self.metrics.incr_listener_errors();
                }
            }
            let _ = self.bound_tx.send(None);
            tokio::select! {
                _ = sleep(LISTENER_RETRY_INTERVAL) => {}
                _ = self.cancel.cancelled() => {}
            }
        }

        let _ = self.bound_tx.send(None);
        debug!("UDP intake stopped");
    }

    /// One listener attempt: bind, publish the bound address, then forward
    /// datagrams until cancelled or the socket fails.
    async fn listen_once(&self, queue_tx: &flume::Sender<Datagram>) -> io::Result<()> {
        // host was validated at construction
        let bind_ip = self
            .config
            .bind_ip()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let requested_addr = format!("{}:{}", self.config.host, self.config.port);
        info!(address = %requested_addr, "Starting UDP listener");
        let listener = Listener::bind(
            bind_ip,
            &self.config,
            queue_tx.clone(),
            self.cancel.clone(),
        )?;
        let local_addr = listener.local_addr()?;
        let _ = self.bound_tx.send(Some(local_addr));
        info!(
            address = %local_addr,
            receive_buffer_bytes = ?self.config.receive_buffer_bytes,
            queue_size = self.config.queue_size,
            workers = self.config.workers,
            "UDP listener started"
        );

        listener.run().await
    }
}

/// One decode worker: drains the intake queue until cancelled or the queue
/// disconnects. A decode error terminates this worker for good; the pool is
/// not replenished.
async fn worker_loop(
    worker: usize,
    mut codec: Box<dyn Codec>,
    queue: flume::Receiver<Datagram>,
    sink: Arc<dyn OutputSink>,
    metrics: Arc<PipelineMetrics>,
    cancel: CancellationToken,
) {
    loop {
        let datagram = tokio::select! {
            _ = cancel.cancelled() => break,
            received = queue.recv_async() => match received {
                Ok(datagram) => datagram,
                Err(_) => break,
            },
        };

        if let Err(e) = process_datagram(codec.as_mut(), &datagram, sink.as_ref(), &metrics) {
            error!(worker, error = %e, "Exception in intake worker");
            metrics.incr_worker_errors();
            return;
        }
    }
    debug!(worker, "UDP intake worker stopped");
}

fn process_datagram(
    codec: &mut dyn Codec,
    datagram: &Datagram,
    sink: &dyn OutputSink,
    metrics: &PipelineMetrics,
) -> Result<(), DecodeError> {
    let mut forward = |mut record: Record| {
        parser::apply_fields(&mut record, &datagram.sender);
        metrics.incr_events();
        sink.push(record);
    };
    codec.decode(&datagram.payload, &mut forward)?;
    codec.flush(&mut forward)?;
    Ok(())
}
