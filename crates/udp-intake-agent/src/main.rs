// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, sync::Arc};

use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use udp_intake::{
    codec::PlainCodec, config::IntakeConfig, metrics::PipelineMetrics, server::UdpIntake,
    sink::ChannelSink,
};

const STATS_LOG_INTERVAL: u64 = 10;

#[tokio::main]
pub async fn main() {
    let log_level = env::var("UDP_INTAKE_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(log_level).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let port = match env::var("UDP_INTAKE_PORT")
        .ok()
        .and_then(|port| port.parse::<u16>().ok())
    {
        Some(port) => port,
        None => {
            error!("UDP_INTAKE_PORT must be set to a valid port. Shutting down.");
            return;
        }
    };

    let mut config = IntakeConfig::new(port);
    if let Ok(host) = env::var("UDP_INTAKE_HOST") {
        config.host = host;
    }
    config.buffer_size = env_usize("UDP_INTAKE_BUFFER_SIZE", config.buffer_size);
    config.workers = env_usize("UDP_INTAKE_WORKERS", config.workers);
    config.queue_size = env_usize("UDP_INTAKE_QUEUE_SIZE", config.queue_size);
    config.receive_buffer_bytes = env::var("UDP_INTAKE_RECEIVE_BUFFER_BYTES")
        .ok()
        .and_then(|val| val.parse::<usize>().ok());

    let metrics = Arc::new(PipelineMetrics::default());
    let cancel = CancellationToken::new();

    let server = match UdpIntake::new(
        config,
        Box::new(PlainCodec),
        Arc::clone(&metrics),
        cancel.clone(),
    ) {
        Ok(server) => server,
        Err(e) => {
            error!("Invalid UDP intake configuration: {e}. Shutting down.");
            return;
        }
    };

    let (sink, mut records) = ChannelSink::new();
    tokio::spawn(async move {
        while let Some(record) = records.recv().await {
            match serde_json::to_string(&record) {
                Ok(line) => println!("{line}"),
                Err(e) => error!("Failed to encode record: {e}"),
            }
        }
    });

    info!("udp-intake: starting to listen on port {port}");
    let run_task = tokio::spawn(server.run(Arc::new(sink)));

    let stats_cancel = cancel.clone();
    let stats_metrics = Arc::clone(&metrics);
    tokio::spawn(async move {
        let mut stats_interval = interval(Duration::from_secs(STATS_LOG_INTERVAL));
        stats_interval.tick().await; // discard first tick, which is instantaneous
        loop {
            tokio::select! {
                _ = stats_cancel.cancelled() => break,
                _ = stats_interval.tick() => {
                    let snapshot = stats_metrics.snapshot();
                    debug!(
                        events = snapshot.events,
                        listener_errors = snapshot.listener_errors,
                        worker_errors = snapshot.worker_errors,
                        "Pipeline stats"
                    );
                }
            }
        }
    });

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, stopping"),
        Err(e) => error!("Failed to listen for shutdown signal: {e}. Stopping."),
    }
    cancel.cancel();
    let _ = run_task.await;
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(default)
}
