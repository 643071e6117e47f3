// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

use udp_intake::codec::{LinesCodec, PlainCodec};
use udp_intake::config::IntakeConfig;
use udp_intake::metrics::PipelineMetrics;
use udp_intake::record::{MessageValue, Record};
use udp_intake::server::UdpIntake;
use udp_intake::sink::ChannelSink;

struct RunningIntake {
    addr: SocketAddr,
    records: UnboundedReceiver<Record>,
    metrics: Arc<PipelineMetrics>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

async fn start_intake(config: IntakeConfig, codec: Box<dyn udp_intake::codec::Codec>) -> RunningIntake {
    let metrics = Arc::new(PipelineMetrics::default());
    let cancel = CancellationToken::new();
    let server = UdpIntake::new(config, codec, Arc::clone(&metrics), cancel.clone())
        .expect("config should be valid");
    let mut bound = server.bound_addr();
    let (sink, records) = ChannelSink::new();
    let task = tokio::spawn(server.run(Arc::new(sink)));

    let addr = {
        let bound = timeout(Duration::from_secs(2), bound.wait_for(Option::is_some))
            .await
            .expect("timed out waiting for bind")
            .expect("bound address watch closed");
        bound.expect("watch resolved without an address")
    };

    RunningIntake {
        addr,
        records,
        metrics,
        cancel,
        task,
    }
}

fn loopback_config() -> IntakeConfig {
    let mut config = IntakeConfig::new(0);
    config.host = "127.0.0.1".to_string();
    config
}

#[tokio::test]
async fn udp_intake_parses_one_datagram_into_one_record() {
    let mut intake = start_intake(loopback_config(), Box::new(PlainCodec)).await;

    let client = UdpSocket::bind("127.0.0.1:0")
        .await
        .expect("unable to bind client socket");
    client
        .send_to(b"cpu:0.95|gauge", intake.addr)
        .await
        .expect("unable to send datagram");

    let record = timeout(Duration::from_secs(2), intake.records.recv())
        .await
        .expect("timed out waiting for record")
        .expect("sink closed");

    assert_eq!(record.name.as_deref(), Some("cpu"));
    assert_eq!(record.value.as_deref(), Some("0.95"));
    assert_eq!(record.kind.as_deref(), Some("gauge"));
    assert_eq!(record.message, None);
    assert_eq!(record.host.as_deref(), Some("127.0.0.1"));
    assert_eq!(record.tags, None);
    assert_eq!(intake.metrics.snapshot().events, 1);

    intake.cancel.cancel();
    timeout(Duration::from_secs(2), intake.task)
        .await
        .expect("run did not stop after cancellation")
        .expect("run task panicked");
}

#[tokio::test]
async fn udp_intake_attaches_tags_without_stalling() {
    let mut intake = start_intake(loopback_config(), Box::new(PlainCodec)).await;

    let client = UdpSocket::bind("127.0.0.1:0")
        .await
        .expect("unable to bind client socket");
    client
        .send_to(b"cpu:0.95|gauge|#env:prod,region:us", intake.addr)
        .await
        .expect("unable to send datagram");
    client
        .send_to(b"mem:0.5|gauge", intake.addr)
        .await
        .expect("unable to send datagram");

    let first = timeout(Duration::from_secs(2), intake.records.recv())
        .await
        .expect("timed out waiting for first record")
        .expect("sink closed");
    assert_eq!(
        first.tags,
        Some(vec![
            ("env".to_string(), "prod".to_string()),
            ("region".to_string(), "us".to_string()),
        ])
    );

    // the tagged datagram must not block pipeline progress
    let second = timeout(Duration::from_secs(2), intake.records.recv())
        .await
        .expect("timed out waiting for second record")
        .expect("sink closed");
    assert_eq!(second.name.as_deref(), Some("mem"));

    intake.cancel.cancel();
    let _ = timeout(Duration::from_secs(2), intake.task).await;
}

#[tokio::test]
async fn udp_intake_forwards_non_utf8_payload_unparsed() {
    let mut intake = start_intake(loopback_config(), Box::new(PlainCodec)).await;

    let client = UdpSocket::bind("127.0.0.1:0")
        .await
        .expect("unable to bind client socket");
    client
        .send_to(&[0xff, 0xfe, 0x01], intake.addr)
        .await
        .expect("unable to send datagram");

    let record = timeout(Duration::from_secs(2), intake.records.recv())
        .await
        .expect("timed out waiting for record")
        .expect("sink closed");
    assert_eq!(
        record.message,
        Some(MessageValue::Bytes(vec![0xff, 0xfe, 0x01]))
    );
    assert_eq!(record.name, None);
    // pass-through still counts as a successful event
    assert_eq!(intake.metrics.snapshot().events, 1);

    intake.cancel.cancel();
    let _ = timeout(Duration::from_secs(2), intake.task).await;
}

#[tokio::test]
async fn udp_intake_splits_lines_with_lines_codec() {
    let mut intake = start_intake(loopback_config(), Box::new(LinesCodec::default())).await;

    let client = UdpSocket::bind("127.0.0.1:0")
        .await
        .expect("unable to bind client socket");
    client
        .send_to(b"cpu:1|c\nmem:2|c\n", intake.addr)
        .await
        .expect("unable to send datagram");

    let first = timeout(Duration::from_secs(2), intake.records.recv())
        .await
        .expect("timed out waiting for first record")
        .expect("sink closed");
    let second = timeout(Duration::from_secs(2), intake.records.recv())
        .await
        .expect("timed out waiting for second record")
        .expect("sink closed");
    assert_eq!(first.name.as_deref(), Some("cpu"));
    assert_eq!(second.name.as_deref(), Some("mem"));

    intake.cancel.cancel();
    let _ = timeout(Duration::from_secs(2), intake.task).await;
}

#[tokio::test]
#[traced_test]
async fn udp_intake_retries_while_port_is_taken() {
    let holder = UdpSocket::bind("127.0.0.1:0")
        .await
        .expect("unable to bind holder socket");
    let mut config = loopback_config();
    config.port = holder.local_addr().expect("local addr").port();

    let metrics = Arc::new(PipelineMetrics::default());
    let cancel = CancellationToken::new();
    let server = UdpIntake::new(
        config,
        Box::new(PlainCodec),
        Arc::clone(&metrics),
        cancel.clone(),
    )
    .expect("config should be valid");
    let (sink, _records) = ChannelSink::new();
    // driven on this task, not spawned, so the retry warnings are observable
    let run = server.run(Arc::new(sink));
    tokio::pin!(run);

    tokio::select! {
        _ = &mut run => panic!("run must keep retrying while not stopped"),
        _ = sleep(Duration::from_millis(300)) => {}
    }
    assert!(metrics.snapshot().listener_errors >= 1);
    assert!(logs_contain("UDP listener died"));

    // cancellation interrupts the retry cooldown
    cancel.cancel();
    timeout(Duration::from_secs(2), run)
        .await
        .expect("run did not stop after cancellation");
}

#[tokio::test]
async fn udp_intake_stop_is_idempotent() {
    let intake = start_intake(loopback_config(), Box::new(PlainCodec)).await;

    intake.cancel.cancel();
    intake.cancel.cancel();
    timeout(Duration::from_secs(2), intake.task)
        .await
        .expect("run did not stop after cancellation")
        .expect("run task panicked");
}
