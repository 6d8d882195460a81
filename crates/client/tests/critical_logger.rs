//! End-to-end delivery scenarios for the critical access logger, driven
//! against the in-memory transport.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use common::{http_entry, id_matches_payload, init_tracing, tcp_entry, MockTransport};
use logship_client::proto::critical_logs_message::LogEntries;
use logship_client::{CriticalAccessLogger, CriticalLogConfig, CriticalLogMetrics};

fn test_config() -> CriticalLogConfig {
    let mut config = CriticalLogConfig::new("listener.critical");
    config.node_id = "node-1".to_string();
    config.node_cluster = "test".to_string();
    config.buffer_flush_interval = Duration::from_millis(30);
    config.message_ack_timeout = Duration::from_millis(150);
    config
}

#[tokio::test]
async fn ack_completes_delivery() {
    init_tracing();
    let (peer, transport) = MockTransport::new();
    let metrics = Arc::new(CriticalLogMetrics::new());
    let (handle, task) = CriticalAccessLogger::spawn(test_config(), transport, metrics.clone());

    handle.log_http(http_entry("/orders"));
    sleep(Duration::from_millis(100)).await;

    let sent = peer.sent();
    assert_eq!(sent.len(), 1);
    assert!(id_matches_payload(&sent[0]));
    let identifier = sent[0].identifier.as_ref().expect("first message is stamped");
    assert_eq!(identifier.log_name, "listener.critical");
    assert_eq!(identifier.node.as_ref().unwrap().id, "node-1");
    assert_eq!(metrics.pending_critical_logs.load(Ordering::Relaxed), 1);

    peer.ack(sent[0].id).await;
    sleep(Duration::from_millis(60)).await;

    assert_eq!(metrics.critical_logs_ack_received.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.pending_critical_logs.load(Ordering::Relaxed), 0);

    // The acked message is gone: nothing is resent, no deadline fires.
    sleep(Duration::from_millis(300)).await;
    assert_eq!(peer.sent_count(), 1);
    assert_eq!(
        metrics.critical_logs_message_timeout.load(Ordering::Relaxed),
        0
    );

    drop(handle);
    task.await.unwrap();
}

#[tokio::test]
async fn nack_triggers_resend_of_the_same_payload() {
    init_tracing();
    let (peer, transport) = MockTransport::new();
    let metrics = Arc::new(CriticalLogMetrics::new());
    let (handle, task) = CriticalAccessLogger::spawn(test_config(), transport, metrics.clone());

    handle.log_http(http_entry("/payments"));
    sleep(Duration::from_millis(100)).await;
    assert_eq!(peer.sent_count(), 1);
    let first = peer.sent().remove(0);

    peer.nack(first.id).await;
    sleep(Duration::from_millis(100)).await;

    let sent = peer.sent();
    assert!(sent.len() >= 2, "nacked message was not resent");
    assert_eq!(sent[1].id, first.id);
    assert_eq!(sent[1], first);
    assert_eq!(metrics.critical_logs_nack_received.load(Ordering::Relaxed), 1);

    peer.ack(first.id).await;
    sleep(Duration::from_millis(60)).await;
    assert_eq!(metrics.critical_logs_ack_received.load(Ordering::Relaxed), 1);

    drop(handle);
    task.await.unwrap();
}

#[tokio::test]
async fn missing_ack_times_out_and_resends() {
    init_tracing();
    let (peer, transport) = MockTransport::new();
    let metrics = Arc::new(CriticalLogMetrics::new());
    let (handle, task) = CriticalAccessLogger::spawn(test_config(), transport, metrics.clone());

    handle.log_http(http_entry("/slow-collector"));
    sleep(Duration::from_millis(100)).await;
    assert_eq!(peer.sent_count(), 1);

    // No reply at all: the deadline passes, the message is rebuffered and
    // the next flush resends it under the same fingerprint.
    sleep(Duration::from_millis(400)).await;

    let sent = peer.sent();
    assert!(sent.len() >= 2, "timed-out message was not resent");
    assert_eq!(sent[1].id, sent[0].id);
    assert_eq!(sent[1], sent[0]);
    assert!(metrics.critical_logs_message_timeout.load(Ordering::Relaxed) >= 1);

    drop(handle);
    task.await.unwrap();
}

#[tokio::test]
async fn identifier_is_stamped_only_on_the_first_message_of_a_stream() {
    init_tracing();
    let (peer, transport) = MockTransport::new();
    let metrics = Arc::new(CriticalLogMetrics::new());
    let (handle, task) = CriticalAccessLogger::spawn(test_config(), transport, metrics.clone());

    handle.log_http(http_entry("/first"));
    sleep(Duration::from_millis(100)).await;
    handle.log_http(http_entry("/second"));
    sleep(Duration::from_millis(100)).await;

    let sent = peer.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].identifier.is_some());
    assert!(
        sent[1].identifier.is_none(),
        "stream was already open, second batch must not be stamped"
    );

    drop(handle);
    task.await.unwrap();
}

#[tokio::test]
async fn oversized_composite_flushes_before_the_timer() {
    init_tracing();
    let (peer, transport) = MockTransport::new();
    let metrics = Arc::new(CriticalLogMetrics::new());
    let mut config = test_config();
    // Any entry exceeds the threshold, so logging alone must flush; the
    // periodic timer is effectively disabled.
    config.buffer_flush_interval = Duration::from_secs(10);
    config.max_buffer_bytes = 1;
    let (handle, task) = CriticalAccessLogger::spawn(config, transport, metrics.clone());

    handle.log_http(http_entry("/burst"));
    sleep(Duration::from_millis(50)).await;

    assert_eq!(peer.sent_count(), 1);

    drop(handle);
    task.await.unwrap();
}

#[tokio::test]
async fn switching_entry_kind_flushes_the_current_batch() {
    init_tracing();
    let (peer, transport) = MockTransport::new();
    let metrics = Arc::new(CriticalLogMetrics::new());
    let (handle, task) = CriticalAccessLogger::spawn(test_config(), transport, metrics.clone());

    handle.log_http(http_entry("/mixed"));
    handle.log_tcp(tcp_entry(2048));
    sleep(Duration::from_millis(120)).await;

    let sent = peer.sent();
    assert_eq!(sent.len(), 2);
    assert!(matches!(sent[0].log_entries, Some(LogEntries::HttpLogs(_))));
    assert!(matches!(sent[1].log_entries, Some(LogEntries::TcpLogs(_))));

    drop(handle);
    task.await.unwrap();
}

#[tokio::test]
async fn slow_driver_drops_instead_of_blocking() {
    init_tracing();
    let (peer, transport) = MockTransport::new();
    let metrics = Arc::new(CriticalLogMetrics::new());
    let mut config = test_config();
    config.event_queue_depth = 1;
    let (handle, task) = CriticalAccessLogger::spawn(config, transport, metrics.clone());

    // On the single-threaded test runtime the driver cannot run between
    // these calls, so everything beyond the queue depth is dropped.
    for _ in 0..5 {
        handle.log_http(http_entry("/flood"));
    }
    assert_eq!(metrics.dropped_logs.load(Ordering::Relaxed), 4);

    sleep(Duration::from_millis(100)).await;
    assert_eq!(peer.sent_count(), 1);

    drop(handle);
    task.await.unwrap();
}
