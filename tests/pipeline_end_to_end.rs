//! End-to-end pipeline scenarios over mock peripherals and brokers.
//!
//! Wires the public building blocks together the way the binary does and
//! checks the cross-module contracts: signal handoff, chunked transfer
//! round-trips, abort semantics, and connection recovery.

use std::time::{Duration, Instant};
use wakecam::audio::capture::MockAudioSource;
use wakecam::audio::window::SampleWindow;
use wakecam::feedback::MockFeedback;
use wakecam::messages::{SignalMessage, TransferEnd, TransferStart};
use wakecam::net::broker::{InboundMessage, MockBroker};
use wakecam::net::connection::{ConnectionManager, ConnectionState};
use wakecam::net::topics::{ImagePart, TopicMap};
use wakecam::node::cam::CamNode;
use wakecam::node::frame::MockFrameSource;
use wakecam::node::logger::ActivityLogger;
use wakecam::node::router::SignalRouter;
use wakecam::node::trigger::TriggerLatch;
use wakecam::node::wake::WakeNode;
use wakecam::transfer::assembler::TransferAssembler;
use wakecam::transfer::encoder::{ChunkSink, ChunkedEncoder};
use wakecam::wake::classifier::MockClassifier;
use wakecam::wake::policy::DetectionPolicy;

const WINDOW: usize = 1000;
const CHUNK: usize = 2048;
const RETRY: Duration = Duration::from_secs(5);

fn topics() -> TopicMap {
    TopicMap::new("wakecam", "wakecam-wroom-001")
}

fn wake_node(
    broker: MockBroker,
    source: MockAudioSource,
    classifier: MockClassifier,
) -> WakeNode<MockBroker, MockAudioSource, MockClassifier, MockFeedback> {
    let map = topics();
    let connection = ConnectionManager::new(broker, "wakecam-wroom-001", Vec::new(), RETRY);
    WakeNode::new(
        connection,
        source,
        classifier,
        MockFeedback::new(),
        DetectionPolicy::new(0.4, vec!["noise".to_string(), "background".to_string()]),
        ActivityLogger::new(&map.logs("wakecam-wroom-001"), "wakecam-wroom-001"),
        SampleWindow::new(WINDOW).unwrap(),
        TriggerLatch::new(Duration::from_millis(200)),
        map.signal(),
        "wakecam-wroom-001".to_string(),
        256,
        100,
        Duration::from_secs(5),
    )
}

fn cam_node(
    broker: MockBroker,
    frames: MockFrameSource,
) -> CamNode<MockBroker, MockFrameSource, MockFeedback> {
    let map = topics();
    let subscriptions = vec![map.signal(), map.command()];
    let connection = ConnectionManager::new(broker, "wakecam-cam-001", subscriptions, RETRY);
    CamNode::new(
        connection,
        frames,
        MockFeedback::new(),
        SignalRouter::new(&map.signal(), &map.command(), Duration::from_secs(10)),
        ChunkedEncoder::new(map, CHUNK),
        ActivityLogger::new("wakecam/logs/wakecam-cam-001", "wakecam-cam-001"),
    )
}

/// Records chunk publishes, optionally failing from the n-th publish on.
#[derive(Default)]
struct RecordingSink {
    published: Vec<(String, Vec<u8>)>,
    fail_from: Option<usize>,
    attempts: usize,
}

impl RecordingSink {
    fn failing_from(n: usize) -> Self {
        Self {
            fail_from: Some(n),
            ..Self::default()
        }
    }
}

impl ChunkSink for RecordingSink {
    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        self.attempts += 1;
        if self.fail_from.is_some_and(|n| self.attempts > n) {
            return false;
        }
        self.published.push((topic.to_string(), payload.to_vec()));
        true
    }
}

/// Replays recorded transfer publishes into an assembler.
fn reassemble(published: &[(String, Vec<u8>)], now: Instant) -> Option<Vec<u8>> {
    let map = topics();
    let mut assembler = TransferAssembler::new(CHUNK, Duration::from_secs(10));
    let mut image = None;
    for (topic, payload) in published {
        match map.parse_image(topic) {
            Some((_, ImagePart::Start)) => {
                let start: TransferStart = serde_json::from_slice(payload).unwrap();
                assembler.on_start(&start, now);
            }
            Some((id, ImagePart::Chunk(index))) => {
                assembler.on_chunk(id, index, payload, now);
            }
            Some((_, ImagePart::End)) => {
                let end: TransferEnd = serde_json::from_slice(payload).unwrap();
                image = assembler.on_end(&end, now);
            }
            None => {}
        }
    }
    image
}

#[test]
fn test_detection_signal_drives_camera_capture() {
    let now = Instant::now();

    // Wake node detects and publishes a signal
    let classifier = MockClassifier::new(WINDOW).with_scores(&[("noise", 0.2), ("marvin", 0.8)]);
    let source = MockAudioSource::new().with_samples(vec![2000, -2000]);
    let mut wake = wake_node(MockBroker::new(), source, classifier);
    wake.trigger(now);
    wake.turn(now);

    let signal_topic = topics().signal();
    let signal = wake
        .connection_mut()
        .broker_mut()
        .published
        .iter()
        .find(|(topic, _)| *topic == signal_topic)
        .expect("wake node published a signal")
        .clone();
    let parsed: SignalMessage = serde_json::from_slice(&signal.1).unwrap();
    assert_eq!(parsed.device_id, "wakecam-wroom-001");

    // Camera node receives that exact message and answers with a transfer
    let frame = vec![0xABu8; 5000];
    let mut cam = cam_node(MockBroker::new(), MockFrameSource::new().with_frame(frame.clone()));
    cam.turn(now);
    cam.connection_mut()
        .broker_mut()
        .push_inbound(InboundMessage::new(&signal.0, signal.1.clone()));
    cam.turn(now + Duration::from_millis(10));

    let published = cam.connection_mut().broker_mut().published.clone();
    let received = reassemble(&published, now).expect("transfer completed");
    assert_eq!(received, frame);
}

#[test]
fn test_silent_window_publishes_nothing() {
    let now = Instant::now();
    let classifier = MockClassifier::new(WINDOW).with_scores(&[("noise", 0.3), ("marvin", 0.1)]);
    let mut wake = wake_node(MockBroker::new(), MockAudioSource::new(), classifier);

    wake.trigger(now);
    wake.turn(now);

    let signal_topic = topics().signal();
    assert!(
        !wake
            .connection_mut()
            .broker_mut()
            .published_topics()
            .contains(&signal_topic.as_str())
    );
}

#[test]
fn test_fifty_kilobyte_payload_round_trips_in_25_chunks() {
    let now = Instant::now();
    let payload: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();

    let encoder = ChunkedEncoder::new(topics(), CHUNK);
    let mut sink = RecordingSink::default();
    let outcome = encoder.send(&mut sink, &payload, 7);

    assert!(outcome.completed);
    assert_eq!(outcome.total_chunks, 25);
    // start + 25 chunks + end
    assert_eq!(sink.published.len(), 27);

    let received = reassemble(&sink.published, now).expect("complete transfer");
    assert_eq!(received, payload);
}

#[test]
fn test_chunk_failure_aborts_without_end_marker() {
    let now = Instant::now();
    let payload = vec![9u8; 10_000];

    let encoder = ChunkedEncoder::new(topics(), CHUNK);
    // start and two chunks succeed, the third chunk fails
    let mut sink = RecordingSink::failing_from(3);
    let outcome = encoder.send(&mut sink, &payload, 1);

    assert!(!outcome.completed);
    assert!(!sink.published.iter().any(|(t, _)| t.ends_with("/end")));
    // No retry: exactly one failed attempt past the cutoff
    assert_eq!(sink.attempts, 4);

    // The receiver never completes the image
    assert!(reassemble(&sink.published, now).is_none());
}

#[test]
fn test_connection_recovers_and_drops_offline_publishes() {
    let broker = MockBroker::new().with_connect_failures(2);
    let map = topics();
    let mut connection = ConnectionManager::new(
        broker,
        "wakecam-cam-001",
        vec![map.signal(), map.command()],
        RETRY,
    );
    let t0 = Instant::now();

    // First two cycles fail to connect; publishes while down are dropped
    connection.tick(t0);
    assert_ne!(connection.state(), ConnectionState::Ready);
    assert!(!connection.publish("wakecam/logs/x", b"offline"));

    connection.tick(t0 + RETRY);
    assert_ne!(connection.state(), ConnectionState::Ready);

    connection.tick(t0 + RETRY * 2);
    assert_eq!(connection.state(), ConnectionState::Ready);

    // Nothing queued while down ever reaches the broker
    assert!(connection.broker_mut().published.is_empty());
    assert!(connection.publish("wakecam/logs/x", b"online"));
    assert_eq!(connection.broker_mut().published.len(), 1);
}

#[test]
fn test_duplicate_signals_coalesce_into_one_capture() {
    let t0 = Instant::now();
    let mut cam = cam_node(MockBroker::new(), MockFrameSource::new());
    cam.turn(t0);

    let signal_topic = topics().signal();
    for _ in 0..5 {
        cam.connection_mut().broker_mut().push_inbound(InboundMessage::new(
            &signal_topic,
            br#"{"device_id":"wakecam-wroom-001","timestamp":1}"#.to_vec(),
        ));
    }
    cam.turn(t0 + Duration::from_millis(10));
    cam.turn(t0 + Duration::from_millis(20));

    assert_eq!(cam.image_counter(), 1);
}
