//! Wake node control loop.
//!
//! One cooperative turn advances the broker session, observes the trigger
//! latch, and runs at most one capture + classification cycle. All state
//! is owned by the loop; nothing here is shared across threads.

use crate::audio::capture::{AudioSource, capture_window};
use crate::audio::window::SampleWindow;
use crate::feedback::{FeedbackEmitter, FeedbackPattern};
use crate::messages::SignalMessage;
use crate::net::broker::BrokerClient;
use crate::net::connection::ConnectionManager;
use crate::node::logger::ActivityLogger;
use crate::node::trigger::TriggerLatch;
use crate::wake::classifier::Classifier;
use crate::wake::policy::DetectionPolicy;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// The wake-word node: audio in, signal out.
pub struct WakeNode<B, A, C, F>
where
    B: BrokerClient,
    A: AudioSource,
    C: Classifier,
    F: FeedbackEmitter,
{
    connection: ConnectionManager<B>,
    source: A,
    classifier: C,
    feedback: F,
    policy: DetectionPolicy,
    logger: ActivityLogger,
    window: SampleWindow,
    trigger: TriggerLatch,
    signal_topic: String,
    device_id: String,
    block_samples: usize,
    low_range_floor: i32,
    detection_hold: Duration,
    held_since: Option<Instant>,
    started: Instant,
}

impl<B, A, C, F> WakeNode<B, A, C, F>
where
    B: BrokerClient,
    A: AudioSource,
    C: Classifier,
    F: FeedbackEmitter,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        connection: ConnectionManager<B>,
        source: A,
        classifier: C,
        feedback: F,
        policy: DetectionPolicy,
        logger: ActivityLogger,
        window: SampleWindow,
        trigger: TriggerLatch,
        signal_topic: String,
        device_id: String,
        block_samples: usize,
        low_range_floor: i32,
        detection_hold: Duration,
    ) -> Self {
        Self {
            connection,
            source,
            classifier,
            feedback,
            policy,
            logger,
            window,
            trigger,
            signal_topic,
            device_id,
            block_samples,
            low_range_floor,
            detection_hold,
            held_since: None,
            started: Instant::now(),
        }
    }

    /// Registers a trigger edge (button, scheduled test).
    pub fn trigger(&mut self, now: Instant) {
        self.trigger.press(now);
    }

    /// True while a recent detection is being held before returning idle.
    pub fn detection_active(&self) -> bool {
        self.held_since.is_some()
    }

    pub fn connection_mut(&mut self) -> &mut ConnectionManager<B> {
        &mut self.connection
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    /// Runs one control-loop turn.
    pub fn turn(&mut self, now: Instant) {
        let outcome = self.connection.tick(now);
        if outcome.became_ready {
            self.logger.log(&mut self.connection, "connected");
        }
        // This node subscribes to nothing; inbound messages are ignored.

        if let Some(at) = self.held_since
            && now.duration_since(at) >= self.detection_hold
        {
            self.held_since = None;
            self.feedback.emit(FeedbackPattern::Idle);
        }

        if self.trigger.take() {
            self.run_detection_cycle(now);
        }
    }

    /// One capture + classify + publish cycle, entirely within this turn.
    fn run_detection_cycle(&mut self, now: Instant) {
        self.feedback.emit(FeedbackPattern::Start);

        if let Err(e) = capture_window(&mut self.source, &mut self.window, self.block_samples) {
            warn!(error = %e, "capture aborted");
            self.feedback.emit(FeedbackPattern::Error);
            self.logger.log(&mut self.connection, "audio capture failed");
            return;
        }

        if self.window.dynamic_range() < self.low_range_floor {
            warn!(
                range = self.window.dynamic_range(),
                "very low audio amplitude, check microphone"
            );
            self.feedback.emit(FeedbackPattern::Warning);
        }

        let scores = match self.classifier.classify(&self.window) {
            Ok(scores) => scores,
            Err(e) => {
                warn!(error = %e, "classification failed");
                self.feedback.emit(FeedbackPattern::Error);
                self.logger.log(&mut self.connection, "classification failed");
                return;
            }
        };

        match self.policy.evaluate(&scores, now) {
            Some(event) => {
                info!(label = %event.label, confidence = event.confidence, "wake word detected");
                self.publish_signal(now);
                self.feedback.emit(FeedbackPattern::Detected);
                self.held_since = Some(now);
            }
            None => {
                self.feedback.emit(FeedbackPattern::Idle);
            }
        }
    }

    fn publish_signal(&mut self, now: Instant) {
        let message = SignalMessage {
            device_id: self.device_id.clone(),
            timestamp: now.duration_since(self.started).as_millis() as u64,
        };
        let Ok(body) = serde_json::to_vec(&message) else {
            return;
        };
        if self.connection.publish(&self.signal_topic, &body) {
            self.logger
                .log(&mut self.connection, "wakeword signal published");
        } else {
            self.logger
                .log(&mut self.connection, "wakeword signal publish failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::capture::MockAudioSource;
    use crate::feedback::MockFeedback;
    use crate::net::broker::MockBroker;
    use crate::wake::classifier::MockClassifier;

    const WINDOW: usize = 1000;
    const RETRY: Duration = Duration::from_secs(5);
    const HOLD: Duration = Duration::from_secs(5);

    fn node(
        broker: MockBroker,
        source: MockAudioSource,
        classifier: MockClassifier,
    ) -> WakeNode<MockBroker, MockAudioSource, MockClassifier, MockFeedback> {
        let connection = ConnectionManager::new(broker, "wroom-001", Vec::new(), RETRY);
        WakeNode::new(
            connection,
            source,
            classifier,
            MockFeedback::new(),
            DetectionPolicy::new(0.4, vec!["noise".to_string()]),
            ActivityLogger::new("wakecam/logs/wroom-001", "wroom-001"),
            SampleWindow::new(WINDOW).unwrap(),
            TriggerLatch::new(Duration::from_millis(200)),
            "wakecam/device/wroom-001/signal".to_string(),
            "wroom-001".to_string(),
            256,
            100,
            HOLD,
        )
    }

    fn loud_source() -> MockAudioSource {
        MockAudioSource::new().with_samples(vec![1000, -1000])
    }

    #[test]
    fn test_detection_publishes_signal_and_feedback() {
        let classifier = MockClassifier::new(WINDOW).with_scores(&[("noise", 0.1), ("marvin", 0.8)]);
        let mut node = node(MockBroker::new(), loud_source(), classifier);
        let now = Instant::now();

        node.trigger(now);
        node.turn(now);

        let published = &node.connection_mut().broker_mut().published;
        let signal = published
            .iter()
            .find(|(t, _)| t == "wakecam/device/wroom-001/signal")
            .expect("signal published");
        let parsed: SignalMessage = serde_json::from_slice(&signal.1).unwrap();
        assert_eq!(parsed.device_id, "wroom-001");

        assert!(node.feedback().emitted.contains(&FeedbackPattern::Detected));
        assert!(node.detection_active());
    }

    #[test]
    fn test_detection_logs_activity() {
        let classifier = MockClassifier::new(WINDOW).with_scores(&[("marvin", 0.9)]);
        let mut node = node(MockBroker::new(), loud_source(), classifier);
        let now = Instant::now();

        node.trigger(now);
        node.turn(now);

        let lines: Vec<String> = node
            .connection_mut()
            .broker_mut()
            .published
            .iter()
            .filter(|(t, _)| t == "wakecam/logs/wroom-001")
            .map(|(_, p)| String::from_utf8_lossy(p).into_owned())
            .collect();
        assert!(lines.contains(&"wroom-001: connected".to_string()));
        assert!(lines.contains(&"wroom-001: wakeword signal published".to_string()));
    }

    #[test]
    fn test_silence_yields_no_detection_and_no_publish() {
        // All-zero window: every confidence below threshold
        let classifier =
            MockClassifier::new(WINDOW).with_scores(&[("noise", 0.3), ("marvin", 0.2)]);
        let mut node = node(MockBroker::new(), MockAudioSource::new(), classifier);
        let now = Instant::now();

        node.trigger(now);
        node.turn(now);

        let topics = node.connection_mut().broker_mut().published_topics();
        assert!(!topics.contains(&"wakecam/device/wroom-001/signal"));
        assert_eq!(node.feedback().emitted.last(), Some(&FeedbackPattern::Idle));
        assert!(!node.detection_active());
    }

    #[test]
    fn test_silent_window_fires_microphone_warning() {
        let classifier = MockClassifier::new(WINDOW).with_scores(&[("marvin", 0.9)]);
        let mut node = node(MockBroker::new(), MockAudioSource::new(), classifier);
        let now = Instant::now();

        node.trigger(now);
        node.turn(now);

        // Warning fires but classification still ran and detected
        assert!(node.feedback().emitted.contains(&FeedbackPattern::Warning));
        assert!(node.feedback().emitted.contains(&FeedbackPattern::Detected));
    }

    #[test]
    fn test_audio_error_aborts_cycle_with_error_feedback() {
        let classifier = MockClassifier::new(WINDOW).with_scores(&[("marvin", 0.9)]);
        let source = loud_source().with_read_failure_after(0);
        let mut node = node(MockBroker::new(), source, classifier);
        let now = Instant::now();

        node.trigger(now);
        node.turn(now);

        assert!(node.feedback().emitted.contains(&FeedbackPattern::Error));
        let topics = node.connection_mut().broker_mut().published_topics();
        assert!(!topics.contains(&"wakecam/device/wroom-001/signal"));
    }

    #[test]
    fn test_classifier_error_emits_error_and_no_publish() {
        let classifier = MockClassifier::new(WINDOW).with_failure("dsp error");
        let mut node = node(MockBroker::new(), loud_source(), classifier);
        let now = Instant::now();

        node.trigger(now);
        node.turn(now);

        assert!(node.feedback().emitted.contains(&FeedbackPattern::Error));
        let topics = node.connection_mut().broker_mut().published_topics();
        assert!(!topics.contains(&"wakecam/device/wroom-001/signal"));
    }

    #[test]
    fn test_detection_while_disconnected_drops_signal() {
        let classifier = MockClassifier::new(WINDOW).with_scores(&[("marvin", 0.9)]);
        let broker = MockBroker::new().with_connect_failures(10);
        let mut node = node(broker, loud_source(), classifier);
        let now = Instant::now();

        node.trigger(now);
        node.turn(now);

        // The cycle still runs locally; nothing reaches the broker
        assert!(node.feedback().emitted.contains(&FeedbackPattern::Detected));
        assert!(node.connection_mut().broker_mut().published.is_empty());
    }

    #[test]
    fn test_detection_hold_expires_to_idle() {
        let classifier = MockClassifier::new(WINDOW).with_scores(&[("marvin", 0.9)]);
        let mut node = node(MockBroker::new(), loud_source(), classifier);
        let t0 = Instant::now();

        node.trigger(t0);
        node.turn(t0);
        assert!(node.detection_active());

        node.turn(t0 + HOLD);
        assert!(!node.detection_active());
        assert_eq!(node.feedback().emitted.last(), Some(&FeedbackPattern::Idle));
    }

    #[test]
    fn test_at_most_one_cycle_per_turn() {
        let classifier = MockClassifier::new(WINDOW).with_scores(&[("marvin", 0.9)]);
        let mut node = node(MockBroker::new(), loud_source(), classifier);
        let t0 = Instant::now();

        node.trigger(t0);
        node.trigger(t0 + Duration::from_secs(1));
        node.turn(t0 + Duration::from_secs(1));

        let signals = node
            .connection_mut()
            .broker_mut()
            .published_topics()
            .iter()
            .filter(|t| t.ends_with("/signal"))
            .count();
        assert_eq!(signals, 1);
    }
}
