use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use wakecam::audio::capture::AudioSource;
use wakecam::audio::pcm::{PcmFileSource, SilenceSource};
use wakecam::audio::window::SampleWindow;
use wakecam::cli::{Cli, Commands};
use wakecam::config::Config;
use wakecam::defaults;
use wakecam::feedback::{FeedbackEmitter, FeedbackPattern, SleepFeedback};
use wakecam::messages::{TransferEnd, TransferStart};
use wakecam::net::connection::ConnectionManager;
use wakecam::net::mqtt::MqttBroker;
use wakecam::net::topics::{ImagePart, TopicMap};
use wakecam::node::cam::CamNode;
use wakecam::node::frame::FileFrameSource;
use wakecam::node::logger::ActivityLogger;
use wakecam::node::router::SignalRouter;
use wakecam::node::trigger::TriggerLatch;
use wakecam::node::wake::WakeNode;
use wakecam::transfer::assembler::TransferAssembler;
use wakecam::transfer::encoder::ChunkedEncoder;
use wakecam::wake::energy::EnergyClassifier;
use wakecam::wake::policy::DetectionPolicy;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(host) = cli.broker_host {
        config.broker.host = host;
    }
    if let Some(port) = cli.broker_port {
        config.broker.port = port;
    }
    if let Some(prefix) = cli.topic_prefix {
        config.node.topic_prefix = prefix;
    }
    config.validate()?;

    info!(version = wakecam::version_string(), "wakecam starting");

    match cli.command {
        Commands::Wake {
            device_id,
            audio,
            once,
            trigger_interval,
        } => {
            if let Some(id) = device_id {
                config.node.wake_device_id = id;
            }
            match audio {
                Some(path) => run_wake(
                    &config,
                    PcmFileSource::open(&path)?,
                    once,
                    trigger_interval,
                ),
                None => run_wake(&config, SilenceSource, once, trigger_interval),
            }
        }
        Commands::Cam { device_id, frame } => {
            if let Some(id) = device_id {
                config.node.cam_device_id = id;
            }
            run_cam(&config, frame)
        }
        Commands::Recv { out_dir } => run_recv(&config, &out_dir),
    }
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Built-in defaults
/// Environment variable overrides apply last, CLI flags after that.
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = match custom_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    Ok(config.with_env_overrides())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Halt permanently, repeating the error pattern.
///
/// Reserved for startup failures the node cannot degrade through, such as
/// failing to allocate the sample window.
fn halt_with_error_feedback(feedback: &mut impl FeedbackEmitter) -> ! {
    loop {
        feedback.emit(FeedbackPattern::Error);
        std::thread::sleep(Duration::from_secs(1));
    }
}

fn run_wake(
    config: &Config,
    source: impl AudioSource,
    once: bool,
    trigger_interval: Option<u64>,
) -> Result<()> {
    let topics = TopicMap::new(&config.node.topic_prefix, &config.node.wake_device_id);
    let mut feedback = SleepFeedback;

    let window = match SampleWindow::new(config.audio.window_samples) {
        Ok(window) => window,
        Err(e) => {
            error!(error = %e, "sample window allocation failed");
            halt_with_error_feedback(&mut feedback);
        }
    };

    let broker = MqttBroker::new(&config.broker.host, config.broker.port);
    let connection = ConnectionManager::new(
        broker,
        &config.node.wake_device_id,
        Vec::new(),
        Duration::from_millis(config.broker.retry_interval_ms),
    );

    let mut node = WakeNode::new(
        connection,
        source,
        EnergyClassifier::new(config.audio.window_samples, "wake"),
        feedback,
        DetectionPolicy::from_config(&config.detection),
        ActivityLogger::new(
            &topics.logs(&config.node.wake_device_id),
            &config.node.wake_device_id,
        ),
        window,
        TriggerLatch::new(defaults::TRIGGER_DEBOUNCE),
        topics.signal(),
        config.node.wake_device_id.clone(),
        config.audio.block_samples,
        config.detection.low_range_floor,
        defaults::DETECTION_HOLD,
    );

    SleepFeedback.emit(FeedbackPattern::Success);
    info!(
        broker = %config.broker.host,
        device_id = %config.node.wake_device_id,
        "wake node running"
    );

    if once {
        return run_wake_once(&mut node);
    }

    let interval = trigger_interval.map(Duration::from_secs);
    let mut next_trigger = Instant::now();
    loop {
        let now = Instant::now();
        match interval {
            // Scheduled self-test triggers
            Some(interval) => {
                if now >= next_trigger {
                    node.trigger(now);
                    next_trigger = now + interval;
                }
            }
            // Continuous detection, throttled by the latch debounce
            None => node.trigger(now),
        }
        node.turn(now);
        std::thread::sleep(defaults::TURN_INTERVAL);
    }
}

/// Wait for the session, run one forced detection cycle, exit.
fn run_wake_once(
    node: &mut WakeNode<MqttBroker, impl AudioSource, EnergyClassifier, SleepFeedback>,
) -> Result<()> {
    let deadline = Instant::now() + Duration::from_secs(30);
    loop {
        let now = Instant::now();
        if node.connection_mut().state() == wakecam::net::connection::ConnectionState::Ready {
            node.trigger(now);
            node.turn(now);
            return Ok(());
        }
        if now >= deadline {
            anyhow::bail!("broker session not ready within 30s");
        }
        node.turn(now);
        std::thread::sleep(defaults::TURN_INTERVAL);
    }
}

fn run_cam(config: &Config, frame: PathBuf) -> Result<()> {
    let topics = TopicMap::new(&config.node.topic_prefix, &config.node.wake_device_id);

    let broker = MqttBroker::new(&config.broker.host, config.broker.port);
    let connection = ConnectionManager::new(
        broker,
        &config.node.cam_device_id,
        vec![topics.signal(), topics.command()],
        Duration::from_millis(config.broker.retry_interval_ms),
    );

    let router = SignalRouter::new(
        &topics.signal(),
        &topics.command(),
        Duration::from_millis(config.node.signal_timeout_ms),
    );
    let logger = ActivityLogger::new(
        &topics.logs(&config.node.cam_device_id),
        &config.node.cam_device_id,
    );
    let encoder = ChunkedEncoder::new(topics, config.transfer.chunk_size);

    let mut node = CamNode::new(
        connection,
        FileFrameSource::new(frame),
        SleepFeedback,
        router,
        encoder,
        logger,
    );

    SleepFeedback.emit(FeedbackPattern::Success);
    info!(
        broker = %config.broker.host,
        device_id = %config.node.cam_device_id,
        "camera node running"
    );

    loop {
        node.turn(Instant::now());
        std::thread::sleep(defaults::TURN_INTERVAL);
    }
}

/// Backend-side receiver: reassembles chunked transfers into JPEG files.
fn run_recv(config: &Config, out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir)?;

    let topics = TopicMap::new(&config.node.topic_prefix, &config.node.wake_device_id);
    let broker = MqttBroker::new(&config.broker.host, config.broker.port);
    let mut connection = ConnectionManager::new(
        broker,
        "wakecam-recv",
        vec![topics.image_wildcard()],
        Duration::from_millis(config.broker.retry_interval_ms),
    );
    let mut assembler = TransferAssembler::new(
        config.transfer.chunk_size,
        Duration::from_millis(config.node.signal_timeout_ms),
    );

    info!(broker = %config.broker.host, out_dir = %out_dir.display(), "receiver running");

    loop {
        let now = Instant::now();
        let outcome = connection.tick(now);
        for message in &outcome.inbound {
            let Some((image_id, part)) = topics.parse_image(&message.topic) else {
                continue;
            };
            match part {
                ImagePart::Start => {
                    match serde_json::from_slice::<TransferStart>(&message.payload) {
                        Ok(start) => assembler.on_start(&start, now),
                        Err(e) => warn!(image_id, error = %e, "malformed transfer start"),
                    }
                }
                ImagePart::Chunk(index) => {
                    assembler.on_chunk(image_id, index, &message.payload, now);
                }
                ImagePart::End => match serde_json::from_slice::<TransferEnd>(&message.payload) {
                    Ok(end) => {
                        if let Some(image) = assembler.on_end(&end, now) {
                            let path = out_dir.join(format!("image_{image_id}.jpg"));
                            match std::fs::write(&path, &image) {
                                Ok(()) => {
                                    info!(image_id, size = image.len(), path = %path.display(), "image received");
                                }
                                Err(e) => warn!(image_id, error = %e, "failed to write image"),
                            }
                        } else {
                            warn!(image_id, "incomplete transfer at end marker");
                        }
                    }
                    Err(e) => warn!(image_id, error = %e, "malformed transfer end"),
                },
            }
        }
        assembler.expire_stale(now);
        std::thread::sleep(defaults::TURN_INTERVAL);
    }
}
