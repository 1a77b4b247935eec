//! Camera node control loop.
//!
//! Listens for wake-word signals and server commands, and answers a latched
//! capture request with one frame capture and one chunked transfer per
//! turn. The image id increments per capture attempt whether or not the
//! transfer succeeds, so receivers must tolerate id gaps. An in-flight
//! transfer runs to completion or first failure within the turn.

use crate::feedback::{FeedbackEmitter, FeedbackPattern};
use crate::net::broker::BrokerClient;
use crate::net::connection::ConnectionManager;
use crate::node::frame::FrameSource;
use crate::node::logger::ActivityLogger;
use crate::node::router::{RouteOutcome, SignalRouter};
use crate::transfer::encoder::ChunkedEncoder;
use std::time::Instant;
use tracing::{info, warn};

/// The capture node: triggers in, chunked frames out.
pub struct CamNode<B, F, FB>
where
    B: BrokerClient,
    F: FrameSource,
    FB: FeedbackEmitter,
{
    connection: ConnectionManager<B>,
    frames: F,
    feedback: FB,
    router: SignalRouter,
    encoder: ChunkedEncoder,
    logger: ActivityLogger,
    image_counter: u32,
}

impl<B, F, FB> CamNode<B, F, FB>
where
    B: BrokerClient,
    F: FrameSource,
    FB: FeedbackEmitter,
{
    pub fn new(
        connection: ConnectionManager<B>,
        frames: F,
        feedback: FB,
        router: SignalRouter,
        encoder: ChunkedEncoder,
        logger: ActivityLogger,
    ) -> Self {
        Self {
            connection,
            frames,
            feedback,
            router,
            encoder,
            logger,
            image_counter: 0,
        }
    }

    /// Id of the most recent capture attempt.
    pub fn image_counter(&self) -> u32 {
        self.image_counter
    }

    pub fn connection_mut(&mut self) -> &mut ConnectionManager<B> {
        &mut self.connection
    }

    pub fn feedback(&self) -> &FB {
        &self.feedback
    }

    /// Runs one control-loop turn: at most one inbound batch, at most one
    /// capture cycle.
    pub fn turn(&mut self, now: Instant) {
        let outcome = self.connection.tick(now);
        if outcome.became_ready {
            self.logger.log(&mut self.connection, "connected");
        }

        for message in &outcome.inbound {
            if self.router.handle(message, now) == RouteOutcome::CaptureRequested {
                self.logger.log(&mut self.connection, "capture requested");
            }
        }

        if self.router.take_request(now) {
            self.capture_and_send();
        }
    }

    fn capture_and_send(&mut self) {
        // A failed attempt still consumes an id
        self.image_counter += 1;
        let image_id = self.image_counter;

        let frame = match self.frames.capture() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(image_id, error = %e, "frame capture failed");
                self.feedback.emit(FeedbackPattern::Error);
                self.logger.log(&mut self.connection, "frame capture failed");
                return;
            }
        };

        let outcome = self.encoder.send(&mut self.connection, &frame, image_id);
        if outcome.completed {
            info!(
                image_id,
                chunks = outcome.total_chunks,
                size = frame.len(),
                "image published"
            );
            self.feedback.emit(FeedbackPattern::Success);
            self.logger
                .log(&mut self.connection, "image published (chunked)");
        } else {
            warn!(
                image_id,
                sent = outcome.sent_chunks,
                total = outcome.total_chunks,
                "image transfer aborted"
            );
            self.logger.log(&mut self.connection, "chunk publish failed");
        }
    }
}
