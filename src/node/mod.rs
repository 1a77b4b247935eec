//! Node control loops and their supporting state.

pub mod cam;
pub mod frame;
pub mod logger;
pub mod router;
pub mod trigger;
pub mod wake;

pub use cam::CamNode;
pub use frame::{FileFrameSource, FrameSource, MockFrameSource};
pub use logger::ActivityLogger;
pub use router::SignalRouter;
pub use trigger::TriggerLatch;
pub use wake::WakeNode;
