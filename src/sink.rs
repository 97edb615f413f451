//! Destinations for analysis feedback
//!
//! The pipeline only ever calls [`ResultSink::deliver`]. Anything that has to
//! happen on a particular thread (a UI loop, a terminal renderer) is the sink's
//! business, not the pipeline's.

use std::sync::Arc;

use arc_swap::ArcSwap;
use flume::{Receiver, Sender};
use tracing::{debug, info};

/// Prompt shown before the first analysis result arrives
pub const INITIAL_FEEDBACK: &str = "Face the camera, please";

pub trait ResultSink: Send + Sync {
    fn deliver(&self, feedback: &str);
}

/// Latest-value display surface. Every delivery replaces the shown text.
pub struct FeedbackBoard {
    current: ArcSwap<String>,
}

impl FeedbackBoard {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial.into()),
        }
    }

    pub fn current(&self) -> Arc<String> {
        self.current.load_full()
    }
}

impl Default for FeedbackBoard {
    fn default() -> Self {
        Self::new(INITIAL_FEEDBACK)
    }
}

impl ResultSink for FeedbackBoard {
    fn deliver(&self, feedback: &str) {
        self.current.store(Arc::new(feedback.to_owned()));
    }
}

/// Hands feedback to whichever context owns the display.
#[derive(Clone)]
pub struct ChannelSink {
    tx: Sender<String>,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<String>) {
        let (tx, rx) = flume::unbounded();
        (Self { tx }, rx)
    }
}

impl ResultSink for ChannelSink {
    fn deliver(&self, feedback: &str) {
        if self.tx.send(feedback.to_owned()).is_err() {
            debug!("Display gone, dropping feedback");
        }
    }
}

pub struct TracingSink;

impl ResultSink for TracingSink {
    fn deliver(&self, feedback: &str) {
        info!(feedback, "Pose feedback");
    }
}

/// Delivers to every inner sink in order.
pub struct FanoutSink {
    sinks: Vec<Arc<dyn ResultSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn ResultSink>>) -> Self {
        Self { sinks }
    }
}

impl ResultSink for FanoutSink {
    fn deliver(&self, feedback: &str) {
        for sink in &self.sinks {
            sink.deliver(feedback);
        }
    }
}
