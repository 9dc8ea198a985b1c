//! Sensory feedback cues.
//!
//! Engines describe what happened as [`Cue`] values and hand them to a
//! [`FeedbackSink`]. How a cue sounds or vibrates is the sink's business;
//! whether it succeeded is of no interest to the engine.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::FeedbackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cue {
    /// A run began.
    Start,
    /// Final seconds before a phase boundary.
    Warning,
    /// Work/rest boundary crossed.
    PhaseSwitch,
    /// The run finished.
    Complete,
}

impl Cue {
    pub fn label(&self) -> &'static str {
        match self {
            Cue::Start => "start",
            Cue::Warning => "warning",
            Cue::PhaseSwitch => "phaseSwitch",
            Cue::Complete => "complete",
        }
    }
}

/// Receiver of feedback cues.
///
/// Must not block: `emit` is called from the tick path.
pub trait FeedbackSink: Send + Sync {
    fn emit(&self, cue: Cue) -> Result<(), FeedbackError>;
}

/// Discards every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FeedbackSink for NullSink {
    fn emit(&self, _cue: Cue) -> Result<(), FeedbackError> {
        Ok(())
    }
}

/// Forwards cues over an unbounded channel to a renderer task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Cue>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Cue>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl FeedbackSink for ChannelSink {
    fn emit(&self, cue: Cue) -> Result<(), FeedbackError> {
        self.tx.send(cue).map_err(|_| FeedbackError::Closed)
    }
}

/// Keeps every cue in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    cues: Mutex<Vec<Cue>>,
}

impl RecordingSink {
    pub fn cues(&self) -> Vec<Cue> {
        self.cues.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn count(&self, cue: Cue) -> usize {
        self.cues().iter().filter(|c| **c == cue).count()
    }
}

impl FeedbackSink for RecordingSink {
    fn emit(&self, cue: Cue) -> Result<(), FeedbackError> {
        if let Ok(mut cues) = self.cues.lock() {
            cues.push(cue);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cue_serializes_as_camel_case_tag() {
        let json = serde_json::to_string(&Cue::PhaseSwitch).unwrap();
        assert_eq!(json, "\"phaseSwitch\"");
        assert_eq!(Cue::PhaseSwitch.label(), "phaseSwitch");
    }

    #[test]
    fn channel_sink_reports_closed_receiver() {
        let (sink, rx) = ChannelSink::new();
        assert!(sink.emit(Cue::Start).is_ok());
        drop(rx);
        assert!(matches!(sink.emit(Cue::Warning), Err(FeedbackError::Closed)));
    }

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingSink::default();
        sink.emit(Cue::Start).unwrap();
        sink.emit(Cue::Warning).unwrap();
        sink.emit(Cue::Complete).unwrap();
        assert_eq!(sink.cues(), vec![Cue::Start, Cue::Warning, Cue::Complete]);
        assert_eq!(sink.count(Cue::Warning), 1);
    }
}
