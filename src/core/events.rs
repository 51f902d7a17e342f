//! Broadcast events emitted by the scanner and evaluator.
//!
//! Events are an asynchronous echo of the synchronous results: the scanner
//! emits one `ScanComplete` per scan and the evaluator emits one
//! `ThresholdAlert` per alert/warning determination, before the caller ever
//! touches the returned value. Listeners (the UI, the CLI watch loop, tests)
//! attach through the [`EventSink`] trait.

use std::fmt;

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;

/// Severity of a threshold determination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// A fractional warning band was met or exceeded.
    Warning,
    /// The hard threshold was met or exceeded.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// An event broadcast by the pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// A scan finished; summary counts and pre-formatted totals.
    ScanComplete {
        scan_path: String,
        file_count: usize,
        grouped_file_count: usize,
        total_size_formatted: String,
        grouped_total_size_formatted: String,
        detected_at: DateTime<Utc>,
    },
    /// A size met or exceeded the threshold or a warning band.
    ThresholdAlert {
        severity: Severity,
        message: String,
        detected_at: DateTime<Utc>,
    },
}

impl MonitorEvent {
    /// A `ThresholdAlert` stamped with the current time.
    #[must_use]
    pub fn threshold_alert(severity: Severity, message: impl Into<String>) -> Self {
        Self::ThresholdAlert {
            severity,
            message: message.into(),
            detected_at: Utc::now(),
        }
    }
}

/// Receives pipeline events. Implementations must tolerate emission from the
/// thread running the scan or evaluation.
pub trait EventSink: Send + Sync {
    /// Delivers one event. Must not block on slow consumers.
    fn emit(&self, event: MonitorEvent);
}

/// Discards every event. Used when no listener is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: MonitorEvent) {}
}

/// Forwards events into an unbounded crossbeam channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<MonitorEvent>,
}

impl ChannelSink {
    /// Creates a sink and the receiver drained by the listener.
    #[must_use]
    pub fn new() -> (Self, Receiver<MonitorEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: MonitorEvent) {
        // A gone listener is not the pipeline's problem.
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::{ChannelSink, EventSink, MonitorEvent, Severity};

    #[test]
    fn channel_sink_forwards_events() {
        let (sink, rx) = ChannelSink::new();
        sink.emit(MonitorEvent::threshold_alert(Severity::Error, "too big"));
        let event = rx.try_recv().expect("event should be queued");
        match event {
            MonitorEvent::ThresholdAlert {
                severity, message, ..
            } => {
                assert_eq!(severity, Severity::Error);
                assert_eq!(message, "too big");
            }
            MonitorEvent::ScanComplete { .. } => panic!("wrong event kind"),
        }
    }

    #[test]
    fn emit_after_receiver_dropped_is_silent() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.emit(MonitorEvent::threshold_alert(Severity::Warning, "ignored"));
    }

    #[test]
    fn severity_serializes_snake_case() {
        let json = serde_json::to_string(&Severity::Warning).expect("serialize");
        assert_eq!(json, "\"warning\"");
    }
}
