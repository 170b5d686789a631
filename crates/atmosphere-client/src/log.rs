//! Progress log sinks
//!
//! The client reports acquisition start, every retry and the final outcome as
//! one text line each. Where those lines go is up to the host.

use std::io::Write;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};

/// Receives one progress line at a time.
pub trait LogSink: Send + Sync {
    fn log(&self, line: &str);
}

/// Default sink: `<ISO-8601 UTC timestamp> | <line>` on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl StdoutSink {
    pub fn format_line(time: DateTime<Utc>, line: &str) -> String {
        format!(
            "{} | {line}",
            time.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

impl LogSink for StdoutSink {
    fn log(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", Self::format_line(Utc::now(), line));
    }
}

/// Forwards lines to `tracing` at info level, for hosts with a subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, line: &str) {
        tracing::info!(target: "atmosphere", "{line}");
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl LogSink for MemorySink {
    fn log(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stdout_line_is_iso_8601_prefixed() {
        let time = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            StdoutSink::format_line(time, "Acquiring environment"),
            "2025-03-04T05:06:07.000Z | Acquiring environment"
        );
    }

    #[test]
    fn memory_sink_keeps_lines_in_order() {
        let sink = MemorySink::new();
        sink.log("first");
        sink.log("second");
        assert_eq!(sink.lines(), vec!["first", "second"]);
    }

    #[test]
    fn sinks_do_not_panic() {
        StdoutSink.log("to stdout");
        TracingSink.log("to tracing without a subscriber");
    }
}
