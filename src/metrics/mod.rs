use crate::logging::{LogEvent, LogFields, LogLevel};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct LayoutMetrics {
    recalculations: u64,
    failures: u64,
    warnings: u64,
    frames: u64,
    resize_events: u64,
    resizes_applied: u64,
}

impl LayoutMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_recalculation(&mut self, warning_count: usize) {
        self.recalculations = self.recalculations.saturating_add(1);
        self.warnings = self.warnings.saturating_add(warning_count as u64);
    }

    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
    }

    pub fn record_frame(&mut self) {
        self.frames = self.frames.saturating_add(1);
    }

    pub fn record_resize_event(&mut self) {
        self.resize_events = self.resize_events.saturating_add(1);
    }

    pub fn record_resize_applied(&mut self) {
        self.resizes_applied = self.resizes_applied.saturating_add(1);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            recalculations: self.recalculations,
            failures: self.failures,
            warnings: self.warnings,
            frames: self.frames,
            resize_events: self.resize_events,
            resizes_applied: self.resizes_applied,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub recalculations: u64,
    pub failures: u64,
    pub warnings: u64,
    pub frames: u64,
    pub resize_events: u64,
    pub resizes_applied: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "layout_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("recalculations".to_string(), json!(self.recalculations));
        map.insert("failures".to_string(), json!(self.failures));
        map.insert("warnings".to_string(), json!(self.warnings));
        map.insert("frames".to_string(), json!(self.frames));
        map.insert("resize_events".to_string(), json!(self.resize_events));
        map.insert("resizes_applied".to_string(), json!(self.resizes_applied));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let mut metrics = LayoutMetrics::new();
        metrics.record_recalculation(2);
        metrics.record_recalculation(0);
        metrics.record_failure();
        metrics.record_resize_event();
        metrics.record_resize_event();
        metrics.record_resize_applied();

        let snapshot = metrics.snapshot(Duration::from_millis(1500));
        assert_eq!(snapshot.recalculations, 2);
        assert_eq!(snapshot.warnings, 2);
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.resize_events, 2);
        assert_eq!(snapshot.resizes_applied, 1);

        let event = snapshot.to_log_event("permroom::metrics");
        assert_eq!(event.message, "layout_metrics");
        assert_eq!(event.fields["uptime_ms"], json!(1500));
    }
}
