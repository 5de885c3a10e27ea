use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use serde_json::json;
use thiserror::Error;

use crate::error::LayoutError;
use crate::geometry::Size;
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::LayoutMetrics;
use crate::registry::ComponentEvent;

use super::resize::{DEFAULT_DEBOUNCE, ResizeDebouncer};
use super::shared_state::SharedEngine;

const LOG_TARGET: &str = "permroom::driver";

pub type DriverResult<T> = std::result::Result<T, DriverError>;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
    #[error("terminal error: {0}")]
    Terminal(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration knobs for the terminal loop.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Quiet period before a resize burst is applied.
    pub debounce: Duration,
    /// Upper bound on how long the loop blocks waiting for input.
    pub tick_interval: Duration,
    /// Interval between metrics snapshot emissions. Zero disables snapshots.
    pub metrics_interval: Duration,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            tick_interval: Duration::from_millis(200),
            metrics_interval: Duration::from_secs(5),
            metrics_target: "permroom::metrics".to_string(),
        }
    }
}

/// Inputs understood by [`TerminalDriver::run_scripted`].
#[derive(Debug, Clone)]
pub enum DriverEvent {
    Resize(Size),
    Content { id: String, content: String },
    Component(ComponentEvent),
    /// Advance the virtual clock.
    Elapsed(Duration),
    Quit,
}

/// Event loop that owns the terminal surface: it feeds resizes through the
/// debouncer into the shared engine and writes composed frames.
pub struct TerminalDriver {
    engine: SharedEngine,
    config: DriverConfig,
    debouncer: ResizeDebouncer,
    logger: Option<Logger>,
    metrics: Option<Arc<Mutex<LayoutMetrics>>>,
    redraw_requested: bool,
    should_exit: bool,
    last_frame: Option<String>,
    frames_written: u64,
    started_at: Instant,
    last_metrics_emit: Option<Instant>,
}

impl TerminalDriver {
    pub fn new(engine: SharedEngine, config: DriverConfig) -> DriverResult<Self> {
        let (logger, metrics) = engine
            .read(|e| (e.config().logger.clone(), e.config().metrics_handle()))
            .map_err(LayoutError::from)?;
        Ok(Self {
            debouncer: ResizeDebouncer::new(config.debounce),
            engine,
            config,
            logger,
            metrics,
            redraw_requested: true,
            should_exit: false,
            last_frame: None,
            frames_written: 0,
            started_at: Instant::now(),
            last_metrics_emit: None,
        })
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    pub fn last_frame(&self) -> Option<&str> {
        self.last_frame.as_deref()
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Drive the real terminal until the user quits.
    pub fn run(mut self) -> DriverResult<()> {
        let mut stdout = io::stdout();
        enter(&mut stdout)?;
        let result = self.run_inner(&mut stdout);
        leave(&mut stdout);
        result
    }

    fn run_inner(&mut self, out: &mut impl Write) -> DriverResult<()> {
        let (width, height) = terminal::size()?;
        self.apply_resize(Size::new(width, height));
        self.started_at = Instant::now();
        self.log(
            LogLevel::Info,
            "driver_started",
            [
                json_kv("width", json!(width)),
                json_kv("height", json!(height)),
            ],
        );

        while !self.should_exit {
            let now = Instant::now();
            let timeout = self
                .debouncer
                .deadline()
                .map(|due| due.saturating_duration_since(now))
                .unwrap_or(self.config.tick_interval)
                .min(self.config.tick_interval);

            if event::poll(timeout)? {
                match event::read()? {
                    CrosstermEvent::Resize(width, height) => {
                        self.push_resize(Size::new(width, height), Instant::now());
                    }
                    CrosstermEvent::Key(key) if is_quit_key(&key) => {
                        self.should_exit = true;
                    }
                    _ => {}
                }
            }

            self.tick(out, Instant::now())?;
            self.maybe_emit_metrics();
        }

        self.log(
            LogLevel::Info,
            "driver_stopped",
            [json_kv("frames", json!(self.frames_written))],
        );
        Ok(())
    }

    /// Replay `events` against a virtual clock, writing frames to `out`.
    pub fn run_scripted<I>(&mut self, out: &mut impl Write, events: I) -> DriverResult<()>
    where
        I: IntoIterator<Item = DriverEvent>,
    {
        let mut now = Instant::now();
        self.tick(out, now)?;
        for event in events {
            match event {
                DriverEvent::Resize(size) => self.push_resize(size, now),
                DriverEvent::Content { id, content } => {
                    if self.engine.set_content(&id, content)? {
                        self.redraw_requested = true;
                    }
                }
                DriverEvent::Component(event) => {
                    let changed = self.engine.write(|e| e.broadcast(&event)).map_err(LayoutError::from)?;
                    if !changed.is_empty() {
                        self.redraw_requested = true;
                    }
                }
                DriverEvent::Elapsed(duration) => now += duration,
                DriverEvent::Quit => self.should_exit = true,
            }
            if self.should_exit {
                break;
            }
            self.tick(out, now)?;
        }
        Ok(())
    }

    fn push_resize(&mut self, size: Size, now: Instant) {
        self.with_metrics(LayoutMetrics::record_resize_event);
        self.debouncer.push(size, now);
    }

    fn tick(&mut self, out: &mut impl Write, now: Instant) -> DriverResult<()> {
        if let Some(size) = self.debouncer.poll(now) {
            self.apply_resize(size);
        }
        if self.redraw_requested {
            self.redraw_requested = false;
            self.draw(out)?;
        }
        Ok(())
    }

    /// A rejected size is logged and the previous frame stays on screen.
    fn apply_resize(&mut self, size: Size) {
        match self.engine.handle_resize(size) {
            Ok(changed) => {
                if changed {
                    self.redraw_requested = true;
                }
            }
            Err(err) => {
                self.log(
                    LogLevel::Error,
                    "resize_rejected",
                    [
                        json_kv("width", json!(size.width)),
                        json_kv("height", json!(size.height)),
                        json_kv("error", json!(err.to_string())),
                    ],
                );
                self.redraw_requested = true;
            }
        }
    }

    fn draw(&mut self, out: &mut impl Write) -> DriverResult<()> {
        let frame = self.engine.view()?;
        if self.last_frame.as_deref() == Some(frame.as_str()) {
            return Ok(());
        }

        queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
        for (row, line) in frame.split('\n').enumerate() {
            if !line.is_empty() {
                queue!(out, MoveTo(0, row as u16))?;
                out.write_all(line.as_bytes())?;
            }
        }
        out.flush()?;

        self.frames_written += 1;
        self.last_frame = Some(frame);
        Ok(())
    }

    fn maybe_emit_metrics(&mut self) {
        if self.config.metrics_interval.is_zero() {
            return;
        }
        let now = Instant::now();
        if let Some(last) = self.last_metrics_emit {
            if now.duration_since(last) < self.config.metrics_interval {
                return;
            }
        }
        self.last_metrics_emit = Some(now);

        if let (Some(logger), Some(metrics)) = (self.logger.as_ref(), self.metrics.as_ref()) {
            if let Ok(guard) = metrics.lock() {
                let event = guard
                    .snapshot(now.duration_since(self.started_at))
                    .to_log_event(&self.config.metrics_target);
                let _ = logger.log_event(event);
            }
        }
    }

    fn with_metrics(&self, update: impl FnOnce(&mut LayoutMetrics)) {
        if let Some(metrics) = self.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                update(&mut *guard);
            }
        }
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.logger.as_ref() {
            let _ = logger.log_event(event_with_fields(level, LOG_TARGET, message, fields));
        }
    }
}

fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

fn enter(stdout: &mut impl Write) -> DriverResult<()> {
    terminal::enable_raw_mode().map_err(|err| DriverError::Terminal(err.to_string()))?;
    execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
    Ok(())
}

fn leave(stdout: &mut impl Write) {
    execute!(stdout, Show, LeaveAlternateScreen).ok();
    terminal::disable_raw_mode().ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{Anchor, Constraint, ConstraintSet, SizeValue};
    use crate::engine::{EngineConfig, LayoutEngine};
    use crate::logging::MemorySink;

    fn fixed(rows: u16) -> ConstraintSet {
        ConstraintSet::new().with(Constraint::height(SizeValue::Fixed(rows)))
    }

    fn driver(sink: &MemorySink) -> TerminalDriver {
        let mut config = EngineConfig::default()
            .with_spacing(0)
            .with_logger(Logger::new(sink.clone()));
        config.enable_metrics();
        let engine = SharedEngine::new(LayoutEngine::new(config));
        engine.add_component("title", fixed(1)).unwrap();
        engine
            .add_component("footer", fixed(1).with(Constraint::Anchor(Anchor::Bottom)))
            .unwrap();
        engine.set_content("title", "Allowed tools").unwrap();
        engine.set_content("footer", "q quit").unwrap();

        let config = DriverConfig {
            debounce: Duration::from_millis(50),
            ..DriverConfig::default()
        };
        TerminalDriver::new(engine, config).unwrap()
    }

    #[test]
    fn resize_burst_triggers_single_recalculation() {
        let sink = MemorySink::new(64);
        let mut driver = driver(&sink);
        let mut out = Vec::new();

        driver
            .run_scripted(
                &mut out,
                [
                    DriverEvent::Resize(Size::new(60, 10)),
                    DriverEvent::Elapsed(Duration::from_millis(10)),
                    DriverEvent::Resize(Size::new(70, 12)),
                    DriverEvent::Elapsed(Duration::from_millis(10)),
                    DriverEvent::Resize(Size::new(80, 24)),
                    DriverEvent::Elapsed(Duration::from_millis(60)),
                ],
            )
            .unwrap();

        let snapshot = driver.engine().read(|e| e.metrics_snapshot()).unwrap().unwrap();
        assert_eq!(snapshot.resize_events, 3);
        assert_eq!(snapshot.resizes_applied, 1);
        assert_eq!(snapshot.recalculations, 1);
        assert_eq!(
            driver.engine().read(|e| e.terminal()).unwrap(),
            Some(Size::new(80, 24))
        );

        let frame = driver.last_frame().unwrap();
        let rows: Vec<&str> = frame.split('\n').collect();
        assert_eq!(rows.len(), 24);
        assert_eq!(rows[0], "Allowed tools");
        assert_eq!(rows[23], "q quit");
    }

    #[test]
    fn content_updates_redraw_and_duplicates_do_not() {
        let sink = MemorySink::new(64);
        let mut driver = driver(&sink);
        let mut out = Vec::new();

        driver
            .run_scripted(
                &mut out,
                [
                    DriverEvent::Resize(Size::new(40, 8)),
                    DriverEvent::Elapsed(Duration::from_millis(100)),
                    DriverEvent::Content {
                        id: "title".into(),
                        content: "Denied tools".into(),
                    },
                    DriverEvent::Content {
                        id: "title".into(),
                        content: "Denied tools".into(),
                    },
                ],
            )
            .unwrap();

        // Pre-layout stack, first laid-out frame, then the content change.
        assert_eq!(driver.frames_written(), 3);
        assert!(driver.last_frame().unwrap().starts_with("Denied tools"));
        let written = String::from_utf8(out).unwrap();
        assert!(written.contains("Denied tools"));
    }

    #[test]
    fn rejected_resize_keeps_previous_frame() {
        let sink = MemorySink::new(64);
        let mut driver = driver(&sink);
        let mut out = Vec::new();

        driver
            .run_scripted(
                &mut out,
                [
                    DriverEvent::Resize(Size::new(40, 8)),
                    DriverEvent::Elapsed(Duration::from_millis(100)),
                    DriverEvent::Resize(Size::new(5, 2)),
                    DriverEvent::Elapsed(Duration::from_millis(100)),
                ],
            )
            .unwrap();

        assert!(sink.messages().contains(&"resize_rejected".to_string()));
        let frame = driver.last_frame().unwrap();
        assert_eq!(frame.split('\n').count(), 8);
    }

    #[test]
    fn quit_stops_replay() {
        let sink = MemorySink::new(8);
        let mut driver = driver(&sink);
        let mut out = Vec::new();
        driver
            .run_scripted(
                &mut out,
                [
                    DriverEvent::Quit,
                    DriverEvent::Content {
                        id: "title".into(),
                        content: "never shown".into(),
                    },
                ],
            )
            .unwrap();
        assert!(!driver.last_frame().unwrap().contains("never shown"));
    }

    #[test]
    fn quit_keys() {
        let press = |code, modifiers| KeyEvent::new(code, modifiers);
        assert!(is_quit_key(&press(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit_key(&press(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit_key(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit_key(&press(KeyCode::Char('c'), KeyModifiers::NONE)));
    }
}
