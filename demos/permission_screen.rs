//! Interactive permission screen: a header, a flexible tool list, a detail
//! pane to its right and a footer pinned to the bottom row.
//!
//! Resize the terminal to watch the layout reflow; press `q` or `Esc` to
//! quit. Set `PERMROOM_LOG=path` to capture JSON-lines logs.

use std::env;

use permroom::logging::FileSink;
use permroom::{
    Anchor, ComponentEvent, Constraint, ConstraintSet, DriverConfig, DriverError, EngineConfig,
    LayoutEngine, Logger, SharedEngine, SizeValue, Spacing, TerminalDriver, Widget,
};

const TOOLS: &[(&str, bool)] = &[
    ("Read", true),
    ("Edit", true),
    ("Bash(git status)", true),
    ("Bash(rm -rf)", false),
    ("WebFetch", false),
    ("Write", true),
];

/// Renders the tool table, truncating to however many rows it was given.
struct ToolList {
    rows: u16,
    width: u16,
}

impl Widget for ToolList {
    fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.rows = height;
    }

    fn render(&self) -> String {
        let name_width = usize::from(self.width).saturating_sub(10);
        TOOLS
            .iter()
            .take(usize::from(self.rows))
            .map(|(name, allowed)| {
                let badge = if *allowed {
                    "\u{1b}[32mallow\u{1b}[0m"
                } else {
                    "\u{1b}[31mdeny \u{1b}[0m"
                };
                format!("{name:<name_width$} {badge}")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn update(&mut self, event: &ComponentEvent) -> bool {
        matches!(event, ComponentEvent::Resized(_))
    }
}

fn main() -> Result<(), DriverError> {
    let mut config = EngineConfig::default();
    if let Ok(path) = env::var("PERMROOM_LOG") {
        let sink = FileSink::new(path, 1024 * 1024)
            .map_err(|err| DriverError::Terminal(err.to_string()))?;
        config = config.with_logger(Logger::new(sink));
        config.enable_metrics();
    }

    let mut engine = LayoutEngine::new(config);
    engine.add_component(
        "header",
        ConstraintSet::new()
            .with(Constraint::height(SizeValue::Fixed(2)))
            .with(Constraint::margin(Spacing::symmetric(0, 1))),
    )?;
    engine.add_widget(
        "tools",
        ConstraintSet::new()
            .with(Constraint::height(SizeValue::Flex(1.0)))
            .with(Constraint::width(SizeValue::Fixed(40)))
            .with(Constraint::min_height(3))
            .with(Constraint::below("header", 0)),
        ToolList { rows: 0, width: 0 },
    )?;
    engine.add_component(
        "detail",
        ConstraintSet::new()
            .with(Constraint::height(SizeValue::Fixed(6)))
            .with(Constraint::max_width(40))
            .with(Constraint::right_of("tools", 2)),
    )?;
    engine.add_component(
        "footer",
        ConstraintSet::new()
            .with(Constraint::height(SizeValue::Fixed(1)))
            .with(Constraint::Anchor(Anchor::Bottom)),
    )?;

    engine.set_content("header", "\u{1b}[1mTool permissions\u{1b}[0m\nproject: ~/crate")?;
    engine.set_content(
        "detail",
        "Bash(rm -rf)\n\nDenied by project policy.\nAsk before running destructive\ncommands.",
    )?;
    engine.set_content("footer", " q quit   resize to reflow")?;

    let driver = TerminalDriver::new(SharedEngine::new(engine), DriverConfig::default())?;
    driver.run()
}
