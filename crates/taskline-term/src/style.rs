//! Pure glyph and color mappings. These are free functions of the task
//! state, not methods on the renderer, so tests can exercise them (and
//! callers can substitute them) without a terminal.

use owo_colors::Style;
use taskline_core::Verbosity;

pub const DEFAULT_SPINNER_FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

pub const GLYPH_DONE: &str = "✔";
pub const GLYPH_FAILED: &str = "✘";

/// Default per-level color scheme.
pub fn level_style(level: Verbosity) -> Style {
    match level {
        Verbosity::Error => Style::new().red(),
        Verbosity::Warning => Style::new().yellow(),
        Verbosity::Info => Style::new().white(),
        Verbosity::Debug => Style::new().green(),
        Verbosity::Trace => Style::new().cyan(),
    }
}

/// Status glyph for a task: ✘ once the error flag is set, ✔ when complete,
/// otherwise the current spinner frame.
pub fn status_glyph<'a>(
    err: bool,
    complete: bool,
    spinner_frame: &'a str,
) -> (&'a str, Option<Style>) {
    if err {
        (GLYPH_FAILED, Some(Style::new().red()))
    } else if complete {
        (GLYPH_DONE, Some(Style::new().green()))
    } else {
        (spinner_frame, None)
    }
}

/// Applies `style` to `text` iff styling is enabled (it is not for non-tty
/// sinks and raw-output mode).
pub fn paint(text: &str, style: Option<Style>, enabled: bool) -> String {
    match style {
        Some(style) if enabled => style.style(text).to_string(),
        _ => text.to_string(),
    }
}
