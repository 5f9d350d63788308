//! The two terminal primitives the renderer needs: erase-upwards over an
//! arbitrary byte sink, and a dimensions probe. Everything else about the
//! terminal stays out of this crate.

use std::io::{self, Write};

use crossterm::QueueableCommand;
use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::terminal::{Clear, ClearType};
use terminal_size::{Height, Width, terminal_size};

/// Queues the escape sequence that moves the cursor up `lines` rows,
/// clearing each one, and parks it at column zero. Nothing is flushed.
pub fn clear_lines_up<W: Write>(sink: &mut W, lines: usize) -> io::Result<()> {
    for _ in 0..lines {
        sink.queue(MoveUp(1))?;
        sink.queue(Clear(ClearType::CurrentLine))?;
    }
    sink.queue(MoveToColumn(0))?;
    Ok(())
}

/// Current terminal dimensions as (columns, rows), if one is attached.
pub fn probe_size() -> Option<(u16, u16)> {
    terminal_size().map(|(Width(w), Height(h))| (w, h))
}
