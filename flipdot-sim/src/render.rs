//! Text rendering of the simulated dots.
//!
//! ```text
//!  -----------
//! |  ● ○ ○ ●  |
//! |  ○ ● ● ○  |
//!  -----------
//!  frame 12
//! ```
//!
//! Each dot is a two-character cell. The border is `2w + 3` dashes wide.

use std::io::{self, Stdout, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};

use flipdot_core::Canvas;

const ON: &str = " ●";
const OFF: &str = " ○";

/// Lines of one rendered frame: border, one line per row, border, footer.
pub fn render_lines(canvas: &Canvas, frames: u64) -> Vec<String> {
    let border = format!(" {}", "-".repeat(2 * canvas.width() as usize + 3));
    let mut lines = Vec::with_capacity(canvas.height() as usize + 3);
    lines.push(border.clone());
    for row in canvas.bits() {
        let cells: String = row.iter().map(|&on| if on { ON } else { OFF }).collect();
        lines.push(format!("| {cells}  |"));
    }
    lines.push(border);
    lines.push(format!(" frame {frames}"));
    lines
}

/// Full-screen terminal output.
///
/// Switches to the alternate screen on creation and restores the
/// terminal when dropped.
pub struct TerminalRenderer {
    out: Stdout,
}

impl TerminalRenderer {
    pub fn new() -> io::Result<Self> {
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        Ok(Self { out })
    }

    /// Draw one frame in place.
    pub fn draw(&mut self, canvas: &Canvas, frames: u64) -> io::Result<()> {
        for (row, line) in render_lines(canvas, frames).iter().enumerate() {
            queue!(self.out, MoveTo(0, row as u16), Print(line))?;
        }
        self.out.flush()
    }
}

impl Drop for TerminalRenderer {
    fn drop(&mut self) {
        let _ = execute!(self.out, Show, LeaveAlternateScreen);
    }
}

// ── Tests ────────────────────────────────────────────────────────
