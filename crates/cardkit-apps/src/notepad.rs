//! A small multi-line text editor.
//!
//! Text is drawn at scale 2, which gives a 20x7 character grid on the
//! 240x135 screen. Typing past the last column, or joining two lines that
//! would not fit on one, flashes the right edge red instead of wrapping.

use cardkit_core::{App, AppContext, Color, Key, KeyEvent, Result, TimerId};

pub const COLS: usize = 20;
pub const ROWS: usize = 7;
const TEXT_SIZE: u8 = 2;
const CHAR_W: i32 = 12;
const CHAR_H: i32 = 18;
const EDGE_W: u32 = 4;
const FLASH_MS: u64 = 100;

const FLASH_END: TimerId = TimerId(1);

// ---------------------------------------------------------------------------
// Text buffer
// ---------------------------------------------------------------------------

/// Lines of printable ASCII plus a cursor.
///
/// The cursor row always indexes an existing line and the cursor column is
/// never past the end of that line. No line is longer than [`COLS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    lines: Vec<String>,
    row: usize,
    col: usize,
}

/// What an edit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Changed,
    /// The result would not fit in [`COLS`]; nothing changed.
    AtEdge,
    Unchanged,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            row: 0,
            col: 0,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// `(row, col)`.
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    pub fn insert(&mut self, c: char) -> Edit {
        if !(c.is_ascii_graphic() || c == ' ') {
            return Edit::Unchanged;
        }
        if self.col >= COLS {
            return Edit::AtEdge;
        }
        self.lines[self.row].insert(self.col, c);
        self.col += 1;
        Edit::Changed
    }

    /// Split the current line at the cursor.
    pub fn newline(&mut self) -> Edit {
        let rest = self.lines[self.row].split_off(self.col);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
        Edit::Changed
    }

    /// Delete before the cursor, joining with the previous line at column 0
    /// when the joined line fits.
    pub fn backspace(&mut self) -> Edit {
        if self.col > 0 {
            self.lines[self.row].remove(self.col - 1);
            self.col -= 1;
            Edit::Changed
        } else if self.row > 0 {
            if self.lines[self.row - 1].len() + self.lines[self.row].len() > COLS {
                return Edit::AtEdge;
            }
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.lines[self.row].len();
            self.lines[self.row].push_str(&line);
            Edit::Changed
        } else {
            Edit::Unchanged
        }
    }

    pub fn move_left(&mut self) -> Edit {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.lines[self.row].len();
        } else {
            return Edit::Unchanged;
        }
        Edit::Changed
    }

    pub fn move_right(&mut self) -> Edit {
        if self.col < self.lines[self.row].len() {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        } else {
            return Edit::Unchanged;
        }
        Edit::Changed
    }

    pub fn move_up(&mut self) -> Edit {
        if self.row == 0 {
            return Edit::Unchanged;
        }
        self.row -= 1;
        self.col = self.col.min(self.lines[self.row].len());
        Edit::Changed
    }

    pub fn move_down(&mut self) -> Edit {
        if self.row + 1 >= self.lines.len() {
            return Edit::Unchanged;
        }
        self.row += 1;
        self.col = self.col.min(self.lines[self.row].len());
        Edit::Changed
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// The editor. The buffer outlives each session, so text typed before
/// returning to the launcher is still there on the next launch.
pub struct Notepad {
    buffer: TextBuffer,
    /// First visible line.
    top: usize,
    /// Showing the help hint until the first key of a session.
    fresh: bool,
    flashing: bool,
}

impl Notepad {
    pub fn new() -> Self {
        Self {
            buffer: TextBuffer::new(),
            top: 0,
            fresh: true,
            flashing: false,
        }
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn is_flashing(&self) -> bool {
        self.flashing
    }

    fn scroll_to_cursor(&mut self) {
        let (row, _) = self.buffer.cursor();
        if row < self.top {
            self.top = row;
        } else if row >= self.top + ROWS {
            self.top = row + 1 - ROWS;
        }
    }

    fn edge(ctx: &mut AppContext<'_>, color: Color) -> Result<()> {
        let (w, h) = ctx.display.size();
        ctx.display
            .fill_rect(w as i32 - EDGE_W as i32, 0, EDGE_W, h, color)
    }

    fn flash_edge(&mut self, ctx: &mut AppContext<'_>) -> Result<()> {
        Self::edge(ctx, Color::RED)?;
        self.flashing = true;
        ctx.tasks.after(FLASH_MS, FLASH_END);
        Ok(())
    }
}

impl Default for Notepad {
    fn default() -> Self {
        Self::new()
    }
}

impl App for Notepad {
    fn name(&self) -> &str {
        "Notepad"
    }

    fn on_launch(&mut self, _ctx: &mut AppContext<'_>) -> Result<()> {
        self.fresh = true;
        self.flashing = false;
        log::info!("[notepad] started, ESC to exit");
        Ok(())
    }

    fn on_view(&mut self, ctx: &mut AppContext<'_>) -> Result<()> {
        ctx.display.clear(Color::BLACK)?;
        let visible = self.buffer.lines().iter().skip(self.top).take(ROWS);
        for (i, line) in visible.enumerate() {
            if line.is_empty() {
                continue;
            }
            let shown: String = line.chars().take(COLS).collect();
            ctx.display
                .draw_text(&shown, 0, i as i32 * CHAR_H, TEXT_SIZE, Color::WHITE)?;
        }

        let (row, col) = self.buffer.cursor();
        let x = col.min(COLS - 1) as i32 * CHAR_W;
        let y = (row - self.top) as i32 * CHAR_H + CHAR_H - 2;
        ctx.display
            .fill_rect(x, y, CHAR_W as u32, 2, Color::WHITE)?;

        if self.fresh {
            let (w, h) = ctx.display.size();
            let hint = "ESC=exit";
            let hint_w = ctx.display.text_width(hint, 1) as i32;
            ctx.display
                .draw_text(hint, w as i32 - hint_w - 2, h as i32 - 10, 1, Color::GRAY)?;
        }
        if self.flashing {
            Self::edge(ctx, Color::RED)?;
        }
        Ok(())
    }

    fn on_timer(&mut self, id: TimerId, ctx: &mut AppContext<'_>) -> Result<()> {
        if id == FLASH_END && self.flashing {
            self.flashing = false;
            Self::edge(ctx, Color::BLACK)?;
        }
        Ok(())
    }

    fn handle_key(&mut self, event: &mut KeyEvent, ctx: &mut AppContext<'_>) -> Result<()> {
        let edit = match event.key {
            Key::Escape => return Ok(()),
            Key::Enter => self.buffer.newline(),
            Key::Backspace => self.buffer.backspace(),
            Key::Left => self.buffer.move_left(),
            Key::Right => self.buffer.move_right(),
            Key::Up => self.buffer.move_up(),
            Key::Down => self.buffer.move_down(),
            Key::Char(c) => self.buffer.insert(c),
            Key::Delete | Key::Tab | Key::Unknown(_) => Edit::Unchanged,
        };
        event.mark_handled();

        if std::mem::take(&mut self.fresh) {
            ctx.request_redraw();
        }
        match edit {
            Edit::Changed => {
                self.scroll_to_cursor();
                ctx.request_redraw();
            },
            Edit::AtEdge => self.flash_edge(ctx)?,
            Edit::Unchanged => {},
        }
        Ok(())
    }
}
