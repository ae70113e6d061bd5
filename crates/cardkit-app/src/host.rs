//! Terminal host: a character-grid display on stdout, keys from stdin.

use std::collections::{BTreeSet, VecDeque};
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::{Duration, Instant};

use cardkit_core::backend::{GLYPH_H, GLYPH_W};
use cardkit_core::platform::KvStore;
use cardkit_core::{
    BufferId, CardkitError, Color, Devices, Display, Host, KeyEvent, Result, Speaker,
};

use crate::keys::parse_line;

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// Renders text into a grid of glyph-sized cells. Shapes only blank the
/// cells they cover; lines and buffers are not drawn.
pub struct TextDisplay {
    width: u32,
    height: u32,
    cells: Vec<Vec<char>>,
    dirty: bool,
    next_buffer: u32,
    buffers: BTreeSet<u32>,
    out: Box<dyn Write>,
}

impl TextDisplay {
    pub fn new(width: u32, height: u32, out: Box<dyn Write>) -> Self {
        let cols = (width / GLYPH_W) as usize;
        let rows = (height / GLYPH_H) as usize;
        Self {
            width,
            height,
            cells: vec![vec![' '; cols]; rows],
            dirty: true,
            next_buffer: 1,
            buffers: BTreeSet::new(),
            out,
        }
    }

    /// The grid as lines, trailing spaces trimmed.
    pub fn lines(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|row| row.iter().collect::<String>().trim_end().to_string())
            .collect()
    }

    fn cols(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    fn cell_of(x: i32, y: i32) -> (i64, i64) {
        (
            i64::from(x).div_euclid(i64::from(GLYPH_W)),
            i64::from(y).div_euclid(i64::from(GLYPH_H)),
        )
    }

    fn put(&mut self, col: i64, row: i64, c: char) {
        let (Ok(col), Ok(row)) = (usize::try_from(col), usize::try_from(row)) else {
            return;
        };
        if let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = c;
        }
    }

    fn check_buffer(&self, buf: BufferId) -> Result<()> {
        if self.buffers.contains(&buf.0) {
            Ok(())
        } else {
            Err(CardkitError::Backend(format!("unknown buffer {}", buf.0)))
        }
    }
}

impl Display for TextDisplay {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, _color: Color) -> Result<()> {
        for row in &mut self.cells {
            row.fill(' ');
        }
        self.dirty = true;
        Ok(())
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, _color: Color) -> Result<()> {
        // Underlines and borders are thinner than a glyph; skip them.
        if h < GLYPH_H {
            return Ok(());
        }
        let (c0, r0) = Self::cell_of(x, y);
        let (c1, r1) = Self::cell_of(x + w as i32 - 1, y + h as i32 - 1);
        for row in r0..=r1 {
            for col in c0..=c1 {
                self.put(col, row, ' ');
            }
        }
        self.dirty = true;
        Ok(())
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, size: u8, _color: Color) -> Result<()> {
        let (col, row) = Self::cell_of(x, y);
        let step = i64::from(size.max(1));
        for (i, c) in text.chars().enumerate() {
            let at = col + i as i64 * step;
            self.put(at, row, c);
            for pad in 1..step {
                self.put(at + pad, row, ' ');
            }
        }
        self.dirty = true;
        Ok(())
    }

    fn draw_line(&mut self, _x1: i32, _y1: i32, _x2: i32, _y2: i32, _color: Color) -> Result<()> {
        Ok(())
    }

    fn set_brightness(&mut self, level: u8) -> Result<()> {
        log::info!("[display] brightness {level}");
        Ok(())
    }

    fn alloc_buffer(&mut self, w: u32, h: u32) -> Result<BufferId> {
        let id = self.next_buffer;
        self.next_buffer += 1;
        self.buffers.insert(id);
        log::debug!("[display] buffer {id} ({w}x{h})");
        Ok(BufferId(id))
    }

    fn fill_buffer(
        &mut self,
        buf: BufferId,
        _x: i32,
        _y: i32,
        _w: u32,
        _h: u32,
        _color: Color,
    ) -> Result<()> {
        self.check_buffer(buf)
    }

    fn push_buffer(&mut self, buf: BufferId, _x: i32, _y: i32) -> Result<()> {
        self.check_buffer(buf)
    }

    fn free_buffer(&mut self, buf: BufferId) -> Result<()> {
        self.check_buffer(buf)?;
        self.buffers.remove(&buf.0);
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.dirty = false;
        let border = format!("+{}+", "-".repeat(self.cols()));
        let mut frame = String::new();
        frame.push_str(&border);
        frame.push('\n');
        for row in &self.cells {
            frame.push('|');
            frame.extend(row.iter());
            frame.push_str("|\n");
        }
        frame.push_str(&border);
        frame.push('\n');
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Speaker
// ---------------------------------------------------------------------------

/// Logs tones instead of playing them.
#[derive(Debug, Default)]
pub struct LogSpeaker {
    volume: u8,
}

impl Speaker for LogSpeaker {
    fn tone(&mut self, freq_hz: u32, duration_ms: u32) -> Result<()> {
        log::info!(
            "[speaker] tone {freq_hz} Hz for {duration_ms} ms at volume {}",
            self.volume
        );
        Ok(())
    }

    fn set_volume(&mut self, volume: u8) -> Result<()> {
        self.volume = volume.min(100);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// One message from the input thread.
pub enum Input {
    Keys(Vec<KeyEvent>),
    Quit,
}

pub struct TerminalHost {
    display: TextDisplay,
    speaker: LogSpeaker,
    storage: Box<dyn KvStore>,
    input: Receiver<Input>,
    pending: VecDeque<KeyEvent>,
    started: Instant,
    quit: bool,
}

impl TerminalHost {
    pub fn new(display: TextDisplay, storage: Box<dyn KvStore>, input: Receiver<Input>) -> Self {
        Self {
            display,
            speaker: LogSpeaker::default(),
            storage,
            input,
            pending: VecDeque::new(),
            started: Instant::now(),
            quit: false,
        }
    }

    /// Read stdin on a background thread. The thread ends at EOF or on a
    /// `quit` line.
    pub fn spawn_stdin_reader() -> Receiver<Input> {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                let msg = if line.trim() == "quit" {
                    Input::Quit
                } else {
                    Input::Keys(parse_line(&line))
                };
                let quit = matches!(msg, Input::Quit);
                if tx.send(msg).is_err() || quit {
                    return;
                }
            }
            let _ = tx.send(Input::Quit);
        });
        rx
    }
}

impl Host for TerminalHost {
    fn update(&mut self) -> Result<()> {
        loop {
            match self.input.try_recv() {
                Ok(Input::Keys(keys)) => self.pending.extend(keys),
                Ok(Input::Quit) | Err(TryRecvError::Disconnected) => {
                    self.quit = true;
                    break;
                },
                Err(TryRecvError::Empty) => break,
            }
        }
        Ok(())
    }

    fn poll_key(&mut self) -> Option<KeyEvent> {
        self.pending.pop_front()
    }

    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn sleep_ms(&mut self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }

    fn devices(&mut self) -> Devices<'_> {
        Devices {
            display: &mut self.display,
            speaker: &mut self.speaker,
            storage: self.storage.as_mut(),
        }
    }

    /// Quit once input has ended and every key it produced was delivered.
    fn should_quit(&self) -> bool {
        self.quit && self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardkit_core::Key;
    use cardkit_core::platform::MemoryStore;

    fn display() -> TextDisplay {
        TextDisplay::new(240, 135, Box::new(io::sink()))
    }

    #[test]
    fn grid_matches_glyph_size() {
        let d = display();
        assert_eq!(d.lines().len(), 15);
        assert_eq!(d.cols(), 40);
    }

    #[test]
    fn text_lands_in_its_cell() {
        let mut d = display();
        d.draw_text("hi", 12, 18, 1, Color::WHITE).unwrap();
        assert_eq!(d.lines()[2], "  hi");
    }

    #[test]
    fn scaled_text_is_spread_out() {
        let mut d = display();
        d.draw_text("ab", 0, 0, 2, Color::WHITE).unwrap();
        assert_eq!(d.lines()[0], "a b");
    }

    #[test]
    fn text_is_clipped_at_the_edges() {
        let mut d = display();
        d.draw_text("xyz", 234, 0, 1, Color::WHITE).unwrap();
        d.draw_text("neg", -6, 200, 1, Color::WHITE).unwrap();
        assert_eq!(d.lines()[0].trim(), "x");
    }

    #[test]
    fn tall_rects_blank_cells_thin_ones_do_not() {
        let mut d = display();
        d.draw_text("abcd", 0, 0, 1, Color::WHITE).unwrap();
        d.fill_rect(0, 7, 12, 2, Color::WHITE).unwrap();
        assert_eq!(d.lines()[0], "abcd");
        d.fill_rect(0, 0, 12, 9, Color::BLACK).unwrap();
        assert_eq!(d.lines()[0], "  cd");
    }

    #[test]
    fn buffers_must_be_allocated() {
        let mut d = display();
        assert!(d.push_buffer(BufferId(9), 0, 0).is_err());
        let buf = d.alloc_buffer(10, 10).unwrap();
        d.fill_buffer(buf, 0, 0, 1, 1, Color::RED).unwrap();
        d.free_buffer(buf).unwrap();
        assert!(d.free_buffer(buf).is_err());
    }

    #[test]
    fn host_drains_channel_and_quits_after_keys() {
        let (tx, rx) = mpsc::channel();
        let mut host = TerminalHost::new(display(), Box::new(MemoryStore::new()), rx);
        tx.send(Input::Keys(parse_line("a enter"))).unwrap();
        drop(tx);

        host.update().unwrap();
        assert!(!host.should_quit());
        assert_eq!(host.poll_key().map(|e| e.key), Some(Key::Char('a')));
        assert_eq!(host.poll_key().map(|e| e.key), Some(Key::Enter));
        assert!(host.poll_key().is_none());
        assert!(host.should_quit());
    }

    #[test]
    fn quit_message_stops_the_host() {
        let (tx, rx) = mpsc::channel();
        let mut host = TerminalHost::new(display(), Box::new(MemoryStore::new()), rx);
        tx.send(Input::Quit).unwrap();
        host.update().unwrap();
        assert!(host.should_quit());
    }
}
