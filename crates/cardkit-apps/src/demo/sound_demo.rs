//! A one-octave keyboard on the speaker.
//!
//! Number keys play the C major scale, `,`/`/` move it up and down by
//! octaves, and `S` plays the whole scale through a one-shot timer chain.

use cardkit_core::{App, AppContext, Color, Key, KeyEvent, Result, TimerId};

/// `(name, octave, Hz)` for keys `1` to `8`.
const NOTES: [(&str, u32, u32); 8] = [
    ("C", 4, 262),
    ("D", 4, 294),
    ("E", 4, 330),
    ("F", 4, 349),
    ("G", 4, 392),
    ("A", 4, 440),
    ("B", 4, 494),
    ("C", 5, 523),
];

pub const NOTE_MS: u32 = 180;
/// Gap between the starts of two scale notes.
pub const STEP_MS: u64 = 200;
pub const MAX_SHIFT: u32 = 2;
const NEXT_NOTE: TimerId = TimerId(1);

const X: i32 = 10;

pub struct SoundDemo {
    shift: u32,
    last: Option<usize>,
    /// Index of the next scale note while the scale is playing.
    scale: Option<usize>,
}

impl SoundDemo {
    pub fn new() -> Self {
        Self {
            shift: 0,
            last: None,
            scale: None,
        }
    }

    /// Octaves above the base scale.
    pub fn shift(&self) -> u32 {
        self.shift
    }

    pub fn is_playing_scale(&self) -> bool {
        self.scale.is_some()
    }

    pub fn freq(&self, note: usize) -> u32 {
        NOTES[note].2 << self.shift
    }

    fn label(&self, note: usize) -> String {
        let (name, octave, _) = NOTES[note];
        format!("{name}{} {} Hz", octave + self.shift, self.freq(note))
    }

    fn play(&mut self, note: usize, ctx: &mut AppContext<'_>) -> Result<()> {
        self.last = Some(note);
        log::debug!("[sound_demo] {}", self.label(note));
        ctx.speaker.tone(self.freq(note), NOTE_MS)
    }

    fn stop_scale(&mut self, ctx: &mut AppContext<'_>) {
        if self.scale.take().is_some() {
            ctx.tasks.cancel(NEXT_NOTE);
        }
    }
}

impl Default for SoundDemo {
    fn default() -> Self {
        Self::new()
    }
}

impl App for SoundDemo {
    fn name(&self) -> &str {
        "Sound Demo"
    }

    fn on_view(&mut self, ctx: &mut AppContext<'_>) -> Result<()> {
        let (w, h) = ctx.display.size();
        ctx.display.clear(Color::BLACK)?;
        ctx.display
            .draw_text_centered("Sound Demo", (w / 2) as i32, 4, 1, Color::CYAN)?;
        ctx.display
            .draw_line(0, 16, w as i32, 16, Color::DARK_GRAY)?;

        let octave = format!("Octave: {}", 4 + self.shift);
        ctx.display.draw_text(&octave, X, 26, 1, Color::WHITE)?;
        let last = self.last.map_or_else(|| "--".to_string(), |n| self.label(n));
        ctx.display.draw_text("Last:", X, 44, 1, Color::GRAY)?;
        ctx.display.draw_text(&last, X + 40, 44, 1, Color::GREEN)?;
        if self.scale.is_some() {
            ctx.display
                .draw_text("Playing scale...", X, 62, 1, Color::YELLOW)?;
        }

        ctx.display
            .draw_text("1-8=Note  ,/=Octave", X, h as i32 - 24, 1, Color::GRAY)?;
        ctx.display
            .draw_text("S=Scale  ESC=Exit", X, h as i32 - 12, 1, Color::GRAY)
    }

    fn handle_key(&mut self, event: &mut KeyEvent, ctx: &mut AppContext<'_>) -> Result<()> {
        match event.key {
            Key::Char(c @ '1'..='8') => {
                self.stop_scale(ctx);
                self.play(c as usize - '1' as usize, ctx)?;
            },
            k if k.is_nav_left() => self.shift = self.shift.saturating_sub(1),
            k if k.is_nav_right() => self.shift = (self.shift + 1).min(MAX_SHIFT),
            Key::Char('s' | 'S') => {
                self.play(0, ctx)?;
                self.scale = Some(1);
                ctx.tasks.after(STEP_MS, NEXT_NOTE);
            },
            _ => return Ok(()),
        }
        event.mark_handled();
        ctx.request_redraw();
        Ok(())
    }

    fn on_timer(&mut self, id: TimerId, ctx: &mut AppContext<'_>) -> Result<()> {
        let Some(note) = self.scale.filter(|_| id == NEXT_NOTE) else {
            return Ok(());
        };
        self.play(note, ctx)?;
        if note + 1 < NOTES.len() {
            self.scale = Some(note + 1);
            ctx.tasks.after(STEP_MS, NEXT_NOTE);
        } else {
            self.scale = None;
        }
        self.on_view(ctx)
    }

    fn on_exit(&mut self, ctx: &mut AppContext<'_>) -> Result<()> {
        self.stop_scale(ctx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::Harness;

    fn started() -> Harness<SoundDemo> {
        let mut h = Harness::new(SoundDemo::new());
        h.start();
        h
    }

    #[test]
    fn number_keys_play_notes() {
        let mut h = started();
        assert!(h.host.display.screen_contains("--"));
        let (event, _) = h.press(Key::Char('6'));
        assert!(event.is_handled());
        assert_eq!(h.host.speaker.tones, vec![(440, NOTE_MS)]);
        assert!(h.host.display.screen_contains("A4 440 Hz"));
    }

    #[test]
    fn octave_shift_is_clamped() {
        let mut h = started();
        for _ in 0..5 {
            h.press(Key::Char('/'));
        }
        assert_eq!(h.app.shift(), MAX_SHIFT);
        assert!(h.host.display.screen_contains("Octave: 6"));
        h.press(Key::Char('1'));
        assert_eq!(h.host.speaker.tones, vec![(262 * 4, NOTE_MS)]);

        for _ in 0..5 {
            h.press(Key::Left);
        }
        assert_eq!(h.app.shift(), 0);
        h.press(Key::Char('8'));
        assert_eq!(h.host.speaker.tones.last(), Some(&(523, NOTE_MS)));
    }

    #[test]
    fn scale_plays_one_note_per_step() {
        let mut h = started();
        h.press(Key::Char('s'));
        assert!(h.app.is_playing_scale());
        assert_eq!(h.host.speaker.tones.len(), 1);

        h.advance(STEP_MS - 1);
        assert_eq!(h.host.speaker.tones.len(), 1);
        for _ in 0..7 {
            h.advance(STEP_MS);
        }
        let freqs: Vec<u32> = h.host.speaker.tones.iter().map(|(f, _)| *f).collect();
        assert_eq!(freqs, NOTES.map(|(_, _, hz)| hz).to_vec());
        assert!(!h.app.is_playing_scale());
        assert!(h.tasks.is_empty());
        assert!(h.host.display.screen_contains("C5 523 Hz"));
    }

    #[test]
    fn note_key_interrupts_scale() {
        let mut h = started();
        h.press(Key::Char('s'));
        h.press(Key::Char('3'));
        assert!(!h.app.is_playing_scale());
        assert!(!h.tasks.is_scheduled(NEXT_NOTE));
        h.advance(STEP_MS * 3);
        assert_eq!(h.host.speaker.tones, vec![(262, NOTE_MS), (330, NOTE_MS)]);
    }

    #[test]
    fn exit_stops_scale() {
        let mut h = started();
        h.press(Key::Char('S'));
        h.stop();
        assert!(!h.app.is_playing_scale());
        h.start();
        h.advance(STEP_MS * 2);
        assert_eq!(h.host.speaker.tones.len(), 1);
    }

    #[test]
    fn other_keys_are_left_unhandled() {
        let mut h = started();
        let (event, _) = h.press(Key::Escape);
        assert!(!event.is_handled());
        let (event, _) = h.press(Key::Char('q'));
        assert!(!event.is_handled());
        assert!(h.host.speaker.tones.is_empty());
    }
}
