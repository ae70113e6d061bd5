use cardkit_core::platform::KvStore;
use cardkit_core::{AppContext, Color, Key, Result};

use super::{CONTENT_Y, Tab, draw_gauge, draw_save_state, load_level, percent, save};

const KEY: &str = "volume";
const DEFAULT: i32 = 128;
const STEP: i32 = 15;
const CLICK: (u32, u32) = (880, 50);
const TEST_TONE: (u32, u32) = (440, 500);

/// Speaker volume with mute and a test tone.
#[derive(Debug)]
pub struct SoundTab {
    volume: i32,
    saved: i32,
    muted: bool,
}

impl SoundTab {
    pub fn load(storage: &dyn KvStore) -> Result<Self> {
        let volume = load_level(storage, KEY, DEFAULT)?;
        Ok(Self {
            volume,
            saved: volume,
            muted: false,
        })
    }

    pub fn volume(&self) -> i32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Push the effective volume to the speaker.
    fn apply(&self, ctx: &mut AppContext<'_>) -> Result<()> {
        let level = if self.muted {
            0
        } else {
            percent(self.volume) as u8
        };
        ctx.speaker.set_volume(level)
    }

    fn tone(&self, (freq, ms): (u32, u32), ctx: &mut AppContext<'_>) -> Result<()> {
        if self.muted {
            return Ok(());
        }
        ctx.speaker.tone(freq, ms)
    }

    fn adjust(&mut self, delta: i32, ctx: &mut AppContext<'_>) -> Result<()> {
        self.volume = (self.volume + delta).clamp(0, 255);
        self.apply(ctx)?;
        self.tone(CLICK, ctx)
    }
}

impl Tab for SoundTab {
    fn draw(&self, ctx: &mut AppContext<'_>) -> Result<()> {
        let (w, _) = ctx.display.size();
        ctx.display
            .draw_text("Volume", 10, CONTENT_Y + 5, 1, Color::CYAN)?;
        let (state, color) = if self.muted {
            ("[MUTED]", Color::YELLOW)
        } else {
            ("[ON]", Color::GREEN)
        };
        ctx.display.draw_text(state, 70, CONTENT_Y + 5, 1, color)?;
        let value = format!("{}%", percent(self.volume));
        let value_x = w as i32 - 10 - ctx.display.text_width(&value, 1) as i32;
        ctx.display
            .draw_text(&value, value_x, CONTENT_Y + 5, 1, Color::WHITE)?;

        let fill = if self.muted { Color::GRAY } else { Color::GREEN };
        draw_gauge(ctx, CONTENT_Y + 22, self.volume, fill)?;

        ctx.display.draw_text(
            "[,/] Adjust  [M] Mute  [T] Test",
            10,
            CONTENT_Y + 45,
            1,
            Color::GRAY,
        )?;
        ctx.display
            .draw_text("[S] Save", 10, CONTENT_Y + 60, 1, Color::GRAY)?;
        draw_save_state(ctx, self.volume != self.saved)
    }

    fn handle_key(&mut self, key: Key, ctx: &mut AppContext<'_>) -> Result<bool> {
        match key {
            k if k.is_nav_left() => self.adjust(-STEP, ctx)?,
            k if k.is_nav_right() => self.adjust(STEP, ctx)?,
            Key::Char('m' | 'M') => {
                self.muted = !self.muted;
                log::info!("[settings] muted: {}", self.muted);
                self.apply(ctx)?;
            },
            Key::Char('t' | 'T') => self.tone(TEST_TONE, ctx)?,
            Key::Char('s' | 'S') => {
                save(ctx, KEY, self.volume)?;
                self.saved = self.volume;
            },
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{NAMESPACE, SettingsApp, TabId};
    use super::*;
    use crate::test_util::Harness;

    fn on_sound_tab() -> Harness<SettingsApp> {
        let mut h = Harness::new(SettingsApp::new());
        h.start();
        h.press(Key::Tab);
        assert_eq!(h.app.current(), TabId::Sound);
        h
    }

    #[test]
    fn adjust_sets_volume_and_clicks() {
        let mut h = on_sound_tab();
        h.press(Key::Char('/'));
        assert_eq!(h.host.speaker.volume, Some(56));
        assert_eq!(h.host.speaker.tones, vec![CLICK]);
        assert!(h.host.display.screen_contains("56%"));
        assert!(h.host.display.screen_contains("Unsaved"));
    }

    #[test]
    fn mute_silences_everything() {
        let mut h = on_sound_tab();
        h.press(Key::Char('m'));
        assert_eq!(h.host.speaker.volume, Some(0));
        assert!(h.host.display.screen_contains("[MUTED]"));

        h.press(Key::Char('/'));
        h.press(Key::Char('t'));
        assert!(h.host.speaker.tones.is_empty());
        assert_eq!(h.host.speaker.volume, Some(0));

        h.press(Key::Char('M'));
        assert_eq!(h.host.speaker.volume, Some(56));
    }

    #[test]
    fn test_tone() {
        let mut h = on_sound_tab();
        h.press(Key::Char('t'));
        assert_eq!(h.host.speaker.tones, vec![TEST_TONE]);
    }

    #[test]
    fn save_persists_volume() {
        let mut h = on_sound_tab();
        h.press(Key::Char(','));
        h.press(Key::Char('S'));
        assert_eq!(h.host.storage.get_i32(NAMESPACE, KEY).unwrap(), Some(113));
        assert!(h.host.display.screen_contains("  Saved"));
    }

    #[test]
    fn stored_volume_is_loaded() {
        let mut h = Harness::new(SettingsApp::new());
        h.host.storage.set_i32(NAMESPACE, KEY, 255).unwrap();
        h.start();
        h.press(Key::Tab);
        assert!(h.host.display.screen_contains("100%"));
    }
}
