use cardkit_core::platform::KvStore;
use cardkit_core::{AppContext, Color, Key, Result};

use super::{CONTENT_Y, Tab, draw_gauge, draw_save_state, load_level, percent, save};

const KEY: &str = "brightness";
const DEFAULT: i32 = 128;
const STEP: i32 = 15;

/// Backlight level with presets and a screen-off shortcut.
#[derive(Debug)]
pub struct DisplayTab {
    brightness: i32,
    saved: i32,
    /// Backlight forced off; the next key turns it back on.
    off: bool,
}

impl DisplayTab {
    pub fn load(storage: &dyn KvStore) -> Result<Self> {
        let brightness = load_level(storage, KEY, DEFAULT)?;
        Ok(Self {
            brightness,
            saved: brightness,
            off: false,
        })
    }

    pub fn brightness(&self) -> i32 {
        self.brightness
    }

    fn apply(&mut self, value: i32, ctx: &mut AppContext<'_>) -> Result<()> {
        self.brightness = value.clamp(0, 255);
        ctx.display.set_brightness(self.brightness as u8)
    }
}

impl Tab for DisplayTab {
    fn draw(&self, ctx: &mut AppContext<'_>) -> Result<()> {
        let (w, _) = ctx.display.size();
        ctx.display
            .draw_text("Brightness", 10, CONTENT_Y + 5, 1, Color::CYAN)?;
        let value = format!("{}%", percent(self.brightness));
        let value_x = w as i32 - 10 - ctx.display.text_width(&value, 1) as i32;
        ctx.display
            .draw_text(&value, value_x, CONTENT_Y + 5, 1, Color::WHITE)?;
        draw_gauge(ctx, CONTENT_Y + 22, self.brightness, Color::GREEN)?;

        ctx.display
            .draw_text("Presets:", 10, CONTENT_Y + 45, 1, Color::GRAY)?;
        ctx.display.draw_text(
            "[1]25% [2]50% [3]75% [4]100%",
            60,
            CONTENT_Y + 45,
            1,
            Color::WHITE,
        )?;
        ctx.display.draw_text(
            "[,/] Adjust  [S] Save  [0] Off",
            10,
            CONTENT_Y + 60,
            1,
            Color::GRAY,
        )?;
        draw_save_state(ctx, self.brightness != self.saved)
    }

    fn handle_key(&mut self, key: Key, ctx: &mut AppContext<'_>) -> Result<bool> {
        if self.off {
            self.off = false;
            let restore = if self.brightness > 0 {
                self.brightness
            } else {
                DEFAULT
            };
            self.apply(restore, ctx)?;
            return Ok(true);
        }
        match key {
            k if k.is_nav_left() => self.apply(self.brightness - STEP, ctx)?,
            k if k.is_nav_right() => self.apply(self.brightness + STEP, ctx)?,
            Key::Char('1') => self.apply(64, ctx)?,
            Key::Char('2') => self.apply(128, ctx)?,
            Key::Char('3') => self.apply(191, ctx)?,
            Key::Char('4') => self.apply(255, ctx)?,
            Key::Char('0') => {
                log::info!("[settings] screen off");
                self.off = true;
                ctx.display.set_brightness(0)?;
            },
            Key::Char('s' | 'S') => {
                save(ctx, KEY, self.brightness)?;
                self.saved = self.brightness;
            },
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{NAMESPACE, SettingsApp};
    use super::*;
    use crate::test_util::Harness;

    fn started() -> Harness<SettingsApp> {
        let mut h = Harness::new(SettingsApp::new());
        h.start();
        h
    }

    #[test]
    fn defaults_to_half() {
        let h = started();
        assert!(h.host.display.screen_contains("50%"));
        assert!(h.host.display.screen_contains("Saved"));
    }

    #[test]
    fn adjust_applies_and_marks_dirty() {
        let mut h = started();
        h.press(Key::Char('/'));
        assert_eq!(h.host.display.last_brightness(), Some(143));
        assert!(h.host.display.screen_contains("56%"));
        assert!(h.host.display.screen_contains("Unsaved"));

        h.press(Key::Left);
        h.press(Key::Left);
        assert_eq!(h.host.display.last_brightness(), Some(113));
    }

    #[test]
    fn adjust_clamps() {
        let mut h = started();
        h.press(Key::Char('4'));
        h.press(Key::Char('/'));
        assert_eq!(h.host.display.last_brightness(), Some(255));
        assert!(h.host.display.screen_contains("100%"));
    }

    #[test]
    fn save_persists_and_commits() {
        let mut h = started();
        h.press(Key::Char('1'));
        h.press(Key::Char('s'));
        assert_eq!(h.host.storage.get_i32(NAMESPACE, KEY).unwrap(), Some(64));
        assert!(h.host.display.screen_contains("  Saved"));
    }

    #[test]
    fn stored_value_is_loaded() {
        let mut h = Harness::new(SettingsApp::new());
        h.host.storage.set_i32(NAMESPACE, KEY, 200).unwrap();
        h.start();
        assert!(h.host.display.screen_contains("78%"));
        assert!(h.host.display.screen_contains("Saved"));
    }

    #[test]
    fn screen_off_until_next_key() {
        let mut h = started();
        h.press(Key::Char('0'));
        assert_eq!(h.host.display.last_brightness(), Some(0));

        let (event, _) = h.press(Key::Char('4'));
        assert!(event.is_handled());
        // The key only wakes the screen.
        assert_eq!(h.host.display.last_brightness(), Some(128));
    }

    #[test]
    fn unknown_keys_are_not_used() {
        let mut storage = cardkit_core::platform::MemoryStore::new();
        let mut tab = DisplayTab::load(&storage).unwrap();
        let mut h = Harness::new(SettingsApp::new());
        let mut ctx = h.host.context(&mut h.tasks);
        assert!(!tab.handle_key(Key::Char('q'), &mut ctx).unwrap());
        assert!(tab.handle_key(Key::Char('2'), &mut ctx).unwrap());
        assert_eq!(tab.brightness(), 128);
        storage.set_i32(NAMESPACE, KEY, -5).unwrap();
        assert_eq!(DisplayTab::load(&storage).unwrap().brightness(), 0);
    }
}
