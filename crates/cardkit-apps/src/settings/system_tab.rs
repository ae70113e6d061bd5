use cardkit_core::platform::KvStore;
use cardkit_core::{AppContext, Color, Key, Result};

use super::{CONTENT_Y, NAMESPACE, Tab, draw_save_state, save};

const KEY: &str = "boot_option";

/// What the device starts into after power-on.
pub const BOOT_LABELS: [&str; 3] = ["Launcher", "Last app", "Setup"];

/// Boot option and run-mode information.
#[derive(Debug)]
pub struct SystemTab {
    boot: usize,
    saved: usize,
}

impl SystemTab {
    pub fn load(storage: &dyn KvStore) -> Result<Self> {
        let boot = storage
            .get_i32(NAMESPACE, KEY)?
            .and_then(|v| usize::try_from(v).ok())
            .filter(|v| *v < BOOT_LABELS.len())
            .unwrap_or(0);
        Ok(Self { boot, saved: boot })
    }

    pub fn boot_label(&self) -> &'static str {
        BOOT_LABELS[self.boot]
    }
}

impl Tab for SystemTab {
    fn draw(&self, ctx: &mut AppContext<'_>) -> Result<()> {
        ctx.display
            .draw_text("Boot Mode:", 10, CONTENT_Y + 5, 1, Color::CYAN)?;
        ctx.display.draw_text(
            &format!("[{}]", self.boot_label()),
            90,
            CONTENT_Y + 5,
            1,
            Color::WHITE,
        )?;

        let mode = ctx.run_mode();
        ctx.display
            .draw_text("Apps:", 10, CONTENT_Y + 25, 1, Color::GRAY)?;
        ctx.display.draw_text(
            mode.apps_root(),
            70,
            CONTENT_Y + 25,
            1,
            Color::WHITE,
        )?;
        ctx.display
            .draw_text("Reload:", 10, CONTENT_Y + 40, 1, Color::GRAY)?;
        let reload = if mode.is_dev() {
            "r in launcher"
        } else {
            "(flash mode)"
        };
        ctx.display
            .draw_text(reload, 70, CONTENT_Y + 40, 1, Color::WHITE)?;

        ctx.display.draw_text(
            "[Enter] Change boot  [S] Save",
            10,
            CONTENT_Y + 60,
            1,
            Color::GRAY,
        )?;
        draw_save_state(ctx, self.boot != self.saved)
    }

    fn handle_key(&mut self, key: Key, ctx: &mut AppContext<'_>) -> Result<bool> {
        match key {
            Key::Enter => {
                self.boot = (self.boot + 1) % BOOT_LABELS.len();
                log::debug!("[settings] boot option: {}", self.boot_label());
            },
            Key::Char('s' | 'S') => {
                save(ctx, KEY, self.boot as i32)?;
                self.saved = self.boot;
            },
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{SettingsApp, TabId};
    use super::*;
    use crate::test_util::Harness;

    fn on_system_tab() -> Harness<SettingsApp> {
        let mut h = Harness::new(SettingsApp::new());
        h.start();
        h.press(Key::Tab);
        h.press(Key::Tab);
        assert_eq!(h.app.current(), TabId::System);
        h
    }

    #[test]
    fn enter_cycles_boot_option() {
        let mut h = on_system_tab();
        assert!(h.host.display.screen_contains("[Launcher]"));
        h.press(Key::Enter);
        assert!(h.host.display.screen_contains("[Last app]"));
        assert!(h.host.display.screen_contains("Unsaved"));
        h.press(Key::Enter);
        h.press(Key::Enter);
        assert!(h.host.display.screen_contains("[Launcher]"));
        assert!(h.host.display.screen_contains("Saved"));
    }

    #[test]
    fn save_persists_boot_option() {
        let mut h = on_system_tab();
        h.press(Key::Enter);
        h.press(Key::Enter);
        h.press(Key::Char('s'));
        assert_eq!(h.host.storage.get_i32(NAMESPACE, KEY).unwrap(), Some(2));
    }

    #[test]
    fn shows_run_mode_details() {
        let h = on_system_tab();
        // The harness context runs in remote mode.
        assert!(h.host.display.screen_contains("/remote/apps"));
        assert!(h.host.display.screen_contains("r in launcher"));
    }

    #[test]
    fn out_of_range_stored_value_falls_back() {
        let mut storage = cardkit_core::platform::MemoryStore::new();
        storage.set_i32(NAMESPACE, KEY, 7).unwrap();
        assert_eq!(SystemTab::load(&storage).unwrap().boot_label(), "Launcher");
        storage.set_i32(NAMESPACE, KEY, 2).unwrap();
        assert_eq!(SystemTab::load(&storage).unwrap().boot_label(), "Setup");
    }
}
