use cardkit_core::{AppContext, Color, Key, Result};

use super::{CONTENT_Y, Tab};

const LINE_H: i32 = 14;

/// `1h 2m 3s` style uptime.
pub fn format_uptime(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}h {}m {}s", secs / 3600, secs / 60 % 60, secs % 60)
}

/// Read-only device information.
#[derive(Debug)]
pub struct AboutTab;

impl Tab for AboutTab {
    fn draw(&self, ctx: &mut AppContext<'_>) -> Result<()> {
        let (w, h) = ctx.display.size();
        let rows = [
            ("Device:", "M5Stack Cardputer".to_string()),
            ("Chip:", "ESP32-S3 @ 240MHz".to_string()),
            ("cardkit:", env!("CARGO_PKG_VERSION").to_string()),
            ("Screen:", format!("{w}x{h}")),
            ("Uptime:", format_uptime(ctx.now_ms())),
        ];
        for (i, (label, value)) in rows.iter().enumerate() {
            let y = CONTENT_Y + 5 + i as i32 * LINE_H;
            ctx.display.draw_text(label, 10, y, 1, Color::GRAY)?;
            ctx.display.draw_text(value, 80, y, 1, Color::WHITE)?;
        }
        Ok(())
    }

    fn handle_key(&mut self, _key: Key, _ctx: &mut AppContext<'_>) -> Result<bool> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::super::SettingsApp;
    use super::*;
    use crate::test_util::Harness;

    #[test]
    fn uptime_format() {
        assert_eq!(format_uptime(0), "0h 0m 0s");
        assert_eq!(format_uptime(3_723_999), "1h 2m 3s");
        assert_eq!(format_uptime(90_000_000), "25h 0m 0s");
    }

    #[test]
    fn shows_device_rows() {
        let mut h = Harness::new(SettingsApp::new());
        h.host.advance(61_000);
        h.start();
        h.press(Key::Char(';'));
        let display = &h.host.display;
        assert!(display.screen_contains("M5Stack Cardputer"));
        assert!(display.screen_contains("240x135"));
        assert!(display.screen_contains("0h 1m 1s"));
        assert!(display.screen_contains(env!("CARGO_PKG_VERSION")));
    }
}
