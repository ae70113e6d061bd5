//! Key inspector: shows what the last key press decoded to.

use cardkit_core::{App, AppContext, Color, Key, KeyEvent, Modifiers, Result};

const LABEL_X: i32 = 10;
const VALUE_X: i32 = 70;
const ROW_H: i32 = 14;
const FIRST_ROW_Y: i32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Inspector,
    Info,
}

pub struct KeyboardDemo {
    page: Page,
    last: Option<(Key, Modifiers)>,
    count: u32,
}

impl KeyboardDemo {
    pub fn new() -> Self {
        Self {
            page: Page::Inspector,
            last: None,
            count: 0,
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn key_count(&self) -> u32 {
        self.count
    }

    pub fn last_key(&self) -> Option<Key> {
        self.last.map(|(key, _)| key)
    }

    /// `(label, value)` rows of the inspector page.
    fn rows(&self) -> Vec<(&'static str, String)> {
        let dash = || "--".to_string();
        let (code, hex, shown, mods) = match self.last {
            Some((key, mods)) => {
                let code = key.code();
                let shown = match (key.name(), key.as_char()) {
                    (Some(name), _) => name.to_string(),
                    (None, Some(c)) => format!("'{c}'"),
                    (None, None) => key.to_string(),
                };
                let mods = mods.describe();
                (
                    code.map_or_else(dash, |c| c.to_string()),
                    code.map_or_else(dash, |c| format!("0x{c:02X}")),
                    shown,
                    if mods.is_empty() { "none".to_string() } else { mods },
                )
            },
            None => (dash(), dash(), dash(), "none".to_string()),
        };
        vec![
            ("Key:", code),
            ("Hex:", hex),
            ("Char:", shown),
            ("Mods:", mods),
            ("Count:", self.count.to_string()),
        ]
    }

    fn draw_inspector(&self, ctx: &mut AppContext<'_>) -> Result<()> {
        for (i, (label, value)) in self.rows().into_iter().enumerate() {
            let y = FIRST_ROW_Y + i as i32 * ROW_H;
            ctx.display.draw_text(label, LABEL_X, y, 1, Color::GRAY)?;
            ctx.display.draw_text(&value, VALUE_X, y, 1, Color::WHITE)?;
        }
        Ok(())
    }

    fn draw_info(&self, ctx: &mut AppContext<'_>) -> Result<()> {
        const LINES: [&str; 5] = [
            "handle_key(event, ctx)",
            "event.key: decoded key",
            "event.modifiers: mask",
            "mark_handled() consumes",
            "unhandled ESC = back",
        ];
        for (i, line) in LINES.iter().enumerate() {
            let y = FIRST_ROW_Y + i as i32 * ROW_H;
            ctx.display.draw_text(line, LABEL_X, y, 1, Color::WHITE)?;
        }
        Ok(())
    }
}

impl Default for KeyboardDemo {
    fn default() -> Self {
        Self::new()
    }
}

impl App for KeyboardDemo {
    fn name(&self) -> &str {
        "Keyboard Demo"
    }

    fn on_launch(&mut self, _ctx: &mut AppContext<'_>) -> Result<()> {
        self.page = Page::Inspector;
        Ok(())
    }

    fn on_view(&mut self, ctx: &mut AppContext<'_>) -> Result<()> {
        let (w, h) = ctx.display.size();
        ctx.display.clear(Color::BLACK)?;
        let title = match self.page {
            Page::Inspector => "Key Inspector",
            Page::Info => "Key Event API",
        };
        ctx.display
            .draw_text_centered(title, (w / 2) as i32, 4, 1, Color::CYAN)?;
        ctx.display
            .draw_line(0, 16, w as i32, 16, Color::DARK_GRAY)?;
        match self.page {
            Page::Inspector => self.draw_inspector(ctx)?,
            Page::Info => self.draw_info(ctx)?,
        }
        ctx.display.draw_text(
            "Enter=Page  ESC=Exit",
            LABEL_X,
            h as i32 - 12,
            1,
            Color::GRAY,
        )?;
        Ok(())
    }

    fn handle_key(&mut self, event: &mut KeyEvent, ctx: &mut AppContext<'_>) -> Result<()> {
        match event.key {
            Key::Escape => return Ok(()),
            Key::Enter => {
                self.page = match self.page {
                    Page::Inspector => Page::Info,
                    Page::Info => Page::Inspector,
                };
            },
            key if self.page == Page::Inspector => {
                self.last = Some((key, event.modifiers));
                self.count += 1;
                log::debug!("[keyboard_demo] {key} ({})", event.modifiers.describe());
            },
            _ => {},
        }
        event.mark_handled();
        ctx.request_redraw();
        Ok(())
    }
}
