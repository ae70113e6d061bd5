//! The home-screen menu.
//!
//! The launcher never starts apps itself. Key handling returns a
//! [`LauncherAction`] and the framework decides what to do with it, so the
//! framework stays the only owner of the active app.

use cardkit_types::backend::{Color, Display};
use cardkit_types::error::Result;
use cardkit_types::input::{Key, KeyEvent};

use crate::config::{FrameworkConfig, RunMode};
use crate::registry::{AppKind, Registry};

const TITLE_SIZE: u8 = 2;
const ITEM_SIZE: u8 = 2;
const MENU_START_Y: i32 = 22;
const MENU_ITEM_H: i32 = 22;
const ITEM_X: i32 = 10;
const INDICATOR_X: i32 = 225;
const FOOTER_Y: i32 = 125;
const STATUS_Y: i32 = 56;
const STATUS_H: u32 = 16;

/// What the framework should do after a launcher key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LauncherAction {
    None,
    /// Start the app at this module path.
    Launch(String),
    /// Evict cached apps and rescan (remote mode only).
    Reload,
}

/// A menu level the user descended from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuFrame {
    pub node: String,
    pub selected: usize,
    pub scroll: usize,
}

#[derive(Debug, Clone)]
struct Status {
    text: String,
    expires_at: u64,
}

/// Menu navigation state and rendering.
#[derive(Debug, Clone)]
pub struct Launcher {
    stack: Vec<MenuFrame>,
    node: String,
    selected: usize,
    scroll: usize,
    visible_items: usize,
    title: String,
    run_mode: RunMode,
    status_ms: u64,
    status: Option<Status>,
    dirty: bool,
}

impl Launcher {
    pub fn new(config: &FrameworkConfig, run_mode: RunMode) -> Self {
        Self {
            stack: Vec::new(),
            node: String::new(),
            selected: 0,
            scroll: 0,
            visible_items: config.visible_items.max(1),
            title: config.title.clone(),
            run_mode,
            status_ms: config.status_ms,
            status: None,
            dirty: true,
        }
    }

    /// Relative path of the menu being shown, `""` at the root.
    pub fn current_node(&self) -> &str {
        &self.node
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Number of submenus entered, 0 at the root.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn stack(&self) -> &[MenuFrame] {
        &self.stack
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.text.as_str())
    }

    pub fn needs_redraw(&self) -> bool {
        self.dirty
    }

    /// Force a full redraw on the next frame.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Back to the root menu with the first entry selected.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.node.clear();
        self.selected = 0;
        self.scroll = 0;
        self.dirty = true;
    }

    /// Show a transient message until `now_ms + status_ms`.
    pub fn show_status(&mut self, text: impl Into<String>, now_ms: u64) {
        let text = text.into();
        log::info!("[launcher] {text}");
        self.status = Some(Status {
            text,
            expires_at: now_ms + self.status_ms,
        });
        self.dirty = true;
    }

    /// Expire the status message. Returns whether anything changed.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if self.status.as_ref().is_some_and(|s| now_ms >= s.expires_at) {
            self.status = None;
            self.dirty = true;
            return true;
        }
        false
    }

    pub fn handle_key(&mut self, event: &mut KeyEvent, registry: &Registry) -> LauncherAction {
        let len = registry.entries(&self.node).len();
        let key = event.key;

        if key.is_nav_up() {
            event.mark_handled();
            if len > 0 {
                self.selected = (self.selected + len - 1) % len;
                self.fix_scroll(len);
                self.dirty = true;
            }
            return LauncherAction::None;
        }
        if key.is_nav_down() {
            event.mark_handled();
            if len > 0 {
                self.selected = (self.selected + 1) % len;
                self.fix_scroll(len);
                self.dirty = true;
            }
            return LauncherAction::None;
        }

        match key {
            Key::Enter => {
                event.mark_handled();
                self.select(registry)
            },
            Key::Escape | Key::Backspace => {
                if self.back() {
                    event.mark_handled();
                }
                LauncherAction::None
            },
            Key::Char('r') if self.run_mode.is_dev() => {
                event.mark_handled();
                LauncherAction::Reload
            },
            _ => LauncherAction::None,
        }
    }

    fn select(&mut self, registry: &Registry) -> LauncherAction {
        let Some(entry) = registry.entries(&self.node).get(self.selected) else {
            return LauncherAction::None;
        };
        match entry.kind {
            AppKind::App => {
                log::info!("[launcher] launching {}", entry.module_path);
                LauncherAction::Launch(entry.module_path.clone())
            },
            AppKind::Submenu => {
                let child = entry.module_path.clone();
                log::debug!("[launcher] entering {child}");
                self.stack.push(MenuFrame {
                    node: std::mem::replace(&mut self.node, child),
                    selected: self.selected,
                    scroll: self.scroll,
                });
                self.selected = 0;
                self.scroll = 0;
                self.dirty = true;
                LauncherAction::None
            },
        }
    }

    /// Pop one menu level. Returns false at the root.
    fn back(&mut self) -> bool {
        let Some(frame) = self.stack.pop() else {
            return false;
        };
        self.node = frame.node;
        self.selected = frame.selected;
        self.scroll = frame.scroll;
        self.dirty = true;
        true
    }

    fn fix_scroll(&mut self, len: usize) {
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + self.visible_items {
            self.scroll = self.selected + 1 - self.visible_items;
        }
        let max_scroll = len.saturating_sub(self.visible_items);
        self.scroll = self.scroll.min(max_scroll);
    }

    fn heading(&self, registry: &Registry) -> String {
        if self.node.is_empty() {
            return self.title.clone();
        }
        registry
            .node(&self.node)
            .map(|n| n.title.clone())
            .unwrap_or_else(|| self.node.clone())
    }

    /// Draw the whole menu. Clears the redraw flag.
    pub fn view(&mut self, display: &mut dyn Display, registry: &Registry) -> Result<()> {
        let entries = registry.entries(&self.node);
        if !entries.is_empty() && self.selected >= entries.len() {
            self.selected = entries.len() - 1;
        }
        self.fix_scroll(entries.len());

        let (width, _) = display.size();
        display.clear(Color::BLACK)?;
        display.draw_text(&self.heading(registry), 0, 0, TITLE_SIZE, Color::WHITE)?;
        let mode_color = match self.run_mode {
            RunMode::Remote => Color::CYAN,
            RunMode::Flash => Color::GREEN,
        };
        let label = self.run_mode.label();
        let label_x = width as i32 - display.text_width(label, 1) as i32 - 4;
        display.draw_text(label, label_x, 5, 1, mode_color)?;

        if entries.is_empty() {
            display.draw_text("No apps installed", ITEM_X, 50, ITEM_SIZE, Color::WHITE)?;
        }

        for (row, (idx, entry)) in entries
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(self.visible_items)
            .enumerate()
        {
            let prefix = if idx == self.selected { "> " } else { "  " };
            let suffix = if entry.is_submenu() { " >" } else { "" };
            let y = MENU_START_Y + row as i32 * MENU_ITEM_H;
            display.draw_text(
                &format!("{prefix}{}{suffix}", entry.name),
                ITEM_X,
                y,
                ITEM_SIZE,
                Color::WHITE,
            )?;
        }

        if self.scroll > 0 {
            display.draw_text("^", INDICATOR_X, MENU_START_Y, 1, Color::WHITE)?;
        }
        if self.scroll + self.visible_items < entries.len() {
            let y = MENU_START_Y + (self.visible_items as i32 - 1) * MENU_ITEM_H + 10;
            display.draw_text("v", INDICATOR_X, y, 1, Color::WHITE)?;
        }

        let mut footer = String::from("Enter=Select  ;/.=Nav");
        if !self.stack.is_empty() {
            footer.push_str("  Esc=Back");
        } else if self.run_mode.is_dev() {
            footer.push_str("  r=Reload");
        }
        display.draw_text(&footer, 0, FOOTER_Y, 1, Color::WHITE)?;

        if let Some(status) = &self.status {
            display.fill_rect(0, STATUS_Y, width, STATUS_H, Color::DARK_GRAY)?;
            display.draw_text_centered(
                &status.text,
                width as i32 / 2,
                STATUS_Y + 4,
                1,
                Color::YELLOW,
            )?;
        }

        self.dirty = false;
        Ok(())
    }
}
