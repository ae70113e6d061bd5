//! Tabbed device settings.
//!
//! Each tab is built the first time it is shown and kept for the life of
//! the app instance. Tabs that persist values keep them in the `settings`
//! namespace of the key-value store and read them back when built.

mod about_tab;
mod display_tab;
mod sound_tab;
mod system_tab;

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use cardkit_core::platform::KvStore;
use cardkit_core::{App, AppContext, Color, Key, KeyEvent, Result};

pub use about_tab::{AboutTab, format_uptime};
pub use display_tab::DisplayTab;
pub use sound_tab::SoundTab;
pub use system_tab::SystemTab;

/// Store namespace shared by every tab.
pub const NAMESPACE: &str = "settings";

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

const TAB_Y: i32 = 0;
const TAB_H: u32 = 16;
/// Top of the area a tab draws into.
pub(crate) const CONTENT_Y: i32 = 20;
const FOOTER_H: i32 = 12;

/// Horizontal gauge for a 0-255 value.
pub(crate) fn draw_gauge(ctx: &mut AppContext<'_>, y: i32, value: i32, fill: Color) -> Result<()> {
    let (w, _) = ctx.display.size();
    let x = 10;
    let bar_w = w.saturating_sub(20);
    let bar_h = 14;
    ctx.display
        .fill_rect(x, y, bar_w, bar_h, Color::DARK_GRAY)?;
    let fill_w = (value.clamp(0, 255) as u32 * bar_w.saturating_sub(2)) / 255;
    if fill_w > 0 {
        ctx.display
            .fill_rect(x + 1, y + 1, fill_w, bar_h - 2, fill)?;
    }
    let (x2, y2) = (x + bar_w as i32 - 1, y + bar_h as i32 - 1);
    ctx.display.draw_line(x, y, x2, y, Color::WHITE)?;
    ctx.display.draw_line(x, y2, x2, y2, Color::WHITE)?;
    ctx.display.draw_line(x, y, x, y2, Color::WHITE)?;
    ctx.display.draw_line(x2, y, x2, y2, Color::WHITE)
}

/// The "unsaved changes" / "saved" line at the bottom of a tab.
pub(crate) fn draw_save_state(ctx: &mut AppContext<'_>, dirty: bool) -> Result<()> {
    let y = CONTENT_Y + 78;
    if dirty {
        ctx.display
            .draw_text("* Unsaved changes", 10, y, 1, Color::YELLOW)
    } else {
        ctx.display.draw_text("  Saved", 10, y, 1, Color::GREEN)
    }
}

/// Percentage of a 0-255 level.
pub(crate) fn percent(level: i32) -> i32 {
    level.clamp(0, 255) * 100 / 255
}

/// Read a stored level, falling back to `default` when absent.
pub(crate) fn load_level(storage: &dyn KvStore, key: &str, default: i32) -> Result<i32> {
    Ok(storage
        .get_i32(NAMESPACE, key)?
        .map_or(default, |v| v.clamp(0, 255)))
}

/// Persist one value and flush.
pub(crate) fn save(ctx: &mut AppContext<'_>, key: &str, value: i32) -> Result<()> {
    ctx.storage.set_i32(NAMESPACE, key, value)?;
    ctx.storage.commit()?;
    log::info!("[settings] saved {key} = {value}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

/// One page of the settings app.
pub trait Tab {
    /// Called every time the tab becomes current.
    fn on_enter(&mut self, _ctx: &mut AppContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Draw below the tab bar.
    fn draw(&self, ctx: &mut AppContext<'_>) -> Result<()>;

    /// Returns whether the key was used.
    fn handle_key(&mut self, key: Key, ctx: &mut AppContext<'_>) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TabId {
    Display,
    Sound,
    System,
    About,
}

impl TabId {
    pub const ALL: [Self; 4] = [Self::Display, Self::Sound, Self::System, Self::About];

    pub fn title(self) -> &'static str {
        match self {
            Self::Display => "Display",
            Self::Sound => "Sound",
            Self::System => "System",
            Self::About => "About",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// The tab `step` places away, wrapping in both directions.
    pub fn offset(self, step: isize) -> Self {
        let n = Self::ALL.len() as isize;
        let i = (self.index() as isize + step).rem_euclid(n);
        Self::ALL[i as usize]
    }

    fn build(self, storage: &dyn KvStore) -> Result<Box<dyn Tab>> {
        Ok(match self {
            Self::Display => Box::new(DisplayTab::load(storage)?),
            Self::Sound => Box::new(SoundTab::load(storage)?),
            Self::System => Box::new(SystemTab::load(storage)?),
            Self::About => Box::new(AboutTab),
        })
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct SettingsApp {
    current: TabId,
    tabs: BTreeMap<TabId, Box<dyn Tab>>,
}

impl SettingsApp {
    pub fn new() -> Self {
        Self {
            current: TabId::Display,
            tabs: BTreeMap::new(),
        }
    }

    pub fn current(&self) -> TabId {
        self.current
    }

    /// Tabs built so far.
    pub fn built_tabs(&self) -> Vec<TabId> {
        self.tabs.keys().copied().collect()
    }

    fn tab(&mut self, id: TabId, storage: &dyn KvStore) -> Result<&mut Box<dyn Tab>> {
        match self.tabs.entry(id) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                log::info!("[settings] loading tab {}", id.title());
                Ok(e.insert(id.build(storage)?))
            },
        }
    }

    fn switch(&mut self, step: isize, ctx: &mut AppContext<'_>) -> Result<()> {
        let from = self.current;
        self.current = from.offset(step);
        log::debug!(
            "[settings] tab {} -> {}",
            from.title(),
            self.current.title()
        );
        self.tab(self.current, &*ctx.storage)?.on_enter(ctx)
    }

    fn draw_tab_bar(&self, ctx: &mut AppContext<'_>) -> Result<()> {
        let (w, _) = ctx.display.size();
        let tab_w = w / TabId::ALL.len() as u32;
        for (i, id) in TabId::ALL.iter().enumerate() {
            let x = (i as u32 * tab_w) as i32;
            let (bg, fg) = if *id == self.current {
                (Color::WHITE, Color::BLACK)
            } else {
                (Color::DARK_GRAY, Color::GRAY)
            };
            ctx.display.fill_rect(x, TAB_Y, tab_w, TAB_H, bg)?;
            let text_w = ctx.display.text_width(id.title(), 1);
            let text_x = x + (tab_w.saturating_sub(text_w) / 2) as i32;
            ctx.display
                .draw_text(id.title(), text_x, TAB_Y + 4, 1, fg)?;
        }
        ctx.display
            .draw_line(0, TAB_H as i32, w as i32, TAB_H as i32, Color::GRAY)
    }
}

impl Default for SettingsApp {
    fn default() -> Self {
        Self::new()
    }
}

impl App for SettingsApp {
    fn name(&self) -> &str {
        "Settings"
    }

    fn on_launch(&mut self, ctx: &mut AppContext<'_>) -> Result<()> {
        self.tab(self.current, &*ctx.storage)?.on_enter(ctx)
    }

    fn on_view(&mut self, ctx: &mut AppContext<'_>) -> Result<()> {
        let (_, h) = ctx.display.size();
        ctx.display.clear(Color::BLACK)?;
        self.draw_tab_bar(ctx)?;
        self.tab(self.current, &*ctx.storage)?.draw(ctx)?;
        ctx.display.draw_text(
            "Tab=Next  ;/.=Tab  ESC=Exit",
            5,
            h as i32 - FOOTER_H,
            1,
            Color::GRAY,
        )
    }

    fn handle_key(&mut self, event: &mut KeyEvent, ctx: &mut AppContext<'_>) -> Result<()> {
        let key = event.key;
        if key == Key::Escape {
            return Ok(());
        }
        if key == Key::Tab || key.is_nav_down() {
            self.switch(1, ctx)?;
        } else if key.is_nav_up() {
            self.switch(-1, ctx)?;
        } else {
            self.tab(self.current, &*ctx.storage)?.handle_key(key, ctx)?;
        }
        event.mark_handled();
        ctx.request_redraw();
        Ok(())
    }
}
