//! Test doubles for the host boundary.
//!
//! [`MockHost`] bundles a [`MockDisplay`] that records every draw call, a
//! [`MockSpeaker`], an in-memory key-value store, a scripted key queue and a
//! manual clock. [`ProbeApp`] is an [`App`] that logs each hook it receives.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;

use cardkit_platform::MemoryStore;
use cardkit_types::backend::{BufferId, Color, Display, Speaker};
use cardkit_types::error::{CardkitError, Result};
use cardkit_types::input::{Key, KeyEvent};

use crate::app::App;
use crate::config::RunMode;
use crate::context::AppContext;
use crate::host::{Devices, Host};
use crate::tasks::{TaskQueue, TimerId};

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// A recorded display call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCall {
    Clear(Color),
    FillRect {
        x: i32,
        y: i32,
        w: u32,
        h: u32,
        color: Color,
    },
    DrawText {
        text: String,
        x: i32,
        y: i32,
        size: u8,
        color: Color,
    },
    DrawLine {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        color: Color,
    },
    Brightness(u8),
    AllocBuffer {
        buf: BufferId,
        w: u32,
        h: u32,
    },
    FillBuffer {
        buf: BufferId,
        x: i32,
        y: i32,
        w: u32,
        h: u32,
        color: Color,
    },
    PushBuffer {
        buf: BufferId,
        x: i32,
        y: i32,
    },
    FreeBuffer(BufferId),
    Present,
}

/// Display that records calls instead of drawing.
#[derive(Debug)]
pub struct MockDisplay {
    pub calls: Vec<DrawCall>,
    width: u32,
    height: u32,
    next_buffer: u32,
    live: BTreeSet<BufferId>,
}

impl MockDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            calls: Vec::new(),
            width,
            height,
            next_buffer: 1,
            live: BTreeSet::new(),
        }
    }

    /// Every string drawn, in call order.
    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::DrawText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Strings drawn since the most recent full-screen clear.
    pub fn screen_texts(&self) -> Vec<&str> {
        let start = self
            .calls
            .iter()
            .rposition(|c| matches!(c, DrawCall::Clear(_)))
            .map_or(0, |i| i + 1);
        self.calls[start..]
            .iter()
            .filter_map(|c| match c {
                DrawCall::DrawText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether any string on the current screen contains `needle`.
    pub fn screen_contains(&self, needle: &str) -> bool {
        self.screen_texts().iter().any(|t| t.contains(needle))
    }

    /// Color of the first text on the current screen containing `needle`.
    pub fn text_color(&self, needle: &str) -> Option<Color> {
        let start = self
            .calls
            .iter()
            .rposition(|c| matches!(c, DrawCall::Clear(_)))
            .map_or(0, |i| i + 1);
        self.calls[start..].iter().find_map(|c| match c {
            DrawCall::DrawText { text, color, .. } if text.contains(needle) => Some(*color),
            _ => None,
        })
    }

    pub fn present_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DrawCall::Present))
            .count()
    }

    pub fn fill_rect_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DrawCall::FillRect { .. }))
            .count()
    }

    /// Buffers allocated and not yet freed.
    pub fn live_buffers(&self) -> usize {
        self.live.len()
    }

    pub fn last_brightness(&self) -> Option<u8> {
        self.calls.iter().rev().find_map(|c| match c {
            DrawCall::Brightness(level) => Some(*level),
            _ => None,
        })
    }

    pub fn reset(&mut self) {
        self.calls.clear();
    }

    fn check_live(&self, buf: BufferId) -> Result<()> {
        if self.live.contains(&buf) {
            Ok(())
        } else {
            Err(CardkitError::Backend(format!("unknown buffer {}", buf.0)))
        }
    }
}

impl Display for MockDisplay {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        self.calls.push(DrawCall::Clear(color));
        Ok(())
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Color) -> Result<()> {
        self.calls.push(DrawCall::FillRect { x, y, w, h, color });
        Ok(())
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, size: u8, color: Color) -> Result<()> {
        self.calls.push(DrawCall::DrawText {
            text: text.to_string(),
            x,
            y,
            size,
            color,
        });
        Ok(())
    }

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) -> Result<()> {
        self.calls.push(DrawCall::DrawLine {
            x1,
            y1,
            x2,
            y2,
            color,
        });
        Ok(())
    }

    fn set_brightness(&mut self, level: u8) -> Result<()> {
        self.calls.push(DrawCall::Brightness(level));
        Ok(())
    }

    fn alloc_buffer(&mut self, w: u32, h: u32) -> Result<BufferId> {
        let buf = BufferId(self.next_buffer);
        self.next_buffer += 1;
        self.live.insert(buf);
        self.calls.push(DrawCall::AllocBuffer { buf, w, h });
        Ok(buf)
    }

    fn fill_buffer(
        &mut self,
        buf: BufferId,
        x: i32,
        y: i32,
        w: u32,
        h: u32,
        color: Color,
    ) -> Result<()> {
        self.check_live(buf)?;
        self.calls.push(DrawCall::FillBuffer {
            buf,
            x,
            y,
            w,
            h,
            color,
        });
        Ok(())
    }

    fn push_buffer(&mut self, buf: BufferId, x: i32, y: i32) -> Result<()> {
        self.check_live(buf)?;
        self.calls.push(DrawCall::PushBuffer { buf, x, y });
        Ok(())
    }

    fn free_buffer(&mut self, buf: BufferId) -> Result<()> {
        self.check_live(buf)?;
        self.live.remove(&buf);
        self.calls.push(DrawCall::FreeBuffer(buf));
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.calls.push(DrawCall::Present);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Speaker
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MockSpeaker {
    /// `(freq_hz, duration_ms)` per tone.
    pub tones: Vec<(u32, u32)>,
    pub volume: Option<u8>,
}

impl Speaker for MockSpeaker {
    fn tone(&mut self, freq_hz: u32, duration_ms: u32) -> Result<()> {
        self.tones.push((freq_hz, duration_ms));
        Ok(())
    }

    fn set_volume(&mut self, volume: u8) -> Result<()> {
        self.volume = Some(volume);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// Scripted host with a manual clock. `sleep_ms` advances the clock.
#[derive(Debug)]
pub struct MockHost {
    pub display: MockDisplay,
    pub speaker: MockSpeaker,
    pub storage: MemoryStore,
    keys: VecDeque<KeyEvent>,
    now_ms: u64,
    pub updates: u64,
    pub slept_ms: u64,
    quit_after: Option<u64>,
    update_cost_ms: u64,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            display: MockDisplay::new(240, 135),
            speaker: MockSpeaker::default(),
            storage: MemoryStore::new(),
            keys: VecDeque::new(),
            now_ms: 0,
            updates: 0,
            slept_ms: 0,
            quit_after: None,
            update_cost_ms: 0,
        }
    }

    /// Make `should_quit` report true once `update` has run `ticks` times.
    pub fn quit_after(mut self, ticks: u64) -> Self {
        self.quit_after = Some(ticks);
        self
    }

    /// Advance the clock by `ms` on every `update`, simulating slow work.
    pub fn with_update_cost(mut self, ms: u64) -> Self {
        self.update_cost_ms = ms;
        self
    }

    pub fn press(&mut self, key: Key) {
        self.keys.push_back(KeyEvent::new(key));
    }

    pub fn press_event(&mut self, event: KeyEvent) {
        self.keys.push_back(event);
    }

    /// Queue one `Key::Char` per character.
    pub fn type_str(&mut self, text: &str) {
        for c in text.chars() {
            self.press(Key::Char(c));
        }
    }

    pub fn pending_keys(&self) -> usize {
        self.keys.len()
    }

    pub fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
    }

    /// Build a context over this host's devices, as the framework would.
    pub fn context<'a>(&'a mut self, tasks: &'a mut TaskQueue) -> AppContext<'a> {
        let now = self.now_ms;
        AppContext::new(self.devices(), tasks, now, RunMode::Remote)
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for MockHost {
    fn update(&mut self) -> Result<()> {
        self.updates += 1;
        self.now_ms += self.update_cost_ms;
        Ok(())
    }

    fn poll_key(&mut self) -> Option<KeyEvent> {
        self.keys.pop_front()
    }

    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn sleep_ms(&mut self, ms: u64) {
        self.now_ms += ms;
        self.slept_ms += ms;
    }

    fn devices(&mut self) -> Devices<'_> {
        Devices {
            display: &mut self.display,
            speaker: &mut self.speaker,
            storage: &mut self.storage,
        }
    }

    fn should_quit(&self) -> bool {
        self.quit_after.is_some_and(|n| self.updates >= n)
    }
}

// ---------------------------------------------------------------------------
// Probe app
// ---------------------------------------------------------------------------

/// Shared log of hook calls, cloned into each [`ProbeApp`].
#[derive(Debug, Clone, Default)]
pub struct HookLog {
    entries: Rc<RefCell<Vec<String>>>,
    ticks: Rc<Cell<u64>>,
}

impl HookLog {
    pub fn push(&self, entry: String) {
        self.entries.borrow_mut().push(entry);
    }

    /// Drain the recorded entries.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// Number of recorded entries equal to `entry`.
    pub fn count(&self, entry: &str) -> usize {
        self.entries.borrow().iter().filter(|e| *e == entry).count()
    }

    /// `on_tick` calls, counted separately to keep the log readable.
    pub fn ticks(&self) -> u64 {
        self.ticks.get()
    }
}

/// An [`App`] that records every hook as `"<name>:<hook>"`.
///
/// Keys are logged as `"<name>:key:<key>"` and timers as
/// `"<name>:timer:<id>"`. By default it handles every key except Escape.
#[derive(Debug)]
pub struct ProbeApp {
    name: String,
    log: HookLog,
    fail_on: Option<&'static str>,
    exit_on: Option<Key>,
    handle_escape: bool,
    timer: Option<(u64, TimerId)>,
}

impl ProbeApp {
    pub fn new(name: &str, log: HookLog) -> Self {
        Self {
            name: name.to_string(),
            log,
            fail_on: None,
            exit_on: None,
            handle_escape: false,
            timer: None,
        }
    }

    /// Make the named hook (`"install"`, `"view"`, `"key"`, ...) fail.
    pub fn failing_on(mut self, hook: &'static str) -> Self {
        self.fail_on = Some(hook);
        self
    }

    /// Call [`AppContext::request_exit`] when `key` arrives.
    pub fn exit_on(mut self, key: Key) -> Self {
        self.exit_on = Some(key);
        self
    }

    /// Consume Escape instead of letting it bubble.
    pub fn handling_escape(mut self) -> Self {
        self.handle_escape = true;
        self
    }

    /// Schedule a periodic timer in `on_ready`.
    pub fn with_timer(mut self, period_ms: u64, id: TimerId) -> Self {
        self.timer = Some((period_ms, id));
        self
    }

    fn hook(&self, hook: &str) -> Result<()> {
        self.log.push(format!("{}:{hook}", self.name));
        if self.fail_on == Some(hook) {
            return Err(CardkitError::Lifecycle(format!(
                "{} failed in {hook}",
                self.name
            )));
        }
        Ok(())
    }
}

impl App for ProbeApp {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_install(&mut self) -> Result<()> {
        self.hook("install")
    }

    fn on_launch(&mut self, _ctx: &mut AppContext<'_>) -> Result<()> {
        self.hook("launch")
    }

    fn on_view(&mut self, ctx: &mut AppContext<'_>) -> Result<()> {
        self.hook("view")?;
        ctx.display.clear(Color::BLACK)?;
        ctx.display.draw_text(&self.name, 0, 0, 1, Color::WHITE)
    }

    fn on_ready(&mut self, ctx: &mut AppContext<'_>) -> Result<()> {
        self.hook("ready")?;
        if let Some((period, id)) = self.timer {
            ctx.tasks.every(period, id);
        }
        Ok(())
    }

    fn on_tick(&mut self, _ctx: &mut AppContext<'_>) -> Result<()> {
        self.log.ticks.set(self.log.ticks.get() + 1);
        if self.fail_on == Some("tick") {
            return Err(CardkitError::Lifecycle(format!("{} failed in tick", self.name)));
        }
        Ok(())
    }

    fn on_timer(&mut self, id: TimerId, _ctx: &mut AppContext<'_>) -> Result<()> {
        self.hook(&format!("timer:{}", id.0))
    }

    fn handle_key(&mut self, event: &mut KeyEvent, ctx: &mut AppContext<'_>) -> Result<()> {
        self.log.push(format!("{}:key:{}", self.name, event.key));
        if self.fail_on == Some("key") {
            return Err(CardkitError::Lifecycle(format!("{} failed in key", self.name)));
        }
        if Some(event.key) == self.exit_on {
            ctx.request_exit();
        }
        if event.key != Key::Escape || self.handle_escape {
            event.mark_handled();
        }
        Ok(())
    }

    fn on_hide(&mut self, _ctx: &mut AppContext<'_>) -> Result<()> {
        self.hook("hide")
    }

    fn on_exit(&mut self, _ctx: &mut AppContext<'_>) -> Result<()> {
        self.hook("exit")
    }

    fn on_uninstall(&mut self) -> Result<()> {
        self.hook("uninstall")
    }
}
