//! Host device traits.
//!
//! The framework and apps draw and beep exclusively through these traits.
//! The device firmware, the desktop runner, and the test mocks each provide
//! an implementation; none of that code lives behind the trait boundary.

use crate::error::Result;

/// A color in RGB format (0-255 per channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pack into the RGB565 format the LCD controller expects.
    pub const fn to_rgb565(self) -> u16 {
        ((self.r as u16 & 0xF8) << 8) | ((self.g as u16 & 0xFC) << 3) | (self.b as u16 >> 3)
    }

    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const CYAN: Self = Self::rgb(0, 255, 255);
    pub const YELLOW: Self = Self::rgb(255, 255, 0);
    pub const GRAY: Self = Self::rgb(128, 128, 128);
    pub const DARK_GRAY: Self = Self::rgb(48, 48, 48);
}

/// Width and height in pixels of one glyph at text size 1.
pub const GLYPH_W: u32 = 6;
pub const GLYPH_H: u32 = 9;

/// Opaque handle to an off-screen buffer allocated by the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(pub u32);

/// The LCD.
///
/// Off-screen buffers are owned by whoever allocated them until
/// [`Display::free_buffer`] is called. The host does not reclaim them, so an
/// app must free every buffer it allocated before its exit hook returns.
pub trait Display {
    /// Screen size in pixels.
    fn size(&self) -> (u32, u32);

    /// Fill the whole screen with one color.
    fn clear(&mut self, color: Color) -> Result<()>;

    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Color) -> Result<()>;

    /// Draw text with the built-in monospace font. `size` is an integer
    /// scale factor over the 6x9 base glyph.
    fn draw_text(&mut self, text: &str, x: i32, y: i32, size: u8, color: Color) -> Result<()>;

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) -> Result<()>;

    /// Backlight level, 0-255.
    fn set_brightness(&mut self, level: u8) -> Result<()>;

    /// Allocate an off-screen buffer.
    fn alloc_buffer(&mut self, w: u32, h: u32) -> Result<BufferId>;

    /// Fill a rectangle inside an off-screen buffer.
    fn fill_buffer(
        &mut self,
        buf: BufferId,
        x: i32,
        y: i32,
        w: u32,
        h: u32,
        color: Color,
    ) -> Result<()>;

    /// Copy an off-screen buffer onto the screen at `(x, y)`.
    fn push_buffer(&mut self, buf: BufferId, x: i32, y: i32) -> Result<()>;

    /// Release an off-screen buffer.
    fn free_buffer(&mut self, buf: BufferId) -> Result<()>;

    /// Flush the frame. Called by the framework once per tick.
    fn present(&mut self) -> Result<()>;

    /// Width in pixels of `text` at the given scale.
    fn text_width(&self, text: &str, size: u8) -> u32 {
        text.chars().count() as u32 * GLYPH_W * size.max(1) as u32
    }

    /// Draw text horizontally centered on `cx`.
    fn draw_text_centered(
        &mut self,
        text: &str,
        cx: i32,
        y: i32,
        size: u8,
        color: Color,
    ) -> Result<()> {
        let w = self.text_width(text, size) as i32;
        self.draw_text(text, cx - w / 2, y, size, color)
    }
}

/// The speaker.
pub trait Speaker {
    /// Play a tone without blocking. The host schedules the stop.
    fn tone(&mut self, freq_hz: u32, duration_ms: u32) -> Result<()>;

    /// Output volume, 0-100.
    fn set_volume(&mut self, volume: u8) -> Result<()>;
}
