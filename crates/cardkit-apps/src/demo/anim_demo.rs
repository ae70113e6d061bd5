//! Bouncing boxes, drawn directly on the left half of the screen and through
//! an off-screen buffer on the right half.

use cardkit_core::{App, AppContext, BufferId, Color, Result, TimerId};

const FRAME_MS: u64 = 25;
const FRAME: TimerId = TimerId(1);

const BALL_SIZE: u32 = 12;
/// Top band kept clear for the side labels.
const TOP_MARGIN: f32 = 18.0;
/// Bottom band kept clear for the footer.
const BOTTOM_MARGIN: f32 = 15.0;

const ORANGE: Color = Color::rgb(255, 165, 0);
const BLUE: Color = Color::rgb(0, 0, 255);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub color: Color,
}

impl Ball {
    /// Move one frame inside a `w` x `h` area, bouncing off the edges.
    pub fn step(&mut self, w: f32, h: f32) {
        let size = BALL_SIZE as f32;
        self.x += self.vx;
        self.y += self.vy;

        let max_x = w - size;
        if self.x <= 0.0 || self.x >= max_x {
            self.vx = -self.vx;
            self.x = self.x.clamp(0.0, max_x);
        }
        let max_y = h - size - BOTTOM_MARGIN;
        if self.y <= TOP_MARGIN || self.y >= max_y {
            self.vy = -self.vy;
            self.y = self.y.clamp(TOP_MARGIN, max_y);
        }
    }
}

/// Three balls per side with fixed starting positions so every run looks
/// the same.
fn spawn(colors: [Color; 3]) -> Vec<Ball> {
    const STARTS: [(f32, f32, f32, f32); 3] = [
        (10.0, 30.0, 2.5, 1.5),
        (50.0, 60.0, -2.0, 2.0),
        (80.0, 45.0, 2.0, -1.5),
    ];
    STARTS
        .iter()
        .zip(colors)
        .map(|(&(x, y, vx, vy), color)| Ball {
            x,
            y,
            vx,
            vy,
            color,
        })
        .collect()
}

pub struct AnimDemo {
    direct: Vec<Ball>,
    buffered: Vec<Ball>,
    buffer: Option<BufferId>,
    frames: u64,
}

impl AnimDemo {
    pub fn new() -> Self {
        Self {
            direct: Vec::new(),
            buffered: Vec::new(),
            buffer: None,
            frames: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn buffer(&self) -> Option<BufferId> {
        self.buffer
    }

    pub fn balls(&self) -> impl Iterator<Item = &Ball> {
        self.direct.iter().chain(&self.buffered)
    }

    fn draw_frame(&self, ctx: &mut AppContext<'_>) -> Result<()> {
        let (w, h) = ctx.display.size();
        let half = w / 2;

        // Left: straight to the screen, so the clear is visible.
        ctx.display.fill_rect(0, 0, half, h, Color::BLACK)?;
        ctx.display.draw_text("DIRECT", 5, 5, 1, Color::RED)?;
        for ball in &self.direct {
            ctx.display.fill_rect(
                ball.x as i32,
                ball.y as i32,
                BALL_SIZE,
                BALL_SIZE,
                ball.color,
            )?;
        }

        // Right: composed off screen and pushed in one go.
        if let Some(buf) = self.buffer {
            ctx.display.fill_buffer(buf, 0, 0, half, h, Color::BLACK)?;
            for ball in &self.buffered {
                ctx.display.fill_buffer(
                    buf,
                    ball.x as i32,
                    ball.y as i32,
                    BALL_SIZE,
                    BALL_SIZE,
                    ball.color,
                )?;
            }
            ctx.display.push_buffer(buf, half as i32, 0)?;
        }
        ctx.display
            .draw_text("BUFFERED", half as i32 + 5, 5, 1, Color::GREEN)?;

        ctx.display
            .draw_line(half as i32, 0, half as i32, h as i32, Color::WHITE)?;
        let footer_y = h as i32 - 12;
        ctx.display
            .draw_text("Flickery", 5, footer_y, 1, Color::WHITE)?;
        ctx.display
            .draw_text("Smooth!", half as i32 + 5, footer_y, 1, Color::WHITE)?;
        ctx.display
            .draw_text("ESC=back", w as i32 - 55, footer_y, 1, Color::WHITE)?;
        Ok(())
    }
}

impl Default for AnimDemo {
    fn default() -> Self {
        Self::new()
    }
}

impl App for AnimDemo {
    fn name(&self) -> &str {
        "Animation Demo"
    }

    fn on_launch(&mut self, _ctx: &mut AppContext<'_>) -> Result<()> {
        self.direct = spawn([Color::RED, Color::YELLOW, ORANGE]);
        self.buffered = spawn([Color::GREEN, Color::CYAN, BLUE]);
        self.frames = 0;
        Ok(())
    }

    fn on_view(&mut self, ctx: &mut AppContext<'_>) -> Result<()> {
        ctx.display.clear(Color::BLACK)?;
        self.draw_frame(ctx)
    }

    fn on_ready(&mut self, ctx: &mut AppContext<'_>) -> Result<()> {
        let (w, h) = ctx.display.size();
        let buf = ctx.display.alloc_buffer(w / 2, h)?;
        log::debug!("[anim_demo] allocated buffer {}", buf.0);
        self.buffer = Some(buf);
        ctx.tasks.every(FRAME_MS, FRAME);
        self.draw_frame(ctx)
    }

    fn on_timer(&mut self, id: TimerId, ctx: &mut AppContext<'_>) -> Result<()> {
        if id != FRAME {
            return Ok(());
        }
        let (w, h) = ctx.display.size();
        let half = (w / 2) as f32;
        for ball in self.direct.iter_mut().chain(self.buffered.iter_mut()) {
            ball.step(half, h as f32);
        }
        self.frames += 1;
        self.draw_frame(ctx)
    }

    fn on_exit(&mut self, ctx: &mut AppContext<'_>) -> Result<()> {
        if let Some(buf) = self.buffer.take() {
            ctx.display.free_buffer(buf)?;
            log::debug!("[anim_demo] freed buffer {}", buf.0);
        }
        log::info!("[anim_demo] exited after {} frames", self.frames);
        Ok(())
    }
}
