//! The smallest useful app: a greeting and an exit hint.

use cardkit_core::{App, AppContext, Color, Result};

pub struct HelloWorld {
    launches: u32,
}

impl HelloWorld {
    pub fn new() -> Self {
        Self { launches: 0 }
    }

    /// Number of times the app has been launched since it was installed.
    pub fn launches(&self) -> u32 {
        self.launches
    }
}

impl Default for HelloWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl App for HelloWorld {
    fn name(&self) -> &str {
        "Hello World"
    }

    fn on_launch(&mut self, _ctx: &mut AppContext<'_>) -> Result<()> {
        self.launches += 1;
        log::info!("[hello_world] launch #{}", self.launches);
        Ok(())
    }

    fn on_view(&mut self, ctx: &mut AppContext<'_>) -> Result<()> {
        let (w, h) = ctx.display.size();
        let cx = (w / 2) as i32;
        ctx.display.clear(Color::BLACK)?;
        ctx.display
            .draw_text_centered("Hello World!", cx, 40, 2, Color::GREEN)?;
        ctx.display
            .draw_text_centered("This is an app template", cx, 70, 1, Color::WHITE)?;
        ctx.display
            .draw_text("ESC=Exit", 0, h as i32 - 10, 1, Color::GREEN)?;
        Ok(())
    }

    fn on_exit(&mut self, _ctx: &mut AppContext<'_>) -> Result<()> {
        log::info!("[hello_world] exited");
        Ok(())
    }
}
