use wgpu::CommandBuffer;
use winit::{event::WindowEvent, event_loop::ActiveEventLoop};

use crate::{ClockContext, ClockError, RenderData};

/// A trait to define all stages of a clock app. Each function here is run at a specific stage
/// within winit event loop.
pub trait ClockApp {
    /// Run once the window and device exist. An error here is fatal and ends the event loop.
    fn start(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _context: &mut ClockContext,
    ) -> Result<(), ClockError> {
        Ok(())
    }
    /// Run on each window event from winit, before the runner handles it
    fn window_input(
        &mut self,
        _context: &mut ClockContext,
        _event_loop: &ActiveEventLoop,
        _event: &WindowEvent,
    ) {
    }
    /// Run each frame, called within winit's `about_to_wait`.
    fn update(&mut self, _context: &mut ClockContext) {}
    /// Run each frame after update. Returned command buffers are submitted before the encoder's.
    fn render(
        &mut self,
        _context: &ClockContext,
        _render_data: RenderData,
    ) -> Option<Vec<CommandBuffer>> {
        None
    }
    /// Run at exit
    fn end(&mut self, _context: &mut ClockContext) {}
}
