use wgpu::{CommandBuffer, StoreOp};
use winit::{
    event::{ElementState, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::ModifiersState,
};

use crate::{
    frame::{counter_from_elapsed, frame_slots},
    input::{key_command, KeyCommand},
    mesh::build_digit_mesh,
    mesh_cache::{MeshCache, MeshKey},
    pipelines::{DigitPipeline, GpuMesh},
    shader::{ShaderPaths, ShaderWatcher},
    ClockApp, ClockContext, ClockError, RenderData,
};

/// Draws the four binary digits of the elapsed seconds counter on a white background.
pub struct ClockFace {
    shader_paths: ShaderPaths,
    pipeline: Option<DigitPipeline>,
    meshes: MeshCache<GpuMesh>,
    watcher: Option<ShaderWatcher>,
    modifiers: ModifiersState,
    reload_requested: bool,
    counter: u8,
}

impl ClockFace {
    pub fn new(shader_paths: ShaderPaths) -> ClockFace {
        ClockFace {
            shader_paths,
            pipeline: None,
            meshes: MeshCache::new(),
            watcher: None,
            modifiers: ModifiersState::empty(),
            reload_requested: false,
            counter: 0,
        }
    }

    fn reload_shaders(&mut self, context: &ClockContext) {
        let Some(pipeline) = self.pipeline.as_mut() else {
            return;
        };
        match pipeline.reload(context.device(), &self.shader_paths) {
            Ok(()) => log::info!("Reloaded shaders {:?}", self.shader_paths),
            Err(e) => log::warn!("Shader reload failed, keeping previous program: {}", e),
        }
    }
}

impl ClockApp for ClockFace {
    fn start(
        &mut self,
        _event_loop: &ActiveEventLoop,
        context: &mut ClockContext,
    ) -> Result<(), ClockError> {
        let window = context.window().ok_or(ClockError::MissingWindow)?;
        let color_target_state = wgpu::ColorTargetState {
            format: window.surface_format(),
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        };
        self.pipeline = Some(DigitPipeline::load(
            context.device(),
            color_target_state,
            &self.shader_paths,
        )?);
        self.watcher = match ShaderWatcher::new(&self.shader_paths) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                log::warn!("Shader hot reload disabled: {}", e);
                None
            }
        };
        Ok(())
    }

    fn window_input(
        &mut self,
        _context: &mut ClockContext,
        _event_loop: &ActiveEventLoop,
        event: &WindowEvent,
    ) {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers = modifiers.state(),
            WindowEvent::KeyboardInput {
                event,
                ..
            } if event.state == ElementState::Pressed => {
                match key_command(event.physical_key, self.modifiers) {
                    Some(KeyCommand::DebugExit(code)) => {
                        log::info!("Debug exit with status {}", code);
                        std::process::exit(code);
                    }
                    Some(KeyCommand::ReloadShaders) => self.reload_requested = true,
                    None => (),
                }
            }
            _ => (),
        }
    }

    fn update(&mut self, context: &mut ClockContext) {
        if self.watcher.as_ref().is_some_and(|w| w.should_reload()) {
            self.reload_requested = true;
        }
        if std::mem::take(&mut self.reload_requested) {
            self.reload_shaders(context);
        }
        self.counter = counter_from_elapsed(context.elapsed());
    }

    fn render(
        &mut self,
        context: &ClockContext,
        render_data: RenderData,
    ) -> Option<Vec<CommandBuffer>> {
        let RenderData {
            encoder,
            frame,
        } = render_data;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clock Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                    store: StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        let pipeline = self.pipeline.as_ref()?;
        for slot in frame_slots(self.counter) {
            let mesh = self
                .meshes
                .get_or_insert_with(MeshKey::new(slot.digit, slot.bit), || {
                    GpuMesh::upload(
                        context.device(),
                        &build_digit_mesh(slot.digit, slot.x_offset),
                    )
                });
            pipeline.draw(&mut rpass, mesh);
        }
        None
    }
}
