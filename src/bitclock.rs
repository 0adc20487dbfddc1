use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use thiserror::Error;
use wgpu::{CreateSurfaceError, Device, RequestAdapterError, RequestDeviceError};
use winit::{
    application::ApplicationHandler,
    error::{EventLoopError, OsError},
    event::{ElementState, StartCause, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::{
    device_context::{DeviceConfig, DeviceContext},
    shader::{ShaderError, ShaderPaths},
    window::{get_centered_window_position, ClockWindow, RenderData, WindowConfig},
    ClockApp,
};

/// [`BitClock`] drives a [`ClockApp`] from the winit event loop: it owns the device and the
/// window, and calls the app's update and render once per frame until the window closes.
pub struct BitClock {
    config: ClockConfig,
    app: Box<dyn ClockApp>,
    context: ClockContext,
    runner_state: RunnerState,
}

impl BitClock {
    pub fn run(
        config: ClockConfig,
        app_create_fn: impl FnOnce(&mut ClockContext) -> Box<dyn ClockApp>,
    ) -> Result<(), ClockError> {
        let mut context = ClockContext::new(&config)?;
        let app = app_create_fn(&mut context);
        let mut bitclock = BitClock {
            app,
            context,
            config,
            runner_state: RunnerState::default(),
        };
        let event_loop = EventLoop::new().map_err(ClockError::EventLoop)?;
        event_loop
            .run_app(&mut bitclock)
            .map_err(ClockError::EventLoop)?;
        match bitclock.runner_state.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl ApplicationHandler for BitClock {
    fn new_events(&mut self, event_loop: &ActiveEventLoop, _cause: StartCause) {
        // Ensure we're poll
        if event_loop.control_flow() != ControlFlow::Poll {
            event_loop.set_control_flow(ControlFlow::Poll);
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let BitClock {
            app,
            config,
            context,
            runner_state,
        } = self;
        if runner_state.is_init {
            return;
        }
        runner_state.is_init = true;
        let started = context
            .open_window(event_loop, &config.window_config)
            .and_then(|_| app.start(event_loop, context));
        if let Err(e) = started {
            runner_state.fail(event_loop, e);
            return;
        }
        context.reset_clock();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let BitClock {
            app,
            context,
            runner_state,
            ..
        } = self;
        // The app sees input first
        app.window_input(context, event_loop, &event);

        let mut is_extra_update = false;

        if let Some(window) = context.window.as_mut() {
            match event {
                WindowEvent::Resized(physical_size) => {
                    // On windows, minimized app can have 0,0 size
                    if physical_size.width > 0 && physical_size.height > 0 {
                        window.configure_surface_with_size(
                            context.device_context.device(),
                            physical_size,
                        );
                        is_extra_update = true;
                    }
                }
                WindowEvent::ScaleFactorChanged {
                    ..
                } => {
                    let size = window.window().inner_size();
                    window.configure_surface_with_size(context.device_context.device(), size);
                    is_extra_update = true;
                }
                WindowEvent::KeyboardInput {
                    event,
                    is_synthetic,
                    ..
                } => {
                    if event.logical_key == Key::Named(NamedKey::Escape)
                        && !is_synthetic
                        && window.exit_on_esc()
                        && window.is_focused()
                        && event.state == ElementState::Pressed
                    {
                        context.exit = true;
                    }
                }
                WindowEvent::Focused(has_focus) => {
                    window.set_focus(has_focus);
                }
                WindowEvent::CloseRequested => {
                    context.exit = true;
                }
                _ => (),
            }
        }

        // about_to_wait isn't triggered during resize, update here so resizing is instant
        if is_extra_update {
            run_update(event_loop, app, context, runner_state);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let BitClock {
            app,
            context,
            runner_state,
            ..
        } = self;
        run_update(event_loop, app, context, runner_state);
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        let BitClock {
            app,
            context,
            ..
        } = self;
        app.end(context);
    }
}

fn run_update(
    event_loop: &ActiveEventLoop,
    app: &mut Box<dyn ClockApp>,
    context: &mut ClockContext,
    runner_state: &mut RunnerState,
) {
    if context.exit {
        context.window = None;
        event_loop.exit();
        return;
    }
    if context.window.is_none() {
        return;
    }
    app.update(context);

    if let Err(e) = render(app, context) {
        runner_state.fail(event_loop, e);
    }
}

fn render(app: &mut Box<dyn ClockApp>, context: &mut ClockContext) -> Result<(), ClockError> {
    let Some(window) = context.window.as_ref() else {
        return Ok(());
    };
    let mut reconfigure = false;
    match window.surface().get_current_texture() {
        Ok(frame) => {
            let device = context.device_context.device();
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Commands"),
            });

            let mut buffers = app
                .render(context, RenderData {
                    encoder: &mut encoder,
                    frame: &frame,
                })
                .unwrap_or_default();
            buffers.push(encoder.finish());
            context.device_context.queue().submit(buffers);

            frame.present();
        }
        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => reconfigure = true,
        Err(wgpu::SurfaceError::OutOfMemory) => return Err(ClockError::OutOfMemory),
        Err(error) => log::warn!("Skipping frame: {}", error),
    }
    window.window().request_redraw();

    if reconfigure {
        if let Some(window) = context.window.as_mut() {
            let size = window.window().inner_size();
            window.configure_surface_with_size(context.device_context.device(), size);
        }
    }
    Ok(())
}

#[derive(Default)]
struct RunnerState {
    is_init: bool,
    error: Option<ClockError>,
}

impl RunnerState {
    /// Records a fatal error and stops the event loop, [`BitClock::run`] returns it.
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: ClockError) {
        self.error = Some(error);
        event_loop.exit();
    }
}

/// Configuration of the window, the device and the shader files.
#[derive(Debug, Clone, Default)]
pub struct ClockConfig {
    pub device_config: DeviceConfig,
    pub window_config: WindowConfig,
    pub shader_paths: ShaderPaths,
}

#[derive(Error, Debug)]
pub enum ClockError {
    #[error("window creation failed: {0}")]
    Window(OsError),
    #[error("surface creation failed: {0}")]
    Surface(CreateSurfaceError),
    #[error("no suitable adapter: {0}")]
    Adapter(RequestAdapterError),
    #[error("device request failed: {0}")]
    Device(RequestDeviceError),
    #[error("event loop failed: {0}")]
    EventLoop(EventLoopError),
    #[error("no window to render to")]
    MissingWindow,
    #[error("surface out of memory, rendering cannot continue")]
    OutOfMemory,
    #[error(transparent)]
    Shader(#[from] ShaderError),
}

/// The runtime context accessible through [`ClockApp`]. Gives access to the device, the window
/// and the monotonic clock the frame counter is read from.
pub struct ClockContext {
    device_context: DeviceContext,
    window: Option<ClockWindow>,
    started: Instant,
    exit: bool,
}

impl ClockContext {
    pub fn new(config: &ClockConfig) -> Result<Self, ClockError> {
        let device_context = DeviceContext::new(&config.device_config)?;
        Ok(Self {
            device_context,
            window: None,
            started: Instant::now(),
            exit: false,
        })
    }

    pub fn device(&self) -> &Device {
        self.device_context.device()
    }

    pub fn window(&self) -> Option<&ClockWindow> {
        self.window.as_ref()
    }

    /// Time since the window opened.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub(crate) fn reset_clock(&mut self) {
        self.started = Instant::now();
    }

    fn open_window(
        &mut self,
        event_loop: &ActiveEventLoop,
        config: &WindowConfig,
    ) -> Result<(), ClockError> {
        let winit_window = Self::create_winit_window(event_loop, config)?;
        let mut window = ClockWindow::new(&self.device_context, config, winit_window)
            .map_err(ClockError::Surface)?;
        // Recreate device with the surface so queue families are correct
        self.device_context
            .reconfigure_with_surface(window.surface())?;
        let size = window.window().inner_size();
        window.configure_surface_with_size(self.device_context.device(), size);
        self.window = Some(window);
        Ok(())
    }

    fn create_winit_window(
        event_loop: &ActiveEventLoop,
        config: &WindowConfig,
    ) -> Result<Arc<Window>, ClockError> {
        let mut window_attributes = Window::default_attributes()
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height))
            .with_title(config.title.as_str());

        if config.centered {
            if let Some(monitor) = event_loop.primary_monitor() {
                window_attributes = window_attributes.with_position(get_centered_window_position(
                    &monitor,
                    config.width,
                    config.height,
                ));
            }
        }

        match event_loop.create_window(window_attributes) {
            Ok(w) => Ok(Arc::new(w)),
            Err(e) => Err(ClockError::Window(e)),
        }
    }
}
