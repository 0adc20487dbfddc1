use std::sync::Arc;

use wgpu::{
    CommandEncoder, CompositeAlphaMode, CreateSurfaceError, Device, PresentMode, Surface,
    SurfaceConfiguration, SurfaceTexture, TextureFormat,
};
use winit::{
    dpi::{LogicalPosition, LogicalSize, PhysicalSize},
    monitor::MonitorHandle,
    window::Window,
};

use crate::device_context::DeviceContext;

#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub centered: bool,
    pub present_mode: PresentMode,
    pub alpha_mode: CompositeAlphaMode,
    /// Preferred surface format, the first supported one is used if this one is not.
    pub surface_format: TextureFormat,
    pub desired_maximum_frame_latency: u32,
    pub exit_on_esc: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Binary Clock".to_string(),
            width: 500,
            height: 500,
            centered: true,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: CompositeAlphaMode::Auto,
            surface_format: ClockWindow::default_surface_format(),
            desired_maximum_frame_latency: 2,
            exit_on_esc: true,
        }
    }
}

/// The window the clock draws into, together with its surface.
pub struct ClockWindow {
    window: Arc<Window>,
    surface: Surface<'static>,
    present_mode: PresentMode,
    alpha_mode: CompositeAlphaMode,
    surface_format: TextureFormat,
    desired_maximum_frame_latency: u32,
    exit_on_esc: bool,
    has_focus: bool,
}

impl ClockWindow {
    /// Creates a new [`ClockWindow`] that owns the winit [`Window`](winit::window::Window).
    pub fn new(
        context: &DeviceContext,
        config: &WindowConfig,
        window: Arc<Window>,
    ) -> Result<ClockWindow, CreateSurfaceError> {
        let surface = context.instance().create_surface(window.clone())?;
        let formats = surface.get_capabilities(context.adapter()).formats;
        let surface_format = if formats.contains(&config.surface_format) {
            config.surface_format
        } else {
            let fallback = formats.first().copied().unwrap_or(config.surface_format);
            log::warn!(
                "{:?} not supported by surface, using {:?}",
                config.surface_format,
                fallback
            );
            fallback
        };
        Ok(ClockWindow {
            window,
            surface,
            present_mode: config.present_mode,
            alpha_mode: config.alpha_mode,
            surface_format,
            desired_maximum_frame_latency: config.desired_maximum_frame_latency,
            exit_on_esc: config.exit_on_esc,
            has_focus: false,
        })
    }

    /// Configure surface after resize events
    pub(crate) fn configure_surface_with_size(&mut self, device: &Device, size: PhysicalSize<u32>) {
        let config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: self.surface_format,
            width: size.width,
            height: size.height,
            present_mode: self.present_mode,
            alpha_mode: self.alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: self.desired_maximum_frame_latency,
        };
        self.surface.configure(device, &config);
    }

    /// Return [`Surface`](wgpu::Surface) belonging to the window
    pub fn surface(&self) -> &Surface<'static> {
        &self.surface
    }

    /// Return [`Window`](winit::window::Window)
    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.surface_format
    }

    /// Return default [`TextureFormat`](wgpu::TextureFormat)
    pub fn default_surface_format() -> TextureFormat {
        #[cfg(target_os = "linux")]
        {
            let is_wayland = std::env::var("XDG_SESSION_TYPE")
                .map(|s| s == "wayland")
                .unwrap_or_else(|_| {
                    std::env::var("WAYLAND_DISPLAY")
                        .map(|s| !s.is_empty())
                        .unwrap_or(false)
                });

            if is_wayland {
                return TextureFormat::Bgra8Unorm;
            }
        }

        TextureFormat::Bgra8UnormSrgb
    }

    pub(crate) fn exit_on_esc(&self) -> bool {
        self.exit_on_esc
    }

    pub fn is_focused(&self) -> bool {
        self.has_focus
    }

    pub(crate) fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }
}

pub fn get_centered_window_position(
    monitor: &MonitorHandle,
    window_width: u32,
    window_height: u32,
) -> LogicalPosition<i32> {
    let size: LogicalSize<i32> = monitor.size().to_logical(monitor.scale_factor());
    let lt_x = size.width / 2 - window_width as i32 / 2;
    let lt_y = size.height / 2 - window_height as i32 / 2;
    LogicalPosition::new(lt_x, lt_y)
}

/// Just a util struct to pass data required for rendering
pub struct RenderData<'a> {
    pub encoder: &'a mut CommandEncoder,
    pub frame: &'a SurfaceTexture,
}
