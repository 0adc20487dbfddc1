mod bitclock;
mod clock_app;
pub mod clock_face;
pub mod device_context;
pub mod digit;
pub mod frame;
pub mod input;
pub mod mesh;
pub mod mesh_cache;
pub mod pipelines;
pub mod shader;
pub mod window;

// --
pub use wgpu;
pub use winit;

pub use crate::{bitclock::*, clock_app::*, window::RenderData};
