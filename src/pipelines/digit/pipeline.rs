use std::borrow::Cow;

use wgpu::{util::DeviceExt, Buffer, Device, RenderPass, RenderPipeline};

use crate::{
    device_context::wait_async,
    mesh::{DigitMesh, Topology},
    pipelines::ColoredVertex,
    shader::{load_program, CompiledStage, ShaderError, ShaderPaths, ShaderProgram, ENTRY_POINT},
};

/// A [`DigitMesh`] uploaded to the GPU.
pub struct GpuMesh {
    vertices: Buffer,
    indices: Buffer,
    index_count: u32,
    topology: Topology,
}

impl GpuMesh {
    pub fn upload(device: &Device, mesh: &DigitMesh) -> GpuMesh {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Digit Vertex Buffer"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Digit Index Buffer"),
            contents: bytemuck::cast_slice(&mesh.indices_u16()),
            usage: wgpu::BufferUsages::INDEX,
        });
        GpuMesh {
            vertices,
            indices,
            index_count: mesh.indices.len() as u32,
            topology: mesh.topology,
        }
    }
}

/// The clock's GPU program: one render pipeline per primitive topology, all built from the same
/// linked vertex and fragment stages.
pub struct DigitPipeline {
    list_pipeline: RenderPipeline,
    strip_pipeline: RenderPipeline,
    color_target_state: wgpu::ColorTargetState,
}

impl DigitPipeline {
    pub fn new(
        device: &Device,
        color_target_state: wgpu::ColorTargetState,
        program: &ShaderProgram,
    ) -> Result<DigitPipeline, ShaderError> {
        let (list_pipeline, strip_pipeline) =
            Self::new_render_pipelines(device, &color_target_state, program)?;
        Ok(Self {
            list_pipeline,
            strip_pipeline,
            color_target_state,
        })
    }

    /// Reads, compiles and links the shader files, then builds the pipelines.
    pub fn load(
        device: &Device,
        color_target_state: wgpu::ColorTargetState,
        paths: &ShaderPaths,
    ) -> Result<DigitPipeline, ShaderError> {
        let program = load_program(paths)?;
        Self::new(device, color_target_state, &program)
    }

    /// Rebuilds both pipelines from `paths`. The current pipelines are only replaced once the new
    /// ones were created without errors, otherwise they stay in use.
    pub fn reload(&mut self, device: &Device, paths: &ShaderPaths) -> Result<(), ShaderError> {
        let program = load_program(paths)?;
        let (list_pipeline, strip_pipeline) =
            Self::new_render_pipelines(device, &self.color_target_state, &program)?;
        self.list_pipeline = list_pipeline;
        self.strip_pipeline = strip_pipeline;
        Ok(())
    }

    fn new_render_pipelines(
        device: &Device,
        color_target_state: &wgpu::ColorTargetState,
        program: &ShaderProgram,
    ) -> Result<(RenderPipeline, RenderPipeline), ShaderError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let vertex = Self::shader_module(device, &program.vertex);
        let fragment = Self::shader_module(device, &program.fragment);
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Digit Pipeline Layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });
        let list = Self::new_render_pipeline(
            device,
            &layout,
            &vertex,
            &fragment,
            color_target_state,
            Topology::TriangleList,
        );
        let strip = Self::new_render_pipeline(
            device,
            &layout,
            &vertex,
            &fragment,
            color_target_state,
            Topology::TriangleStrip,
        );
        match wait_async(device.pop_error_scope()) {
            None => Ok((list, strip)),
            Some(error) => {
                let error = ShaderError::Link {
                    log: error.to_string(),
                };
                if let Some(diagnostic) = error.diagnostic() {
                    diagnostic.log();
                }
                Err(error)
            }
        }
    }

    fn shader_module(device: &Device, stage: &CompiledStage) -> wgpu::ShaderModule {
        let label = stage.path.display().to_string();
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label.as_str()),
            source: wgpu::ShaderSource::Naga(Cow::Owned(stage.module.clone())),
        })
    }

    fn new_render_pipeline(
        device: &Device,
        layout: &wgpu::PipelineLayout,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
        color_target_state: &wgpu::ColorTargetState,
        topology: Topology,
    ) -> RenderPipeline {
        let (label, strip_index_format) = match topology {
            Topology::TriangleList => ("Digit List Render Pipeline", None),
            Topology::TriangleStrip => (
                "Digit Strip Render Pipeline",
                Some(wgpu::IndexFormat::Uint16),
            ),
        };
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: vertex,
                entry_point: Some(ENTRY_POINT),
                compilation_options: Default::default(),
                buffers: &[ColoredVertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: fragment,
                entry_point: Some(ENTRY_POINT),
                compilation_options: Default::default(),
                targets: &[Some(color_target_state.clone())],
            }),
            primitive: wgpu::PrimitiveState {
                topology: topology.to_wgpu(),
                strip_index_format,
                front_face: wgpu::FrontFace::Ccw,
                // Ring strip alternates winding
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        })
    }

    pub fn draw(&self, rpass: &mut RenderPass<'_>, mesh: &GpuMesh) {
        let pipeline = match mesh.topology {
            Topology::TriangleList => &self.list_pipeline,
            Topology::TriangleStrip => &self.strip_pipeline,
        };
        rpass.set_pipeline(pipeline);
        rpass.set_vertex_buffer(0, mesh.vertices.slice(..));
        rpass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
    }
}
