use std::convert::Infallible;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4};
use skyfield_render::{FrameView, Renderer};
use skyfield_scene::{FieldMesh, InstanceSet, Scene, uniform};
use wgpu::util::DeviceExt;

use crate::mesh::{self, FieldVertex, Vertex};
use crate::shaders;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Multisample count for the scene pass; resolved into the surface texture.
const SAMPLE_COUNT: u32 = 4;

/// Extra ground margin beyond the scattered field, per side.
const GROUND_MARGIN: f32 = 4.0;

/// CPU mirror of the WGSL `FrameUniforms` block.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    camera_position: [f32; 3],
    field_time: f32,
    camera_target: [f32; 3],
    fov: f32,
    sun_direction: [f32; 3],
    fog_fade: f32,
    resolution: [f32; 2],
    wind: f32,
    subject_time: f32,
    base_color: [f32; 4],
    tip_color: [f32; 4],
    subject_color: [f32; 4],
    rim: f32,
    _pad: [f32; 3],
}

impl FrameUniforms {
    /// Gather every uniform the shaders read from the frame's materials.
    /// Missing layers leave their slots at neutral defaults.
    pub(crate) fn from_frame(frame: &FrameView<'_>) -> Self {
        let camera = frame.camera;
        let scene = frame.scene;

        let mut out = Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_position: camera.position.to_array(),
            camera_target: camera.target.to_array(),
            fov: camera.fov_degrees(),
            sun_direction: Vec3::Y.to_array(),
            resolution: [1.0, 1.0],
            base_color: [1.0; 4],
            tip_color: [1.0; 4],
            subject_color: [1.0; 4],
            ..Self::zeroed()
        };

        if let Some(sky) = &scene.sky {
            let m = &sky.material;
            out.sun_direction = m.vec3(uniform::SUN_DIRECTION).unwrap_or(Vec3::Y).to_array();
            out.fog_fade = m.float(uniform::FOG_FADE).unwrap_or(0.0);
            out.fov = m.float(uniform::FOV).unwrap_or(out.fov);
            out.resolution = m.vec2(uniform::RESOLUTION).unwrap_or(Vec2::ONE).to_array();
        }
        if let Some(field) = &scene.field {
            let m = &field.material;
            out.field_time = m.float(uniform::TIME).unwrap_or(0.0);
            out.wind = m.float(uniform::WIND).unwrap_or(0.0);
            out.base_color = m.vec4(uniform::BASE_COLOR).unwrap_or(Vec4::ONE).to_array();
            out.tip_color = m.vec4(uniform::TIP_COLOR).unwrap_or(Vec4::ONE).to_array();
        }
        if let Some(subject) = &scene.subject {
            let m = &subject.material;
            out.subject_time = m.float(uniform::TIME).unwrap_or(0.0);
            out.subject_color = m.vec4(uniform::COLOR).unwrap_or(Vec4::ONE).to_array();
            out.rim = m.float(uniform::RIM).unwrap_or(0.0);
        }
        out
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    tint: [f32; 4],
}

impl InstanceData {
    fn new(model: glam::Mat4, shade: f32) -> Self {
        let cols = model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            tint: [shade, shade, shade, 1.0],
        }
    }
}

/// Pack an instance set in slot order. Shorter instances are shaded darker.
pub(crate) fn instance_data(instances: &InstanceSet) -> Vec<InstanceData> {
    instances
        .iter()
        .map(|t| InstanceData::new(t.matrix(), 0.6 + 0.4 * t.scale.y))
        .collect()
}

/// Vertex, index and instance buffers for one instanced draw.
struct InstancedMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
}

impl InstancedMesh {
    fn new(
        device: &wgpu::Device,
        label: &str,
        (vertices, indices): (Vec<FieldVertex>, Vec<u16>),
        instances: &[InstanceData],
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        // Written once; no COPY_DST, placement is fixed for the scene's lifetime
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_instance_buffer")),
            contents: bytemuck::cast_slice(instances),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            instance_buffer,
            instance_count: instances.len() as u32,
        }
    }

    fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..self.index_count, 0, 0..self.instance_count);
    }
}

struct SubjectMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// wgpu renderer for one scene: sky background, instanced field, subject.
///
/// GPU buffers for the scene's geometry are created once in [`new`](Self::new);
/// per frame only the uniform block is rewritten.
pub struct WgpuRenderer {
    sky_pipeline: wgpu::RenderPipeline,
    field_pipeline: wgpu::RenderPipeline,
    subject_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    field: Option<InstancedMesh>,
    ground: Option<InstancedMesh>,
    subject: Option<SubjectMesh>,
    msaa_texture: wgpu::TextureView,
    depth_texture: wgpu::TextureView,
    color_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        scene: &Scene,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniform_buffer"),
            contents: bytemuck::bytes_of(&FrameUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let surface_targets = color_targets(surface_format);

        // Sky pipeline: no vertex buffers, never writes depth
        let sky_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sky_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::sky().into()),
        });
        let sky_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sky_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &sky_shader,
                entry_point: Some("vs_sky"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(color_target(&sky_shader, "fs_sky", &surface_targets)),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(depth_state(false, wgpu::CompareFunction::Always)),
            multisample: multisample_state(),
            multiview: None,
            cache: None,
        });

        // Field pipeline: double-sided instanced meshes
        let field_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("field_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::field().into()),
        });
        let field_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("field_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &field_shader,
                entry_point: Some("vs_field"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<FieldVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                            2 => Float32,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                            7 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(color_target(&field_shader, "fs_field", &surface_targets)),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(true, wgpu::CompareFunction::Less)),
            multisample: multisample_state(),
            multiview: None,
            cache: None,
        });

        // Subject pipeline
        let subject_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("subject_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::subject().into()),
        });
        let subject_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("subject_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &subject_shader,
                entry_point: Some("vs_subject"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                    ],
                }],
            },
            fragment: Some(color_target(&subject_shader, "fs_subject", &surface_targets)),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(depth_state(true, wgpu::CompareFunction::Less)),
            multisample: multisample_state(),
            multiview: None,
            cache: None,
        });

        // Scene geometry
        let field = scene.field.as_ref().map(|layer| {
            let geometry = match layer.mesh {
                FieldMesh::Blade => mesh::blade_mesh(),
                FieldMesh::Plane => mesh::plane_mesh(),
            };
            InstancedMesh::new(
                device,
                layer.mesh.as_str(),
                geometry,
                &instance_data(layer.instances()),
            )
        });
        let ground = scene.field.as_ref().filter(|l| l.ground).map(|layer| {
            let bounds = layer.instances().bounds();
            let geometry = mesh::ground_mesh(
                bounds.width + GROUND_MARGIN * 2.0,
                bounds.depth + GROUND_MARGIN * 2.0,
            );
            InstancedMesh::new(
                device,
                "ground",
                geometry,
                &[InstanceData::new(glam::Mat4::IDENTITY, 0.55)],
            )
        });
        let subject = scene.subject.as_ref().map(|_| {
            let (vertices, indices) = mesh::cube_mesh();
            SubjectMesh {
                vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("subject_vertex_buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("subject_index_buffer"),
                    contents: bytemuck::cast_slice(&indices),
                    usage: wgpu::BufferUsages::INDEX,
                }),
                index_count: indices.len() as u32,
            }
        });

        tracing::debug!(
            scene = scene.name(),
            instances = field.as_ref().map_or(0, |f| f.instance_count),
            ground = ground.is_some(),
            subject = subject.is_some(),
            "gpu scene resources created"
        );

        let msaa_texture = create_attachment(device, "msaa_texture", surface_format, width, height);
        let depth_texture = create_attachment(device, "depth_texture", DEPTH_FORMAT, width, height);

        Self {
            sky_pipeline,
            field_pipeline,
            subject_pipeline,
            uniform_buffer,
            uniform_bind_group,
            field,
            ground,
            subject,
            msaa_texture,
            depth_texture,
            color_format: surface_format,
        }
    }

    /// Rebuild the multisampled color and depth targets for a new size.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.msaa_texture =
            create_attachment(device, "msaa_texture", self.color_format, width, height);
        self.depth_texture =
            create_attachment(device, "depth_texture", DEPTH_FORMAT, width, height);
    }

    /// Bind this renderer to one frame's device, queue and target view.
    pub fn target<'a>(
        &'a self,
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        view: &'a wgpu::TextureView,
    ) -> FrameTarget<'a> {
        FrameTarget {
            renderer: self,
            device,
            queue,
            view,
        }
    }

    /// Render one frame: sky, ground, field, subject.
    fn draw(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        frame: &FrameView<'_>,
    ) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::from_frame(frame)),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.msaa_texture,
                    resolve_target: Some(view),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.1,
                            g: 0.1,
                            b: 0.15,
                            a: 1.0,
                        }),
                        // Only the resolved surface texture is kept
                        store: wgpu::StoreOp::Discard,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            if frame.scene.sky.is_some() {
                pass.set_pipeline(&self.sky_pipeline);
                pass.draw(0..3, 0..1);
            }

            if self.ground.is_some() || self.field.is_some() {
                pass.set_pipeline(&self.field_pipeline);
                for mesh in self.ground.iter().chain(self.field.iter()) {
                    mesh.draw(&mut pass);
                }
            }

            if let Some(subject) = &self.subject {
                pass.set_pipeline(&self.subject_pipeline);
                pass.set_vertex_buffer(0, subject.vertex_buffer.slice(..));
                pass.set_index_buffer(subject.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..subject.index_count, 0, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

/// Descriptor for a render attachment sampled `SAMPLE_COUNT` times.
/// Zero-sized requests get a 1x1 texture.
fn attachment_descriptor(
    label: &str,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
) -> wgpu::TextureDescriptor<'_> {
    wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: SAMPLE_COUNT,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    }
}

fn create_attachment(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
) -> wgpu::TextureView {
    device
        .create_texture(&attachment_descriptor(label, format, width, height))
        .create_view(&Default::default())
}

fn multisample_state() -> wgpu::MultisampleState {
    wgpu::MultisampleState {
        count: SAMPLE_COUNT,
        ..Default::default()
    }
}

fn color_targets(format: wgpu::TextureFormat) -> [Option<wgpu::ColorTargetState>; 1] {
    [Some(wgpu::ColorTargetState {
        format,
        blend: Some(wgpu::BlendState::REPLACE),
        write_mask: wgpu::ColorWrites::ALL,
    })]
}

fn color_target<'a>(
    module: &'a wgpu::ShaderModule,
    entry_point: &'a str,
    targets: &'a [Option<wgpu::ColorTargetState>],
) -> wgpu::FragmentState<'a> {
    wgpu::FragmentState {
        module,
        entry_point: Some(entry_point),
        compilation_options: Default::default(),
        targets,
    }
}

fn depth_state(write: bool, compare: wgpu::CompareFunction) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: Default::default(),
        bias: Default::default(),
    }
}

/// One frame's draw target; the [`Renderer`] the frame loop calls.
pub struct FrameTarget<'a> {
    renderer: &'a WgpuRenderer,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    view: &'a wgpu::TextureView,
}

impl Renderer for FrameTarget<'_> {
    type Error = Infallible;

    fn render(&mut self, frame: &FrameView<'_>) -> Result<(), Self::Error> {
        self.renderer.draw(self.device, self.queue, self.view, frame);
        Ok(())
    }
}
