use std::{collections::HashMap, iter, sync::Arc};

use cgmath::Vector3;
use wgpu::util::DeviceExt;
use wgpu::{DepthStencilState, RenderPipeline, TextureFormat};

use crate::scene::{MeshData, NodeId, Scene};

use super::{
    camera::CameraUniform,
    debug::{self, DebugOptions},
    uniforms::{GlobalBindings, UniformBuffer},
    vertex::{DebugVertex, Vertex3D},
};

/// Per-node data as the mesh shader consumes it.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct NodeUniform {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

/// GPU resources for one scene node, rebuilt when its geometry revision
/// changes.
struct NodeGpu {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    revision: u64,
    uniform: UniformBuffer<NodeUniform>,
    bind_group: wgpu::BindGroup,
}

impl NodeGpu {
    fn upload(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        mesh: &MeshData,
        revision: u64,
    ) -> Self {
        let mut vertices = Vec::with_capacity(mesh.positions.len() / 3);
        for i in 0..mesh.positions.len() / 3 {
            vertices.push(Vertex3D {
                position: [
                    mesh.positions[i * 3],
                    mesh.positions[i * 3 + 1],
                    mesh.positions[i * 3 + 2],
                ],
                normal: [
                    mesh.normals[i * 3],
                    mesh.normals[i * 3 + 1],
                    mesh.normals[i * 3 + 2],
                ],
            });
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Node Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Node Index Buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let uniform = UniformBuffer::<NodeUniform>::new(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Node Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.binding_resource(),
            }],
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            revision,
            uniform,
            bind_group,
        }
    }
}

struct DepthTexture {
    view: wgpu::TextureView,
    format: TextureFormat,
}

impl DepthTexture {
    const FORMAT: TextureFormat = TextureFormat::Depth32Float;

    fn create(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[Self::FORMAT],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            view,
            format: Self::FORMAT,
        }
    }
}

/// Forward renderer for the node tree plus the debug overlay.
///
/// Meshes draw in two passes over the same encoder: opaque nodes front with
/// depth writes, translucent nodes after with alpha blending and a read-only
/// depth buffer. Feature points and the origin axes draw last with their own
/// pipelines.
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: DepthTexture,
    format: TextureFormat,

    opaque_pipeline: RenderPipeline,
    translucent_pipeline: RenderPipeline,
    line_pipeline: RenderPipeline,
    point_pipeline: RenderPipeline,

    global_ubo: UniformBuffer<CameraUniform>,
    global_bindings: GlobalBindings,

    node_layout: wgpu::BindGroupLayout,
    node_cache: HashMap<NodeId, NodeGpu>,
    axes_buffer: wgpu::Buffer,
}

impl RenderEngine {
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> RenderEngine {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .expect("Failed to create surface!");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to request adapter!");

        let (device, queue) = {
            adapter
                .request_device(&wgpu::DeviceDescriptor {
                    label: Some("WGPU Device"),
                    required_features: wgpu::Features::default(),
                    required_limits: wgpu::Limits {
                        max_texture_dimension_2d: 4096,
                        ..wgpu::Limits::downlevel_defaults()
                    },
                    memory_hints: wgpu::MemoryHints::default(),
                    trace: wgpu::Trace::Off,
                })
                .await
                .expect("Failed to request a device!")
        };

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: surface_capabilities.present_modes[0],
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        let depth_texture = DepthTexture::create(&device, &config);

        let global_ubo = UniformBuffer::<CameraUniform>::new(&device);
        let mut global_bindings = GlobalBindings::new(&device);
        global_bindings.create_bind_group(&device, &global_ubo);

        let node_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Node Bind Group Layout"),
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

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });
        let debug_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Debug Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("debug.wgsl").into()),
        });

        let mesh_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[global_bindings.layout(), &node_layout],
            push_constant_ranges: &[],
        });
        let debug_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Debug Pipeline Layout"),
            bind_group_layouts: &[global_bindings.layout()],
            push_constant_ranges: &[],
        });

        let opaque_pipeline = create_mesh_pipeline(
            &device,
            &mesh_layout,
            &mesh_shader,
            format,
            depth_texture.format,
            wgpu::BlendState::REPLACE,
            true,
        );
        let translucent_pipeline = create_mesh_pipeline(
            &device,
            &mesh_layout,
            &mesh_shader,
            format,
            depth_texture.format,
            wgpu::BlendState::ALPHA_BLENDING,
            false,
        );
        let line_pipeline = create_debug_pipeline(
            &device,
            &debug_layout,
            &debug_shader,
            format,
            depth_texture.format,
            wgpu::PrimitiveTopology::LineList,
        );
        let point_pipeline = create_debug_pipeline(
            &device,
            &debug_layout,
            &debug_shader,
            format,
            depth_texture.format,
            wgpu::PrimitiveTopology::PointList,
        );

        let axes_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Origin Axes Buffer"),
            contents: bytemuck::cast_slice(&debug::origin_axes()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        log::info!("render engine ready ({}x{}, {:?})", width, height, format);

        RenderEngine {
            device: device.into(),
            config,
            format,
            surface,
            queue: queue.into(),
            depth_texture,
            opaque_pipeline,
            translucent_pipeline,
            line_pipeline,
            point_pipeline,
            global_bindings,
            global_ubo,
            node_layout,
            node_cache: HashMap::new(),
            axes_buffer,
        }
    }

    /// Uploads per-node GPU state and draws one frame.
    pub fn render_frame(
        &mut self,
        scene: &Scene,
        feature_points: &[Vector3<f32>],
        options: DebugOptions,
    ) {
        // Sync the node tree to the GPU and split draws by blend mode.
        let mut opaque: Vec<NodeId> = Vec::new();
        let mut translucent: Vec<NodeId> = Vec::new();
        {
            let device = &self.device;
            let queue = &self.queue;
            let layout = &self.node_layout;
            let cache = &mut self.node_cache;

            scene.visit(&mut |node, world, opacity| {
                let Some(geometry) = node.geometry.as_ref() else {
                    return;
                };
                let revision = geometry.revision();

                let stale = cache
                    .get(&node.id())
                    .map(|entry| entry.revision != revision)
                    .unwrap_or(true);
                if stale {
                    let mesh = geometry.mesh_data();
                    cache.insert(
                        node.id(),
                        NodeGpu::upload(device, layout, mesh.as_ref(), revision),
                    );
                }

                let mut color = node.material.base_color;
                color[3] *= opacity;
                let entry = cache.get_mut(&node.id()).expect("entry just inserted");
                entry.uniform.update_content(
                    queue,
                    NodeUniform {
                        model: world.into(),
                        color,
                    },
                );

                if color[3] < 1.0 {
                    translucent.push(node.id());
                } else {
                    opaque.push(node.id());
                }
            });
        }

        let points_buffer = if options.show_feature_points && !feature_points.is_empty() {
            Some(
                self.device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Feature Point Buffer"),
                        contents: bytemuck::cast_slice(&debug::point_cloud(feature_points)),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
            )
        } else {
            None
        };

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(err) => {
                log::error!("dropping frame: {}", err);
                return;
            }
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor {
                format: Some(self.format),
                ..Default::default()
            });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.05,
                            g: 0.06,
                            b: 0.08,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            render_pass.set_pipeline(&self.opaque_pipeline);
            for id in &opaque {
                self.draw_node(&mut render_pass, *id);
            }

            render_pass.set_pipeline(&self.translucent_pipeline);
            for id in &translucent {
                self.draw_node(&mut render_pass, *id);
            }

            if options.show_world_origin {
                render_pass.set_pipeline(&self.line_pipeline);
                render_pass.set_vertex_buffer(0, self.axes_buffer.slice(..));
                render_pass.draw(0..6, 0..1);
            }

            if let Some(buffer) = &points_buffer {
                render_pass.set_pipeline(&self.point_pipeline);
                render_pass.set_vertex_buffer(0, buffer.slice(..));
                render_pass.draw(0..feature_points.len() as u32, 0..1);
            }
        }

        self.queue.submit(iter::once(encoder.finish()));
        surface_texture.present();
    }

    fn draw_node(&self, render_pass: &mut wgpu::RenderPass<'_>, id: NodeId) {
        let Some(entry) = self.node_cache.get(&id) else {
            return;
        };
        render_pass.set_bind_group(1, &entry.bind_group, &[]);
        render_pass.set_vertex_buffer(0, entry.vertex_buffer.slice(..));
        render_pass.set_index_buffer(entry.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..entry.index_count, 0, 0..1);
    }

    pub fn update(&mut self, camera_uniform: CameraUniform) {
        self.global_ubo.update_content(&self.queue, camera_uniform);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = DepthTexture::create(&self.device, &self.config);
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

fn create_mesh_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: TextureFormat,
    depth_format: TextureFormat,
    blend: wgpu::BlendState,
    depth_write: bool,
) -> RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Mesh Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex3D::desc()],
            compilation_options: Default::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Overlay planes are viewed from both sides.
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
            unclipped_depth: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: depth_format,
            depth_write_enabled: depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        multiview: None,
        cache: None,
    })
}

fn create_debug_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: TextureFormat,
    depth_format: TextureFormat,
    topology: wgpu::PrimitiveTopology,
) -> RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Debug Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[DebugVertex::desc()],
            compilation_options: Default::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
            unclipped_depth: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: depth_format,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        multiview: None,
        cache: None,
    })
}
