//! Scene rendering pipelines
//!
//! One vertex format and one shader cover all three display styles; the
//! styles differ only in primitive topology and depth handling. Geometry is
//! uploaded once per mesh entry and re-uploaded only when the entry's
//! revision counter moves, so animation loops that mutate coordinates or
//! scalars touch a single buffer write per frame.

use crate::colormap;
use crate::device::GpuContext;
use bytemuck::{Pod, Zeroable};
use meshview_core::{DisplayStyle, MeshOptions, Scene, SceneMesh};
use nalgebra::{Matrix4, Vector3};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Vertex data shared by the surface, line and point pipelines.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl MeshVertex {
    /// Vertex buffer layout descriptor
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Normal
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Color
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Camera uniform data
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view_pos: [f32; 4],
}

/// Per-mesh style uniform. `params[0]` selects vertex color over the tint,
/// `params[1]` enables shading.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct StyleUniform {
    tint: [f32; 4],
    params: [f32; 4],
}

/// GPU-side buffers for one scene mesh entry.
struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
    edge_buffer: Option<wgpu::Buffer>,
    edge_count: u32,
    _fill_uniform: wgpu::Buffer,
    fill_bind_group: wgpu::BindGroup,
    _edge_uniform: Option<wgpu::Buffer>,
    edge_bind_group: Option<wgpu::BindGroup>,
    revision: u64,
}

impl MeshBuffers {
    fn new(context: &GpuContext, style_layout: &wgpu::BindGroupLayout, entry: &SceneMesh) -> Self {
        let vertices = build_mesh_vertices(entry);
        let vertex_count = vertices.len() as u32;
        // Zero-size buffers are rejected by wgpu; an empty entry gets one
        // placeholder vertex and draws nothing.
        let vertex_data = if vertices.is_empty() {
            vec![MeshVertex::zeroed()]
        } else {
            vertices
        };
        let vertex_buffer = context.create_buffer_init(
            "Mesh Vertex Buffer",
            &vertex_data,
            wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        );

        let triangle_indices = flatten_triangles(&entry.triangles);
        let index_count = triangle_indices.len() as u32;
        let index_buffer = (index_count > 0).then(|| {
            context.create_buffer_init(
                "Mesh Index Buffer",
                &triangle_indices,
                wgpu::BufferUsages::INDEX,
            )
        });

        let edge_indices = flatten_edges(&entry.edges);
        let edge_count = edge_indices.len() as u32;
        let edge_buffer = (edge_count > 0).then(|| {
            context.create_buffer_init(
                "Mesh Edge Buffer",
                &edge_indices,
                wgpu::BufferUsages::INDEX,
            )
        });

        let options = &entry.options;
        let shaded = matches!(options.style, DisplayStyle::Surface);
        let fill = StyleUniform {
            tint: [
                options.color[0],
                options.color[1],
                options.color[2],
                options.opacity,
            ],
            params: [1.0, if shaded { 1.0 } else { 0.0 }, 0.0, 0.0],
        };
        let fill_uniform =
            context.create_buffer_init("Style Buffer", &[fill], wgpu::BufferUsages::UNIFORM);
        let fill_bind_group = context.create_bind_group(
            "style_bind_group",
            style_layout,
            &[wgpu::BindGroupEntry {
                binding: 0,
                resource: fill_uniform.as_entire_binding(),
            }],
        );

        let (edge_uniform, edge_bind_group) = if options.show_edges {
            let edge = StyleUniform {
                tint: [0.0, 0.0, 0.0, options.opacity],
                params: [0.0, 0.0, 0.0, 0.0],
            };
            let buffer = context.create_buffer_init(
                "Edge Style Buffer",
                &[edge],
                wgpu::BufferUsages::UNIFORM,
            );
            let bind_group = context.create_bind_group(
                "edge_style_bind_group",
                style_layout,
                &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            );
            (Some(buffer), Some(bind_group))
        } else {
            (None, None)
        };

        Self {
            vertex_buffer,
            vertex_count,
            index_buffer,
            index_count,
            edge_buffer,
            edge_count,
            _fill_uniform: fill_uniform,
            fill_bind_group,
            _edge_uniform: edge_uniform,
            edge_bind_group,
            revision: entry.revision(),
        }
    }
}

/// Renderer for [`Scene`] contents, shared by the window and offscreen
/// paths.
pub struct SceneRenderer {
    surface_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    point_pipeline: wgpu::RenderPipeline,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    style_bind_group_layout: wgpu::BindGroupLayout,
    depth: Option<(wgpu::TextureView, [u32; 2])>,
    meshes: Vec<MeshBuffers>,
}

impl SceneRenderer {
    pub fn new(context: &GpuContext, format: wgpu::TextureFormat) -> Self {
        let shader =
            context.create_shader_module("Scene Shader", include_str!("shaders/scene.wgsl"));

        let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let camera_bind_group_layout =
            context.create_bind_group_layout("camera_bind_group_layout", &[uniform_entry(0)]);
        let style_bind_group_layout =
            context.create_bind_group_layout("style_bind_group_layout", &[uniform_entry(0)]);

        let pipeline_layout =
            context
                .device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("Scene Pipeline Layout"),
                    bind_group_layouts: &[&camera_bind_group_layout, &style_bind_group_layout],
                    push_constant_ranges: &[],
                });

        let surface_pipeline = create_pipeline(
            context,
            &pipeline_layout,
            &shader,
            "Surface Pipeline",
            format,
            wgpu::PrimitiveTopology::TriangleList,
            wgpu::CompareFunction::Less,
            wgpu::DepthBiasState::default(),
        );
        // Lines sit on top of coincident surfaces: compare LessEqual and
        // bias them toward the viewer.
        let line_pipeline = create_pipeline(
            context,
            &pipeline_layout,
            &shader,
            "Line Pipeline",
            format,
            wgpu::PrimitiveTopology::LineList,
            wgpu::CompareFunction::LessEqual,
            wgpu::DepthBiasState {
                constant: -2,
                slope_scale: -1.0,
                clamp: 0.0,
            },
        );
        let point_pipeline = create_pipeline(
            context,
            &pipeline_layout,
            &shader,
            "Point Pipeline",
            format,
            wgpu::PrimitiveTopology::PointList,
            wgpu::CompareFunction::LessEqual,
            wgpu::DepthBiasState::default(),
        );

        let camera_uniform = CameraUniform {
            view_proj: Matrix4::identity().into(),
            view_pos: [0.0, 0.0, 0.0, 1.0],
        };
        let camera_buffer = context.create_buffer_init(
            "Camera Buffer",
            &[camera_uniform],
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );
        let camera_bind_group = context.create_bind_group(
            "camera_bind_group",
            &camera_bind_group_layout,
            &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        );

        Self {
            surface_pipeline,
            line_pipeline,
            point_pipeline,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            style_bind_group_layout,
            depth: None,
            meshes: Vec::new(),
        }
    }

    /// Update camera view and projection matrices
    pub fn update_camera(
        &mut self,
        context: &GpuContext,
        view_matrix: Matrix4<f32>,
        proj_matrix: Matrix4<f32>,
        camera_pos: Vector3<f32>,
    ) {
        let view_proj = proj_matrix * view_matrix;
        self.camera_uniform.view_proj = view_proj.into();
        self.camera_uniform.view_pos = [camera_pos.x, camera_pos.y, camera_pos.z, 1.0];
        context.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&self.camera_uniform),
        );
    }

    /// Record a render of the scene into `target`.
    pub fn render(
        &mut self,
        context: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        scene: &Scene,
        size: [u32; 2],
    ) {
        if size[0] == 0 || size[1] == 0 {
            return;
        }
        self.sync_meshes(context, scene);
        self.ensure_depth(context, size);
        let Some((depth_view, _)) = &self.depth else {
            return;
        };

        let background = scene.background;
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: background[0] as f64,
                        g: background[1] as f64,
                        b: background[2] as f64,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

        // Draw order follows insertion order.
        for (entry, buffers) in scene.meshes.iter().zip(&self.meshes) {
            if buffers.vertex_count == 0 {
                continue;
            }
            render_pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
            match entry.options.style {
                DisplayStyle::Surface => {
                    if let Some(indices) = &buffers.index_buffer {
                        render_pass.set_pipeline(&self.surface_pipeline);
                        render_pass.set_bind_group(1, &buffers.fill_bind_group, &[]);
                        render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                        render_pass.draw_indexed(0..buffers.index_count, 0, 0..1);
                        if let (Some(edges), Some(bind_group)) =
                            (&buffers.edge_buffer, &buffers.edge_bind_group)
                        {
                            render_pass.set_pipeline(&self.line_pipeline);
                            render_pass.set_bind_group(1, bind_group, &[]);
                            render_pass
                                .set_index_buffer(edges.slice(..), wgpu::IndexFormat::Uint32);
                            render_pass.draw_indexed(0..buffers.edge_count, 0, 0..1);
                        }
                    } else {
                        // Connectivity-free data still shows up, as points.
                        render_pass.set_pipeline(&self.point_pipeline);
                        render_pass.set_bind_group(1, &buffers.fill_bind_group, &[]);
                        render_pass.draw(0..buffers.vertex_count, 0..1);
                    }
                }
                DisplayStyle::Wireframe => {
                    if let Some(edges) = &buffers.edge_buffer {
                        render_pass.set_pipeline(&self.line_pipeline);
                        render_pass.set_bind_group(1, &buffers.fill_bind_group, &[]);
                        render_pass.set_index_buffer(edges.slice(..), wgpu::IndexFormat::Uint32);
                        render_pass.draw_indexed(0..buffers.edge_count, 0, 0..1);
                    } else {
                        render_pass.set_pipeline(&self.point_pipeline);
                        render_pass.set_bind_group(1, &buffers.fill_bind_group, &[]);
                        render_pass.draw(0..buffers.vertex_count, 0..1);
                    }
                }
                DisplayStyle::Points => {
                    render_pass.set_pipeline(&self.point_pipeline);
                    render_pass.set_bind_group(1, &buffers.fill_bind_group, &[]);
                    render_pass.draw(0..buffers.vertex_count, 0..1);
                }
            }
        }
    }

    fn sync_meshes(&mut self, context: &GpuContext, scene: &Scene) {
        for (index, entry) in scene.meshes.iter().enumerate() {
            if index >= self.meshes.len() {
                self.meshes
                    .push(MeshBuffers::new(context, &self.style_bind_group_layout, entry));
            } else if self.meshes[index].revision != entry.revision() {
                // Point counts are fixed after add, so the buffer can be
                // rewritten in place.
                log::debug!(
                    "Re-uploading mesh {} at revision {}",
                    index,
                    entry.revision()
                );
                let vertices = build_mesh_vertices(entry);
                context.queue.write_buffer(
                    &self.meshes[index].vertex_buffer,
                    0,
                    bytemuck::cast_slice(&vertices),
                );
                self.meshes[index].revision = entry.revision();
            }
        }
    }

    fn ensure_depth(&mut self, context: &GpuContext, size: [u32; 2]) {
        let stale = match &self.depth {
            Some((_, existing)) => *existing != size,
            None => true,
        };
        if stale {
            let texture = context.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Depth Texture"),
                size: wgpu::Extent3d {
                    width: size[0],
                    height: size[1],
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            self.depth = Some((view, size));
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn create_pipeline(
    context: &GpuContext,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    label: &str,
    format: wgpu::TextureFormat,
    topology: wgpu::PrimitiveTopology,
    depth_compare: wgpu::CompareFunction,
    bias: wgpu::DepthBiasState,
) -> wgpu::RenderPipeline {
    context
        .device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: "vs_main",
                buffers: &[MeshVertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare,
                stencil: wgpu::StencilState::default(),
                bias,
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        })
}

/// Build interleaved vertices for a scene mesh entry.
pub fn build_mesh_vertices(entry: &SceneMesh) -> Vec<MeshVertex> {
    let colors = resolve_vertex_colors(entry);
    entry
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| MeshVertex {
            position: [p.x, p.y, p.z],
            normal: entry
                .normals
                .get(i)
                .map(|n| [n.x, n.y, n.z])
                .unwrap_or([0.0, 0.0, 1.0]),
            color: colors[i],
        })
        .collect()
}

/// Per-vertex colors for an entry: mapped scalars win over file colors,
/// which win over the flat option color.
pub fn resolve_vertex_colors(entry: &SceneMesh) -> Vec<[f32; 3]> {
    if let Some(scalars) = &entry.scalars {
        if let Some(range) = entry.value_range() {
            return colormap::map_scalars(scalars, range);
        }
    }
    if let Some(rgb) = &entry.colors {
        return rgb
            .iter()
            .map(|c| {
                [
                    c[0] as f32 / 255.0,
                    c[1] as f32 / 255.0,
                    c[2] as f32 / 255.0,
                ]
            })
            .collect();
    }
    vec![entry.options.color; entry.points.len()]
}

fn flatten_triangles(triangles: &[[usize; 3]]) -> Vec<u32> {
    triangles
        .iter()
        .flat_map(|t| [t[0] as u32, t[1] as u32, t[2] as u32])
        .collect()
}

fn flatten_edges(edges: &[[usize; 2]]) -> Vec<u32> {
    edges
        .iter()
        .flat_map(|e| [e[0] as u32, e[1] as u32])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshview_core::Point3f;

    fn triangle_entry() -> SceneMesh {
        let points = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ];
        SceneMesh::from_parts(points, vec![[0, 1, 2]], vec![[0, 1], [1, 2], [0, 2]], None)
    }

    #[test]
    fn test_flat_color_fills_vertices() {
        let mut entry = triangle_entry();
        entry.options = MeshOptions::surface().with_color([0.2, 0.4, 0.6]);
        let vertices = build_mesh_vertices(&entry);
        assert_eq!(vertices.len(), 3);
        for v in &vertices {
            assert_eq!(v.color, [0.2, 0.4, 0.6]);
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_scalars_override_file_colors() {
        let mut entry = triangle_entry();
        entry.colors = Some(vec![[255, 0, 0]; 3]);
        entry.set_scalars(&[0.0, 0.5, 1.0]).unwrap();
        let colors = resolve_vertex_colors(&entry);
        assert_eq!(colors[0], colormap::rainbow(0.0));
        assert_eq!(colors[2], colormap::rainbow(1.0));
    }

    #[test]
    fn test_file_colors_used_without_scalars() {
        let mut entry = triangle_entry();
        entry.colors = Some(vec![[255, 0, 0], [0, 255, 0], [0, 0, 255]]);
        let colors = resolve_vertex_colors(&entry);
        assert_eq!(colors[0], [1.0, 0.0, 0.0]);
        assert_eq!(colors[1], [0.0, 1.0, 0.0]);
        assert_eq!(colors[2], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_explicit_range_shifts_mapping() {
        let mut entry = triangle_entry();
        entry.set_scalars(&[0.0, 0.0, 0.5]).unwrap();
        entry.options.value_range = Some([0.0, 1.0]);
        let colors = resolve_vertex_colors(&entry);
        // 0.5 in a [0, 1] range lands on the middle of the map, not the end.
        assert_eq!(colors[2], colormap::rainbow(0.5));
    }

    #[test]
    fn test_index_flattening() {
        assert_eq!(flatten_triangles(&[[0, 1, 2], [0, 2, 3]]), vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(flatten_edges(&[[4, 5]]), vec![4, 5]);
    }
}
