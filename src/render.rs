//! Per-frame draw loop.
//!
//! Drawing a frame is split in two. [`plan_frame`] walks the scene's items in
//! insertion order and decides, without touching the GPU, what each draw
//! needs: which matrices to upload and which range to draw. [`Renderer`]
//! then encodes that plan into a single render pass.
//!
//! # Key types
//!
//! - [`DrawCall`] is one planned draw
//! - [`RenderTarget`] is the colour and depth attachment pair drawn into
//! - [`Renderer`] owns the per-item model uniforms and encodes frames

use cgmath::{Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;

use crate::{
    camera::{Camera, CameraResources, Viewport},
    data_structures::{
        geometry::{Geometry, GeometryId},
        material::{Material, MaterialId, PipelineKey, PipelineTargets, UniformSlots},
        object::Object,
        scene::{Item, Scene},
        texture::Texture,
    },
    error::{Error, Result},
    flow::FrameClock,
    pipelines::basic::object_layout,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawRange {
    /// `count` indices from the geometry's index buffer.
    Indexed { count: u32 },
    /// `count` vertices in buffer order.
    Arrays { count: u32 },
}

impl DrawRange {
    fn of(geometry: &Geometry) -> Self {
        match geometry.indices() {
            Some(_) => Self::Indexed {
                count: geometry.index_count(),
            },
            None => Self::Arrays {
                count: geometry.vertex_count(),
            },
        }
    }

    pub fn count(&self) -> u32 {
        match *self {
            Self::Indexed { count } | Self::Arrays { count } => count,
        }
    }
}

/// One item's draw. A matrix is `Some` only if the material's program reads it.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    /// Position of the item in the scene.
    pub item: usize,
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub key: PipelineKey,
    pub model: Option<Matrix4<f32>>,
    pub view: Option<Matrix4<f32>>,
    pub projection: Option<Matrix4<f32>>,
    pub range: DrawRange,
}

/// Plan the draws of one frame.
///
/// Items keep their insertion order. Items whose geometry or material is
/// unknown, and geometries with nothing to draw, are skipped with a warning.
/// The camera's matrices are only touched (and so only recomputed) when some
/// material reads them.
pub fn plan_frame(
    items: &[Item],
    geometries: &[Geometry],
    objects: &[Object],
    slots: impl Fn(MaterialId) -> Option<UniformSlots>,
    camera: &mut Camera,
) -> Vec<DrawCall> {
    let mut calls = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let Some(geometry) = geometries.get(item.geometry.0) else {
            log::warn!("item {} refers to unknown geometry {:?}", index, item.geometry);
            continue;
        };
        let Some(slots) = slots(geometry.material()) else {
            log::warn!(
                "geometry '{}' refers to unknown material {:?}",
                geometry.label(),
                geometry.material()
            );
            continue;
        };
        let range = DrawRange::of(geometry);
        if range.count() == 0 {
            log::warn!("you attempted to render '{}' with nothing to draw", geometry.label());
            continue;
        }

        let object = item.object.and_then(|id| objects.get(id.0));
        calls.push(DrawCall {
            item: index,
            geometry: item.geometry,
            material: geometry.material(),
            key: PipelineKey {
                layout: geometry.layout().clone(),
                backface_culled: geometry.backface_culled,
            },
            model: slots.model.then(|| {
                object
                    .map(Object::model_matrix)
                    .unwrap_or_else(Matrix4::identity)
            }),
            view: slots.view.then(|| camera.view()),
            projection: slots.projection.then(|| camera.projection()),
            range,
        });
    }
    calls
}

/// Attachments a frame is drawn into.
pub struct RenderTarget<'a> {
    pub view: &'a wgpu::TextureView,
    /// Must have [`Texture::DEPTH_FORMAT`].
    pub depth: &'a wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

/// `u_model` of a single item.
#[derive(Debug)]
struct ItemBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

#[derive(Debug)]
pub struct Renderer {
    color_format: wgpu::TextureFormat,
    object_layout: wgpu::BindGroupLayout,
    bindings: Vec<ItemBinding>,
}

impl Renderer {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        Self {
            color_format,
            object_layout: object_layout(device),
            bindings: Vec::new(),
        }
    }

    /// Build the pipelines and per-item uniforms the scene needs.
    ///
    /// Runs once before the loop starts; items or materials added later are
    /// picked up by the next [`render`](Self::render).
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        scene: &mut Scene,
        camera_layout: &wgpu::BindGroupLayout,
    ) -> Result<()> {
        let targets = PipelineTargets {
            color_format: self.color_format,
            depth_format: Some(Texture::DEPTH_FORMAT),
            camera_layout,
            object_layout: &self.object_layout,
        };
        for (material, key) in scene.pipeline_keys() {
            scene
                .material_mut(material)
                .ok_or(Error::UnknownMaterial(material))?
                .ensure_pipeline(device, &key, &targets);
        }

        while self.bindings.len() < scene.items().len() {
            let binding = self.item_binding(device, self.bindings.len());
            self.bindings.push(binding);
        }
        Ok(())
    }

    fn item_binding(&self, device: &wgpu::Device, item: usize) -> ItemBinding {
        let identity: [[f32; 4]; 4] = Matrix4::<f32>::identity().into();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("Model Buffer {}", item)),
            contents: bytemuck::bytes_of(&identity),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(&format!("model_bind_group_{}", item)),
        });
        ItemBinding { buffer, bind_group }
    }

    /// Draw one frame of `scene` into `target` and submit it.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &RenderTarget<'_>,
        scene: &mut Scene,
        camera: &mut CameraResources,
        clock: &FrameClock,
    ) {
        for material in scene.materials_mut() {
            material.update_uniforms(queue, clock);
        }
        if let Err(e) = self.prepare(device, scene, &camera.bind_group_layout) {
            log::error!("Unable to prepare the scene: {}", e);
            return;
        }

        let calls = plan_frame(
            scene.items(),
            scene.geometries(),
            scene.objects(),
            |id| scene.material(id).map(Material::slots),
            &mut camera.camera,
        );

        if let Some(view) = calls.iter().find_map(|call| call.view) {
            camera.write_view(queue, view);
        }
        if let Some(projection) = calls.iter().find_map(|call| call.projection) {
            camera.write_projection(queue, projection);
        }
        for call in &calls {
            if let Some(model) = call.model {
                let raw: [[f32; 4]; 4] = model.into();
                queue.write_buffer(
                    &self.bindings[call.item].buffer,
                    0,
                    bytemuck::bytes_of(&raw),
                );
            }
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(scene.background),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: target.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            let viewport = camera.camera.viewport();
            if let Some([x, y, width, height]) = viewport_rect(viewport, target.width, target.height) {
                render_pass.set_viewport(x as f32, y as f32, width as f32, height as f32, 0.0, 1.0);
                for call in &calls {
                    draw(&mut render_pass, call, scene, camera, &self.bindings[call.item]);
                }
            } else {
                log::warn!("viewport {:?} is empty, only clearing", viewport);
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
    }
}

/// `viewport` clipped to a `width` x `height` target, as `[x, y, width, height]`
/// with y measured from the top. `None` if nothing of it is visible.
pub fn viewport_rect(viewport: Viewport, width: u32, height: u32) -> Option<[u32; 4]> {
    let x = viewport.x.min(width);
    let bottom = viewport.y.min(height);
    let w = viewport.width.min(width - x);
    let h = viewport.height.min(height - bottom);
    if w == 0 || h == 0 {
        return None;
    }
    Some([x, height - bottom - h, w, h])
}

fn draw(
    render_pass: &mut wgpu::RenderPass<'_>,
    call: &DrawCall,
    scene: &Scene,
    camera: &CameraResources,
    binding: &ItemBinding,
) {
    let (Some(material), Some(geometry)) = (
        scene.material(call.material),
        scene.geometries().get(call.geometry.0),
    ) else {
        return;
    };
    let Some(pipeline) = material.pipeline(&call.key) else {
        log::warn!("no pipeline for '{}' ({:?})", material.label(), call.key);
        return;
    };
    let Some(vertices) = scene.buffer(geometry.vertices()) else {
        log::warn!("geometry '{}' lost its vertex buffer", geometry.label());
        return;
    };

    render_pass.set_pipeline(pipeline);
    render_pass.set_bind_group(0, &camera.bind_group, &[]);
    render_pass.set_bind_group(1, &binding.bind_group, &[]);
    render_pass.set_bind_group(2, material.bind_group(), &[]);
    render_pass.set_vertex_buffer(0, vertices.slice(..));
    match call.range {
        DrawRange::Indexed { count } => {
            let Some(indices) = geometry.indices().and_then(|id| scene.buffer(id)) else {
                log::warn!("geometry '{}' lost its index buffer", geometry.label());
                return;
            };
            render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..count, 0, 0..1);
        }
        DrawRange::Arrays { count } => render_pass.draw(0..count, 0..1),
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, Vector3};

    use super::*;
    use crate::{
        camera::Viewport,
        data_structures::{
            buffer_table::BufferTable,
            geometry::{Attribute, GeometryParams, VertexLayout, VertexSource},
            object::ObjectId,
        },
    };

    const TRIANGLE: [f32; 9] = [-0.5, -0.5, 0.0, 0.5, -0.5, 0.0, 0.0, 0.5, 0.0];

    fn upload(_: &str, bytes: &[u8], _: wgpu::BufferUsages) -> Vec<u8> {
        bytes.to_vec()
    }

    fn camera() -> Camera {
        let mut camera = Camera::new(Viewport::new(0, 0, 800, 600), Deg(45.0), 4.0 / 3.0, 0.1, 100.0);
        camera.set_pos((0.0, 0.0, 3.0));
        camera
    }

    fn geometries(materials: &[MaterialId], indices: Option<&[u32]>) -> Vec<Geometry> {
        let mut buffers = BufferTable::new();
        let layout = VertexLayout::new(&[Attribute::Position]).unwrap();
        materials
            .iter()
            .enumerate()
            .map(|(i, material)| {
                let mut params = GeometryParams::new(
                    "triangle",
                    layout.clone(),
                    VertexSource::Data(&TRIANGLE),
                    *material,
                );
                if let Some(indices) = indices {
                    params = params.with_indices(indices);
                }
                let geometry = Geometry::build(params, &[], &mut buffers, upload).unwrap();
                assert_eq!(buffers.len(), (i + 1) * (1 + indices.is_some() as usize));
                geometry
            })
            .collect()
    }

    const ALL: UniformSlots = UniformSlots {
        model: true,
        view: true,
        projection: true,
        params: false,
    };

    #[test]
    fn keeps_insertion_order_and_skips_unknown_materials() {
        let geometries = geometries(&[MaterialId(1), MaterialId(7), MaterialId(0)], None);
        let items: Vec<Item> = (0..3)
            .rev()
            .map(|i| Item {
                geometry: GeometryId(i),
                object: None,
            })
            .collect();
        let mut camera = camera();
        let calls = plan_frame(
            &items,
            &geometries,
            &[],
            |id| (id.0 < 2).then_some(ALL),
            &mut camera,
        );
        let planned: Vec<_> = calls.iter().map(|call| (call.item, call.geometry)).collect();
        assert_eq!(planned, [(0, GeometryId(2)), (2, GeometryId(0))]);
        assert!(calls.iter().all(|call| call.range == DrawRange::Arrays { count: 3 }));
    }

    #[test]
    fn skips_unknown_geometry_and_empty_ranges() {
        let geometries = geometries(&[MaterialId(0)], Some(&[][..]));
        let items = [
            Item {
                geometry: GeometryId(0),
                object: None,
            },
            Item {
                geometry: GeometryId(3),
                object: None,
            },
        ];
        let calls = plan_frame(&items, &geometries, &[], |_| Some(ALL), &mut camera());
        assert!(calls.is_empty());
    }

    #[test]
    fn indexed_geometry_draws_its_indices() {
        let geometries = geometries(&[MaterialId(0)], Some(&[0, 1, 2, 2, 1, 0][..]));
        let items = [Item {
            geometry: GeometryId(0),
            object: None,
        }];
        let calls = plan_frame(&items, &geometries, &[], |_| Some(ALL), &mut camera());
        assert_eq!(calls[0].range, DrawRange::Indexed { count: 6 });
    }

    #[test]
    fn model_matrix_comes_from_the_object_or_identity() {
        let geometries = geometries(&[MaterialId(0)], None);
        let objects = [Object::new().with_translate([1.0, 2.0, 3.0])];
        let items = [
            Item {
                geometry: GeometryId(0),
                object: Some(ObjectId(0)),
            },
            Item {
                geometry: GeometryId(0),
                object: None,
            },
        ];
        let calls = plan_frame(&items, &geometries, &objects, |_| Some(ALL), &mut camera());
        assert_eq!(
            calls[0].model,
            Some(Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0)))
        );
        assert_eq!(calls[1].model, Some(Matrix4::identity()));
    }

    #[test]
    fn camera_is_untouched_without_matching_slots() {
        let geometries = geometries(&[MaterialId(0)], None);
        let items = [Item {
            geometry: GeometryId(0),
            object: None,
        }];
        let mut camera = camera();
        let model_only = UniformSlots {
            model: true,
            ..UniformSlots::default()
        };
        let calls = plan_frame(&items, &geometries, &[], |_| Some(model_only), &mut camera);
        assert_eq!(calls[0].view, None);
        assert_eq!(calls[0].projection, None);
        assert!(camera.is_view_dirty());
        assert!(camera.is_projection_dirty());

        let calls = plan_frame(&items, &geometries, &[], |_| Some(ALL), &mut camera);
        assert_eq!(calls[0].view, Some(camera.view()));
        assert_eq!(camera.view_recomputations(), 1);
        assert_eq!(camera.projection_recomputations(), 1);
    }

    #[test]
    fn matrices_are_computed_once_per_frame() {
        let geometries = geometries(&[MaterialId(0), MaterialId(0)], None);
        let items = [
            Item {
                geometry: GeometryId(0),
                object: None,
            },
            Item {
                geometry: GeometryId(1),
                object: None,
            },
        ];
        let mut camera = camera();
        plan_frame(&items, &geometries, &[], |_| Some(ALL), &mut camera);
        plan_frame(&items, &geometries, &[], |_| Some(ALL), &mut camera);
        assert_eq!(camera.view_recomputations(), 1);
        assert_eq!(camera.projection_recomputations(), 1);
    }

    #[test]
    fn viewport_origin_is_bottom_left() {
        // full target
        assert_eq!(viewport_rect(Viewport::new(0, 0, 800, 600), 800, 600), Some([0, 0, 800, 600]));
        // lower-left quarter sits at the bottom of the target
        assert_eq!(
            viewport_rect(Viewport::new(0, 0, 400, 300), 800, 600),
            Some([0, 300, 400, 300])
        );
        assert_eq!(
            viewport_rect(Viewport::new(400, 300, 400, 300), 800, 600),
            Some([400, 0, 400, 300])
        );
    }

    #[test]
    fn viewport_is_clipped_to_the_target() {
        assert_eq!(
            viewport_rect(Viewport::new(600, 500, 400, 300), 800, 600),
            Some([600, 0, 200, 100])
        );
        assert_eq!(viewport_rect(Viewport::new(800, 0, 10, 10), 800, 600), None);
        assert_eq!(viewport_rect(Viewport::new(0, 0, 0, 0), 800, 600), None);
    }
}
