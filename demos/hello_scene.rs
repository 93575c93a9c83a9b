//! A coloured triangle, a textured quad drawn from both sides and a few
//! spinning cubes. WASD/arrow keys move, the mouse looks around, the wheel
//! zooms and Escape quits.

use scene_ngin::{
    InnerSpace, Vector3,
    context::{Context, InitContext},
    data_structures::{
        geometry::{Attribute, GeometryParams, VertexLayout, VertexSource},
        material::{Material, MaterialDesc, MaterialId, pulse},
        object::{Object, ObjectId},
        scene::Scene,
        texture::{SamplerOptions, Texture},
    },
    flow::{FrameClock, RenderEvents, SetupFuture, run},
    settings::Settings,
};

#[rustfmt::skip]
const TRIANGLE: [f32; 18] = [
    // position        colour
    -0.5, -0.5, 0.0,   1.0, 0.0, 0.0,
     0.5, -0.5, 0.0,   0.0, 1.0, 0.0,
     0.0,  0.5, 0.0,   0.0, 0.0, 1.0,
];

#[rustfmt::skip]
const QUAD: [f32; 20] = [
    // position        uv
    -0.5, -0.5, 0.0,   0.0, 1.0,
     0.5, -0.5, 0.0,   1.0, 1.0,
     0.5,  0.5, 0.0,   1.0, 0.0,
    -0.5,  0.5, 0.0,   0.0, 0.0,
];
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Two triangles per face, counter-clockwise seen from outside.
fn cube_vertices() -> Vec<f32> {
    // (normal, u, v) with u x v = normal
    let faces: [(Vector3<f32>, Vector3<f32>, Vector3<f32>); 6] = [
        (Vector3::unit_x(), Vector3::unit_y(), Vector3::unit_z()),
        (-Vector3::unit_x(), Vector3::unit_z(), Vector3::unit_y()),
        (Vector3::unit_y(), Vector3::unit_z(), Vector3::unit_x()),
        (-Vector3::unit_y(), Vector3::unit_x(), Vector3::unit_z()),
        (Vector3::unit_z(), Vector3::unit_x(), Vector3::unit_y()),
        (-Vector3::unit_z(), Vector3::unit_y(), Vector3::unit_x()),
    ];
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
    let mut vertices = Vec::with_capacity(36 * 6);
    for (normal, u, v) in faces {
        let colour = (normal.map(f32::abs) + Vector3::new(0.3, 0.3, 0.3)).normalize();
        for corner in [0, 1, 2, 2, 3, 0] {
            let (s, t) = corners[corner];
            let position = (normal + u * s + v * t) * 0.5;
            vertices.extend_from_slice(&[position.x, position.y, position.z]);
            vertices.extend_from_slice(&[colour.x, colour.y, colour.z]);
        }
    }
    vertices
}

fn checkerboard(ctx: &InitContext) -> Texture {
    let img = image::RgbaImage::from_fn(64, 64, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            image::Rgba([230, 230, 230, 255])
        } else {
            image::Rgba([40, 40, 40, 255])
        }
    });
    Texture::from_image(
        &ctx.device,
        &ctx.queue,
        &image::DynamicImage::ImageRgba8(img),
        Some("checkerboard"),
        SamplerOptions::default().repeat(false).magnify_linear(false),
    )
}

fn gradient(ctx: &InitContext) -> Texture {
    let img = image::RgbaImage::from_fn(64, 64, |x, y| {
        image::Rgba([(x * 4) as u8, (y * 4) as u8, 160, 255])
    });
    Texture::from_image(
        &ctx.device,
        &ctx.queue,
        &image::DynamicImage::ImageRgba8(img),
        Some("gradient"),
        SamplerOptions::default().clamp(),
    )
}

#[derive(Default)]
struct HelloScene {
    cubes: Vec<ObjectId>,
    colour: Option<MaterialId>,
}

impl RenderEvents for HelloScene {
    fn setup_scene<'a>(&'a mut self, ctx: &'a InitContext, scene: &'a mut Scene) -> SetupFuture<'a> {
        Box::pin(async move {
            let colour = scene.add_material(
                Material::load(
                    ctx,
                    MaterialDesc::new(
                        "colour",
                        "shaders/color.vert.wgsl",
                        "shaders/color.frag.wgsl",
                    ),
                )
                .await?,
            );
            let textured = scene.add_material(
                Material::load(
                    ctx,
                    MaterialDesc::new(
                        "textured",
                        "shaders/texture.vert.wgsl",
                        "shaders/texture.frag.wgsl",
                    )
                    .with_texture(checkerboard(ctx))
                    .with_texture(gradient(ctx))
                    .with_update(pulse),
                )
                .await?,
            );
            self.colour = Some(colour);

            let coloured = VertexLayout::new(&[Attribute::Position, Attribute::Color])?;
            let uv = VertexLayout::new(&[Attribute::Position, Attribute::TexCoords])?;

            let triangle = scene.add_geometry(
                &ctx.device,
                GeometryParams::new(
                    "triangle",
                    coloured.clone(),
                    VertexSource::Data(&TRIANGLE),
                    colour,
                )
                // visible from behind too
                .with_backface_culling(false),
            )?;
            let left = scene.add_object(Object::new().with_translate([-1.5, 0.0, 0.0]));
            scene.add(triangle, Some(left))?;

            let quad = scene.add_geometry(
                &ctx.device,
                GeometryParams::new("quad", uv.clone(), VertexSource::Data(&QUAD), textured)
                    .with_indices(&QUAD_INDICES),
            )?;
            scene.add(quad, None)?;

            // Same vertices, drawn without culling and turned around
            let quad_back = scene.add_geometry(
                &ctx.device,
                GeometryParams::new("quad back", uv, VertexSource::Shared(quad), textured)
                    .with_indices(&QUAD_INDICES)
                    .with_backface_culling(false),
            )?;
            let behind = scene.add_object(
                Object::new()
                    .with_translate([1.5, 0.0, -1.0])
                    .with_rotate([0.0, std::f32::consts::PI, 0.0]),
            );
            scene.add(quad_back, Some(behind))?;

            let cube_data = cube_vertices();
            let cube = scene.add_geometry(
                &ctx.device,
                GeometryParams::new("cube", coloured, VertexSource::Data(&cube_data), colour),
            )?;
            for i in 0..3 {
                let x = i as f32 * 1.5 - 1.5;
                let object = scene.add_object(
                    Object::new()
                        .with_translate([x, -1.2, -2.0])
                        .with_scale([0.5, 0.5, 0.5]),
                );
                scene.add(cube, Some(object))?;
                self.cubes.push(object);
            }
            Ok(())
        })
    }

    fn begin_frame(&mut self, _ctx: &mut Context, scene: &mut Scene, clock: &FrameClock) {
        let t = clock.elapsed().as_secs_f32();
        for (i, id) in self.cubes.iter().enumerate() {
            if let Some(object) = scene.object_mut(*id) {
                let speed = 0.5 + i as f32 * 0.25;
                object.rotate = Vector3::new(t * speed * 0.5, t * speed, 0.0);
            }
        }
        // fade the coloured material in over the first two seconds
        if let Some(material) = self.colour.and_then(|id| scene.material_mut(id)) {
            let level = (t / 2.0).min(1.0);
            if material.uniform().tint[0] != level {
                material.uniform_mut().tint = [level, level, level, 1.0];
            }
        }
    }

    fn end_frame(&mut self, ctx: &Context, _scene: &Scene, clock: &FrameClock) {
        if clock.frame() % 600 == 0 {
            log::info!(
                "frame {}: {:.1} ms, camera at {:?}",
                clock.frame(),
                clock.delta().as_secs_f64() * 1000.0,
                ctx.camera.camera.position()
            );
        }
    }
}

fn main() -> anyhow::Result<()> {
    let settings = Settings::default().with_title("hello scene");
    run(settings, vec![Box::new(HelloScene::default())])
}
