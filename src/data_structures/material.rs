//! Shader programs with their uniforms and textures.
//!
//! A [`Material`] is built from one vertex and one fragment WGSL file. Right
//! after both sources are loaded, the material records which of the well-known
//! uniforms (`u_model`, `u_view`, `u_projection`, `u_material`) the program
//! declares. That lookup happens once per material; the renderer consults the
//! recorded [`UniformSlots`] every frame to decide what to upload.
//!
//! Per-material behaviour is a small capability set instead of a type
//! hierarchy: the resolved slots, an optional [`UpdateUniforms`] hook run once
//! per frame and the textures bound to consecutive units.

use std::{borrow::Cow, collections::HashMap};

use wgpu::util::DeviceExt;

use crate::{
    context::InitContext,
    data_structures::{geometry::VertexLayout, texture::Texture},
    error::Result,
    flow::FrameClock,
    pipelines::basic::{ShaderStages, material_layout, mk_pipeline_layout, mk_render_pipeline},
    resources::load_shader_source,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub(crate) usize);

/// Which well-known uniforms a shader program declares.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UniformSlots {
    pub model: bool,
    pub view: bool,
    pub projection: bool,
    pub params: bool,
}

impl UniformSlots {
    pub const MODEL: &'static str = "u_model";
    pub const VIEW: &'static str = "u_view";
    pub const PROJECTION: &'static str = "u_projection";
    pub const PARAMS: &'static str = "u_material";

    pub fn resolve(vertex_source: &str, fragment_source: &str) -> Self {
        let mut slots = Self::default();
        for name in declared_uniforms(vertex_source).chain(declared_uniforms(fragment_source)) {
            match name {
                Self::MODEL => slots.model = true,
                Self::VIEW => slots.view = true,
                Self::PROJECTION => slots.projection = true,
                Self::PARAMS => slots.params = true,
                _ => log::debug!("ignoring custom uniform {}", name),
            }
        }
        slots
    }
}

/// Names of all `var<uniform>` declarations in a WGSL source.
pub fn declared_uniforms(source: &str) -> impl Iterator<Item = &str> {
    source.split("var<uniform>").skip(1).filter_map(|rest| {
        let rest = rest.trim_start();
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        (end > 0).then(|| &rest[..end])
    })
}

/// Per-material parameters, mirrored by `MaterialUniform` in the shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub tint: [f32; 4],
    /// Free parameter, for example the blend factor between two textures.
    pub variation: f32,
    /// Seconds since the loop started.
    pub time: f32,
    pub _padding: [f32; 2],
}

impl Default for MaterialUniform {
    fn default() -> Self {
        Self {
            tint: [1.0; 4],
            variation: 0.0,
            time: 0.0,
            _padding: [0.0; 2],
        }
    }
}

/// Hook that refreshes a material's parameters once per frame.
pub type UpdateUniforms = fn(&FrameClock, &mut MaterialUniform);

/// Stock hook: `variation = |sin(t)|`, cycling between two textures.
pub fn pulse(clock: &FrameClock, uniform: &mut MaterialUniform) {
    let t = clock.elapsed().as_secs_f32();
    uniform.variation = t.sin().abs();
    uniform.time = t;
}

/// Everything needed to load a [`Material`].
pub struct MaterialDesc {
    pub label: String,
    /// Vertex shader file, relative to the asset root.
    pub vertex_shader: String,
    /// Fragment shader file, relative to the asset root.
    pub fragment_shader: String,
    pub textures: Vec<Texture>,
    pub uniform: MaterialUniform,
    pub update: Option<UpdateUniforms>,
}

impl MaterialDesc {
    pub fn new(
        label: impl Into<String>,
        vertex_shader: impl Into<String>,
        fragment_shader: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            vertex_shader: vertex_shader.into(),
            fragment_shader: fragment_shader.into(),
            textures: Vec::new(),
            uniform: MaterialUniform::default(),
            update: None,
        }
    }

    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.textures.push(texture);
        self
    }

    pub fn with_tint(mut self, tint: [f32; 4]) -> Self {
        self.uniform.tint = tint;
        self
    }

    pub fn with_update(mut self, update: UpdateUniforms) -> Self {
        self.update = Some(update);
        self
    }
}

/// Pipelines are specialised per vertex layout and culling mode.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub layout: VertexLayout,
    pub backface_culled: bool,
}

/// Layouts and formats a pipeline is built against.
pub struct PipelineTargets<'a> {
    pub color_format: wgpu::TextureFormat,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub camera_layout: &'a wgpu::BindGroupLayout,
    pub object_layout: &'a wgpu::BindGroupLayout,
}

#[derive(Debug)]
pub struct Material {
    label: String,
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    slots: UniformSlots,
    textures: Vec<Texture>,
    uniform: MaterialUniform,
    uniform_dirty: bool,
    update: Option<UpdateUniforms>,
    buffer: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl Material {
    /// Load both shader files concurrently and build the material.
    pub async fn load(ctx: &InitContext, desc: MaterialDesc) -> Result<Self> {
        let (vertex_source, fragment_source) = futures::future::try_join(
            load_shader_source(&ctx.asset_root, &desc.vertex_shader, "vs_main"),
            load_shader_source(&ctx.asset_root, &desc.fragment_shader, "fs_main"),
        )
        .await?;
        Ok(Self::from_sources(
            &ctx.device,
            &desc.label,
            &vertex_source,
            &fragment_source,
            desc.textures,
            desc.uniform,
            desc.update,
        ))
    }

    pub fn from_sources(
        device: &wgpu::Device,
        label: &str,
        vertex_source: &str,
        fragment_source: &str,
        textures: Vec<Texture>,
        uniform: MaterialUniform,
        update: Option<UpdateUniforms>,
    ) -> Self {
        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} vertex shader", label)),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(vertex_source)),
        });
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} fragment shader", label)),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(fragment_source)),
        });
        let slots = UniformSlots::resolve(vertex_source, fragment_source);
        log::debug!("material '{}' exposes {:?}", label, slots);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} uniform buffer", label)),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let layout = material_layout(device, textures.len());

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }];
        for (unit, texture) in textures.iter().enumerate() {
            let unit = unit as u32;
            entries.push(wgpu::BindGroupEntry {
                binding: 1 + 2 * unit,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: 2 + 2 * unit,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            });
        }
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &layout,
            entries: &entries,
            label: Some(&format!("{} bind group", label)),
        });

        Self {
            label: label.to_string(),
            vertex,
            fragment,
            slots,
            textures,
            uniform,
            uniform_dirty: false,
            update,
            buffer,
            layout,
            bind_group,
            pipelines: HashMap::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn slots(&self) -> UniformSlots {
        self.slots
    }

    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    pub fn uniform(&self) -> &MaterialUniform {
        &self.uniform
    }

    /// Mutable access to the parameters; they are uploaded with the next frame.
    pub fn uniform_mut(&mut self) -> &mut MaterialUniform {
        self.uniform_dirty = true;
        &mut self.uniform
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Run the update hook and upload the parameters if the program reads them.
    pub fn update_uniforms(&mut self, queue: &wgpu::Queue, clock: &FrameClock) {
        if let Some(update) = self.update {
            update(clock, &mut self.uniform);
            self.uniform_dirty = true;
        }
        if self.uniform_dirty && self.slots.params {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
        }
        self.uniform_dirty = false;
    }

    pub fn pipeline(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }

    /// Build the pipeline for `key` unless it is cached already.
    pub fn ensure_pipeline(
        &mut self,
        device: &wgpu::Device,
        key: &PipelineKey,
        targets: &PipelineTargets<'_>,
    ) {
        if self.pipelines.contains_key(key) {
            return;
        }
        log::debug!("building pipeline for '{}' ({:?})", self.label, key);
        let layout = mk_pipeline_layout(
            device,
            targets.camera_layout,
            targets.object_layout,
            &self.layout,
        );
        let attributes = key.layout.wgpu_attributes();
        let pipeline = mk_render_pipeline(
            device,
            &layout,
            targets.color_format,
            Some(wgpu::BlendState::REPLACE),
            targets.depth_format,
            &[key.layout.desc(&attributes)],
            ShaderStages {
                vertex: &self.vertex,
                fragment: &self.fragment,
            },
            key.backface_culled.then_some(wgpu::Face::Back),
            Some(&self.label),
        );
        self.pipelines.insert(key.clone(), pipeline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r#"
@group(0) @binding(0) var<uniform> u_view: mat4x4<f32>;
@group(0) @binding(1) var<uniform>   u_projection: mat4x4<f32>;
@group(1) @binding(0) var<uniform> u_model : mat4x4<f32>;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return u_projection * u_view * u_model * vec4<f32>(position, 1.0);
}
"#;

    const FRAGMENT: &str = r#"
struct MaterialUniform { tint: vec4<f32>, variation: f32, time: f32 }
@group(2) @binding(0) var<uniform> u_material: MaterialUniform;
@group(2) @binding(1) var<uniform> u_fog: vec4<f32>;

@fragment
fn fs_main() -> @location(0) vec4<f32> { return u_material.tint; }
"#;

    #[test]
    fn lists_declared_uniforms() {
        let names: Vec<_> = declared_uniforms(VERTEX).collect();
        assert_eq!(names, ["u_view", "u_projection", "u_model"]);
        assert_eq!(declared_uniforms("fn main() {}").count(), 0);
    }

    #[test]
    fn resolves_slots_from_both_stages() {
        let slots = UniformSlots::resolve(VERTEX, FRAGMENT);
        assert_eq!(
            slots,
            UniformSlots {
                model: true,
                view: true,
                projection: true,
                params: true,
            }
        );
    }

    #[test]
    fn missing_uniforms_stay_unresolved() {
        let vertex = "@group(1) @binding(0) var<uniform> u_model: mat4x4<f32>;";
        let slots = UniformSlots::resolve(vertex, "");
        assert!(slots.model);
        assert!(!slots.view && !slots.projection && !slots.params);
    }

    #[test]
    fn pulse_tracks_absolute_sine_of_time() {
        let mut clock = FrameClock::new(instant::Instant::now());
        clock.tick(clock.started() + std::time::Duration::from_millis(1500));
        let mut uniform = MaterialUniform::default();
        pulse(&clock, &mut uniform);
        assert!((uniform.variation - 1.5f32.sin().abs()).abs() < 1e-6);
        assert!((uniform.time - 1.5).abs() < 1e-6);
        assert_eq!(uniform.tint, [1.0; 4]);
    }

    #[test]
    fn uniform_matches_wgsl_struct_size() {
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 32);
    }
}
