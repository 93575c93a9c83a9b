//! Vertex/index data and how it is laid out.
//!
//! # Key types
//!
//! - [`VertexLayout`] is the ordered list of float attributes of one interleaved vertex
//! - [`GeometryParams`] describes a geometry to create, either from raw vertex data or
//!   by sharing the vertex buffer of an existing geometry
//! - [`Geometry`] holds [`BufferId`]s into the scene's buffer table plus draw counts

use std::mem;

use crate::{
    data_structures::{
        buffer_table::{BufferId, BufferTable},
        material::MaterialId,
    },
    error::{Error, Result},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub(crate) usize);

/// Float vertex attributes a geometry can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    Position,
    TexCoords,
    Color,
}

impl Attribute {
    pub fn components(self) -> u32 {
        match self {
            Attribute::Position => 3,
            Attribute::TexCoords => 2,
            Attribute::Color => 3,
        }
    }

    /// `@location` of the attribute in the vertex shader.
    pub fn shader_location(self) -> u32 {
        match self {
            Attribute::Position => 0,
            Attribute::TexCoords => 1,
            Attribute::Color => 2,
        }
    }

    fn format(self) -> wgpu::VertexFormat {
        match self {
            Attribute::Position | Attribute::Color => wgpu::VertexFormat::Float32x3,
            Attribute::TexCoords => wgpu::VertexFormat::Float32x2,
        }
    }

    fn size(self) -> wgpu::BufferAddress {
        (self.components() as usize * mem::size_of::<f32>()) as wgpu::BufferAddress
    }
}

/// Interleaved layout of one vertex, attributes in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    attributes: Vec<Attribute>,
}

impl VertexLayout {
    pub fn new(attributes: &[Attribute]) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidGeometry {
            label: "vertex layout".to_string(),
            reason: reason.to_string(),
        };
        if !attributes.contains(&Attribute::Position) {
            return Err(invalid("a vertex needs a position"));
        }
        for (idx, attribute) in attributes.iter().enumerate() {
            if attributes[..idx].contains(attribute) {
                return Err(invalid(&format!("{:?} is declared twice", attribute)));
            }
        }
        Ok(Self {
            attributes: attributes.to_vec(),
        })
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Floats per vertex.
    pub fn components(&self) -> u32 {
        self.attributes.iter().map(|a| a.components()).sum()
    }

    pub fn stride(&self) -> wgpu::BufferAddress {
        self.attributes.iter().map(|a| a.size()).sum()
    }

    pub fn offset_of(&self, attribute: Attribute) -> Option<wgpu::BufferAddress> {
        let idx = self.attributes.iter().position(|a| *a == attribute)?;
        Some(self.attributes[..idx].iter().map(|a| a.size()).sum())
    }

    pub fn wgpu_attributes(&self) -> Vec<wgpu::VertexAttribute> {
        let mut offset = 0;
        self.attributes
            .iter()
            .map(|attribute| {
                let desc = wgpu::VertexAttribute {
                    offset,
                    shader_location: attribute.shader_location(),
                    format: attribute.format(),
                };
                offset += attribute.size();
                desc
            })
            .collect()
    }

    /// Buffer layout borrowing `attributes`, which should come from [`Self::wgpu_attributes`].
    pub fn desc<'a>(&self, attributes: &'a [wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}

/// Where the vertices of a new geometry come from.
#[derive(Clone, Copy, Debug)]
pub enum VertexSource<'a> {
    Data(&'a [f32]),
    /// Reuse the vertex buffer of an existing geometry.
    Shared(GeometryId),
}

#[derive(Clone, Debug)]
pub struct GeometryParams<'a> {
    pub label: &'a str,
    pub layout: VertexLayout,
    pub vertices: VertexSource<'a>,
    pub indices: Option<&'a [u32]>,
    pub material: MaterialId,
    pub backface_culled: bool,
}

impl<'a> GeometryParams<'a> {
    pub fn new(
        label: &'a str,
        layout: VertexLayout,
        vertices: VertexSource<'a>,
        material: MaterialId,
    ) -> Self {
        Self {
            label,
            layout,
            vertices,
            indices: None,
            material,
            backface_culled: true,
        }
    }

    pub fn with_indices(mut self, indices: &'a [u32]) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn with_backface_culling(mut self, culled: bool) -> Self {
        self.backface_culled = culled;
        self
    }
}

#[derive(Clone, Debug)]
pub struct Geometry {
    label: String,
    vertices: BufferId,
    indices: Option<BufferId>,
    vertex_count: u32,
    index_count: u32,
    layout: VertexLayout,
    material: MaterialId,
    pub backface_culled: bool,
}

impl Geometry {
    /// Builds a geometry, uploading its data through `upload` into `buffers`.
    ///
    /// `existing` are the geometries already known to the scene; a
    /// [`VertexSource::Shared`] id is resolved against it. Sharing requires
    /// an identical vertex layout.
    pub fn build<B>(
        params: GeometryParams<'_>,
        existing: &[Geometry],
        buffers: &mut BufferTable<B>,
        mut upload: impl FnMut(&str, &[u8], wgpu::BufferUsages) -> B,
    ) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidGeometry {
            label: params.label.to_string(),
            reason,
        };
        let (vertices, vertex_count) = match params.vertices {
            VertexSource::Data(data) => {
                let components = params.layout.components() as usize;
                if data.is_empty() || data.len() % components != 0 {
                    return Err(invalid(format!(
                        "{} floats do not form whole vertices of {} components",
                        data.len(),
                        components
                    )));
                }
                let label = format!("{} vertices", params.label);
                let buffer = upload(
                    &label,
                    bytemuck::cast_slice(data),
                    wgpu::BufferUsages::VERTEX,
                );
                (buffers.insert(buffer), (data.len() / components) as u32)
            }
            VertexSource::Shared(source) => {
                let shared = existing
                    .get(source.0)
                    .ok_or(Error::UnknownGeometry(source))?;
                if shared.layout != params.layout {
                    return Err(invalid(format!(
                        "cannot share the vertices of '{}' with a different layout",
                        shared.label
                    )));
                }
                (buffers.retain(shared.vertices)?, shared.vertex_count)
            }
        };

        let (indices, index_count) = match params.indices {
            Some(indices) => {
                if let Some(out_of_range) = indices.iter().find(|i| **i >= vertex_count) {
                    let reason = format!(
                        "index {} is out of range for {} vertices",
                        out_of_range, vertex_count
                    );
                    buffers.release(vertices);
                    return Err(invalid(reason));
                }
                let label = format!("{} indices", params.label);
                let buffer = upload(
                    &label,
                    bytemuck::cast_slice(indices),
                    wgpu::BufferUsages::INDEX,
                );
                (Some(buffers.insert(buffer)), indices.len() as u32)
            }
            None => (None, 0),
        };

        Ok(Self {
            label: params.label.to_string(),
            vertices,
            indices,
            vertex_count,
            index_count,
            layout: params.layout,
            material: params.material,
            backface_culled: params.backface_culled,
        })
    }

    /// Drops this geometry's hold on its buffers and returns the ones nobody holds anymore.
    pub fn release<B>(self, buffers: &mut BufferTable<B>) -> Vec<B> {
        std::iter::once(self.vertices)
            .chain(self.indices)
            .filter_map(|id| buffers.release(id))
            .collect()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn vertices(&self) -> BufferId {
        self.vertices
    }

    pub fn indices(&self) -> Option<BufferId> {
        self.indices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }
}
