//! The retained scene: items drawn in insertion order.
//!
//! # Key types
//!
//! - [`Item`] pairs a geometry with an optional object transform
//! - [`Scene`] owns geometries, objects, materials and the shared buffer table

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        buffer_table::{BufferId, BufferTable},
        geometry::{Geometry, GeometryId, GeometryParams},
        material::{Material, MaterialId, PipelineKey},
        object::{Object, ObjectId},
    },
    error::{Error, Result},
};

/// One draw: a geometry, optionally placed by an object.
///
/// Items without an object are drawn with the identity model matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Item {
    pub geometry: GeometryId,
    pub object: Option<ObjectId>,
}

#[derive(Debug)]
pub struct Scene {
    pub background: wgpu::Color,
    items: Vec<Item>,
    geometries: Vec<Geometry>,
    objects: Vec<Object>,
    materials: Vec<Material>,
    buffers: BufferTable<wgpu::Buffer>,
}

impl Scene {
    pub fn new(background: wgpu::Color) -> Self {
        Self {
            background,
            items: Vec::new(),
            geometries: Vec::new(),
            objects: Vec::new(),
            materials: Vec::new(),
            buffers: BufferTable::new(),
        }
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    /// Upload a geometry's buffers. Its material must already be part of the scene.
    pub fn add_geometry(
        &mut self,
        device: &wgpu::Device,
        params: GeometryParams<'_>,
    ) -> Result<GeometryId> {
        if params.material.0 >= self.materials.len() {
            return Err(Error::UnknownMaterial(params.material));
        }
        let upload = |label: &str, contents: &[u8], usage| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            })
        };
        let geometry = Geometry::build(params, &self.geometries, &mut self.buffers, upload)?;
        log::debug!(
            "geometry '{}': {} vertices, {} indices",
            geometry.label(),
            geometry.vertex_count(),
            geometry.index_count()
        );
        self.geometries.push(geometry);
        Ok(GeometryId(self.geometries.len() - 1))
    }

    pub fn add_object(&mut self, object: Object) -> ObjectId {
        self.objects.push(object);
        ObjectId(self.objects.len() - 1)
    }

    /// Append an item; items are drawn in the order they were added.
    pub fn add(&mut self, geometry: GeometryId, object: Option<ObjectId>) -> Result<usize> {
        if geometry.0 >= self.geometries.len() {
            return Err(Error::UnknownGeometry(geometry));
        }
        if let Some(object) = object {
            if object.0 >= self.objects.len() {
                return Err(Error::UnknownObject(object));
            }
        }
        self.items.push(Item { geometry, object });
        Ok(self.items.len() - 1)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    pub fn geometry_mut(&mut self, id: GeometryId) -> Option<&mut Geometry> {
        self.geometries.get_mut(id.0)
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(id.0)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0)
    }

    pub(crate) fn materials_mut(&mut self) -> &mut [Material] {
        &mut self.materials
    }

    pub fn buffer(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        self.buffers.get(id)
    }

    /// Material and pipeline variant every item needs, in item order.
    pub(crate) fn pipeline_keys(&self) -> Vec<(MaterialId, PipelineKey)> {
        self.items
            .iter()
            .filter_map(|item| self.geometries.get(item.geometry.0))
            .map(|geometry| {
                (
                    geometry.material(),
                    PipelineKey {
                        layout: geometry.layout().clone(),
                        backface_culled: geometry.backface_culled,
                    },
                )
            })
            .collect()
    }

    /// Release every geometry's buffers. The scene is empty afterwards.
    pub fn teardown(&mut self) {
        self.items.clear();
        let released: usize = self
            .geometries
            .drain(..)
            .map(|geometry| geometry.release(&mut self.buffers).len())
            .sum();
        log::info!("scene teardown released {} buffers", released);
        self.objects.clear();
        self.materials.clear();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(wgpu::Color::BLACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn items_reference_existing_geometry_and_objects() {
        let mut scene = Scene::default();
        let err = scene.add(GeometryId(0), None).unwrap_err();
        assert!(matches!(err, Error::UnknownGeometry(GeometryId(0))));
        assert!(scene.items().is_empty());
    }

    #[test]
    fn objects_are_addressed_by_id() {
        let mut scene = Scene::default();
        let a = scene.add_object(Object::new());
        let b = scene.add_object(Object::new().with_translate([1.0, 0.0, 0.0]));
        assert_ne!(a, b);
        scene.object_mut(a).unwrap().scale = Vector3::new(2.0, 2.0, 2.0);
        assert_eq!(scene.objects()[0].scale, Vector3::new(2.0, 2.0, 2.0));
        assert_eq!(scene.objects()[1].translate, Vector3::new(1.0, 0.0, 0.0));
        assert!(scene.object_mut(ObjectId(5)).is_none());
    }

    #[test]
    fn teardown_empties_the_scene() {
        let mut scene = Scene::default();
        scene.add_object(Object::new());
        scene.teardown();
        assert!(scene.objects().is_empty());
        assert!(scene.geometries().is_empty());
    }
}
