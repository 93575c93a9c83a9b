//! Per-instance transforms.
//!
//! An [`Object`] is a translate / rotate / scale triple that knows nothing
//! about the geometry it is drawn with; the two are paired by a scene item.

use cgmath::{Matrix4, Rad, Vector3};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) usize);

/// Translation, Euler rotation in radians and scale of one drawable instance.
#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    pub translate: Vector3<f32>,
    /// Rotation around X, then Y, then Z, in radians.
    pub rotate: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Object {
    /// Identity transform.
    pub fn new() -> Self {
        Self {
            translate: Vector3::new(0.0, 0.0, 0.0),
            rotate: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn with_translate(mut self, translate: impl Into<Vector3<f32>>) -> Self {
        self.translate = translate.into();
        self
    }

    pub fn with_rotate(mut self, rotate: impl Into<Vector3<f32>>) -> Self {
        self.rotate = rotate.into();
        self
    }

    pub fn with_scale(mut self, scale: impl Into<Vector3<f32>>) -> Self {
        self.scale = scale.into();
        self
    }

    /// `T * Rx * Ry * Rz * S`
    pub fn model_matrix(&self) -> Matrix4<f32> {
        let rotation = Matrix4::from_angle_x(Rad(self.rotate.x))
            * Matrix4::from_angle_y(Rad(self.rotate.y))
            * Matrix4::from_angle_z(Rad(self.rotate.z));
        Matrix4::from_translation(self.translate)
            * rotation
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}
