//! First-person camera rig driven by pitch and yaw.

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Vector3};

use crate::{camera::Camera, data_structures::cached::Cached};

/// Units per second.
pub const SPEED: f32 = 2.0;
/// Degrees per unit of raw input.
pub const SENSITIVITY: f32 = 0.25;
/// Pitch stays within `[-PITCH_LIMIT, PITCH_LIMIT]` degrees.
pub const PITCH_LIMIT: f32 = 89.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
}

/// Position plus pitch/yaw orientation with a lazily rebuilt view matrix.
///
/// Angles are not validated: NaN or infinite input propagates into the
/// facing vector.
#[derive(Clone, Debug)]
pub struct FpsCamera {
    position: Point3<f32>,
    front: Vector3<f32>,
    up: Vector3<f32>,
    pitch: Deg<f32>,
    yaw: Deg<f32>,
    pub speed: f32,
    pub sensitivity: f32,
    view: Cached<Matrix4<f32>>,
}

impl FpsCamera {
    /// Rig at `position` facing along `facing`; pitch and yaw are derived from it.
    ///
    /// A facing steeper than the pitch limit is tilted back to the limit, so a
    /// rig looking straight up or down still has a usable right axis.
    pub fn new(
        up: Vector3<f32>,
        position: impl Into<Point3<f32>>,
        facing: impl Into<Vector3<f32>>,
    ) -> Self {
        let facing = facing.into().normalize();
        let pitch = clamp_pitch(Deg::from(cgmath::Rad(facing.y.asin())));
        let yaw = Deg::from(cgmath::Rad(facing.z.atan2(facing.x)));
        Self {
            position: position.into(),
            front: front(pitch, yaw),
            up,
            pitch,
            yaw,
            speed: SPEED,
            sensitivity: SENSITIVITY,
            view: Cached::new(),
        }
    }

    /// Accumulate scaled input deltas, clamp the pitch and recompute the facing vector.
    pub fn update_rotation(&mut self, delta_pitch: f32, delta_yaw: f32) {
        self.pitch += Deg(delta_pitch * self.sensitivity);
        self.yaw += Deg(delta_yaw * self.sensitivity);
        self.pitch = clamp_pitch(self.pitch);
        self.front = front(self.pitch, self.yaw);
        self.view.invalidate();
    }

    /// Move by `speed * delta_time` along the facing vector or the view's right axis.
    pub fn update_movement(&mut self, direction: Movement, delta_time: f32) {
        let amount = self.speed * delta_time;
        let offset = match direction {
            Movement::Forward => self.front * amount,
            Movement::Backward => -self.front * amount,
            Movement::Left => -self.right() * amount,
            Movement::Right => self.right() * amount,
        };
        self.position += offset;
        self.view.invalidate();
    }

    pub fn view_matrix(&mut self) -> Matrix4<f32> {
        let (eye, target, up) = (self.position, self.target(), self.up);
        *self.view.get_or_update(|| Matrix4::look_at_rh(eye, target, up))
    }

    /// First row of the view matrix.
    pub fn right(&mut self) -> Vector3<f32> {
        let view = self.view_matrix();
        Vector3::new(view.x.x, view.y.x, view.z.x)
    }

    pub fn set_position(&mut self, position: impl Into<Point3<f32>>) {
        let position = position.into();
        if self.position != position {
            self.position = position;
            self.view.invalidate();
        }
    }

    /// Push position and look-at target into `camera`.
    pub fn apply_to(&self, camera: &mut Camera) {
        camera.set_pos(self.position);
        camera.set_look_at(self.target());
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn target(&self) -> Point3<f32> {
        self.position + self.front
    }

    pub fn pitch(&self) -> Deg<f32> {
        self.pitch
    }

    pub fn yaw(&self) -> Deg<f32> {
        self.yaw
    }

    pub fn is_view_dirty(&self) -> bool {
        self.view.is_dirty()
    }

    pub fn view_recomputations(&self) -> u64 {
        self.view.recomputations()
    }
}

fn clamp_pitch(pitch: Deg<f32>) -> Deg<f32> {
    Deg(pitch.0.clamp(-PITCH_LIMIT, PITCH_LIMIT))
}

/// Unit facing vector for `pitch` and `yaw` (yaw 0 looks along +X).
fn front(pitch: Deg<f32>, yaw: Deg<f32>) -> Vector3<f32> {
    let (sin_pitch, cos_pitch) = cgmath::Rad::from(pitch).0.sin_cos();
    let (sin_yaw, cos_yaw) = cgmath::Rad::from(yaw).0.sin_cos();
    Vector3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch).normalize()
}
