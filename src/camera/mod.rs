//! Cameras and the GPU resources that feed them to shaders.
//!
//! # Key types
//!
//! - [`Camera`] holds viewport, field of view, clip planes, position and target and
//!   lazily recomputes its view and projection matrices
//! - [`fps::FpsCamera`] is a pitch/yaw rig that can drive a [`Camera`]
//! - [`controller::CameraController`] turns input into rig movement
//! - [`CameraResources`] owns the uniform buffers and bind group of group 0

pub mod controller;
pub mod fps;

use cgmath::{Deg, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3};
use instant::Duration;
use wgpu::util::DeviceExt;

use crate::{
    camera::{controller::CameraController, fps::FpsCamera},
    data_structures::cached::Cached,
    pipelines::basic::camera_layout,
};

/// cgmath produces OpenGL clip space (z in [-1, 1]); wgpu expects z in [0, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// World up, shared by every camera.
pub const UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

/// Region of the render target the scene is drawn into, in pixels.
///
/// `x` and `y` are measured from the bottom-left corner of the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }
}

/// Perspective camera with lazily recomputed matrices.
///
/// Setters only mark a matrix dirty when the stored value actually changes;
/// [`view`](Self::view) and [`projection`](Self::projection) recompute at most
/// once after any number of changes.
#[derive(Clone, Debug)]
pub struct Camera {
    viewport: Viewport,
    position: Point3<f32>,
    target: Point3<f32>,
    fov: Deg<f32>,
    aspect: f32,
    znear: f32,
    zfar: f32,
    view: Cached<Matrix4<f32>>,
    projection: Cached<Matrix4<f32>>,
}

impl Camera {
    /// Camera at the origin. Until a target is set it looks down -Z.
    pub fn new<F: Into<Deg<f32>>>(
        viewport: Viewport,
        fov: F,
        aspect: f32,
        znear: f32,
        zfar: f32,
    ) -> Self {
        Self {
            viewport,
            position: Point3::new(0.0, 0.0, 0.0),
            target: Point3::new(0.0, 0.0, 0.0),
            fov: fov.into(),
            aspect,
            znear,
            zfar,
            view: Cached::new(),
            projection: Cached::new(),
        }
    }

    pub fn set_pos(&mut self, position: impl Into<Point3<f32>>) {
        let position = position.into();
        if self.position != position {
            self.position = position;
            self.view.invalidate();
        }
    }

    pub fn set_look_at(&mut self, target: impl Into<Point3<f32>>) {
        let target = target.into();
        if self.target != target {
            self.target = target;
            self.view.invalidate();
        }
    }

    pub fn set_fov<F: Into<Deg<f32>>>(&mut self, fov: F) {
        let fov = fov.into();
        if self.fov != fov {
            self.fov = fov;
            self.projection.invalidate();
        }
    }

    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if self.aspect != aspect {
            self.aspect = aspect;
            self.projection.invalidate();
        }
    }

    pub fn set_clip_planes(&mut self, znear: f32, zfar: f32) {
        if self.znear != znear || self.zfar != zfar {
            self.znear = znear;
            self.zfar = zfar;
            self.projection.invalidate();
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Full-target viewport of `width` x `height` with the matching aspect ratio.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.set_viewport(Viewport::new(0, 0, width, height));
        if width > 0 && height > 0 {
            self.set_aspect_ratio(self.viewport.aspect_ratio());
        }
    }

    pub fn view(&mut self) -> Matrix4<f32> {
        let (eye, target) = (self.position, self.target);
        *self.view.get_or_update(|| look_at(eye, target))
    }

    pub fn projection(&mut self) -> Matrix4<f32> {
        let (fov, aspect, znear, zfar) = (self.fov, self.aspect, self.znear, self.zfar);
        *self
            .projection
            .get_or_update(|| cgmath::perspective(fov, aspect, znear, zfar))
    }

    pub fn view_projection(&mut self) -> Matrix4<f32> {
        self.projection() * self.view()
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    pub fn fov(&self) -> Deg<f32> {
        self.fov
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect
    }

    pub fn clip_planes(&self) -> (f32, f32) {
        (self.znear, self.zfar)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_view_dirty(&self) -> bool {
        self.view.is_dirty()
    }

    pub fn is_projection_dirty(&self) -> bool {
        self.projection.is_dirty()
    }

    pub fn view_recomputations(&self) -> u64 {
        self.view.recomputations()
    }

    pub fn projection_recomputations(&self) -> u64 {
        self.projection.recomputations()
    }
}

/// Camera state plus the group 0 uniforms (`u_view`, `u_projection`).
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub rig: FpsCamera,
    pub controller: CameraController,
    view_buffer: wgpu::Buffer,
    projection_buffer: wgpu::Buffer,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, mut camera: Camera) -> Self {
        let identity: [[f32; 4]; 4] = Matrix4::<f32>::identity().into();
        let view_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("View Buffer"),
            contents: bytemuck::bytes_of(&identity),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let projection: [[f32; 4]; 4] = (OPENGL_TO_WGPU_MATRIX * camera.projection()).into();
        let projection_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Projection Buffer"),
            contents: bytemuck::bytes_of(&projection),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = camera_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: view_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: projection_buffer.as_entire_binding(),
                },
            ],
            label: Some("camera_bind_group"),
        });
        let rig = rig_for(&camera);

        Self {
            camera,
            rig,
            controller: CameraController::new(),
            view_buffer,
            projection_buffer,
            bind_group_layout,
            bind_group,
        }
    }

    /// Re-seat the FPS rig on the camera's current position and target.
    pub fn sync_rig(&mut self) {
        self.rig = rig_for(&self.camera);
    }

    /// Advance the controller by one frame and push the rig into the camera.
    pub fn update(&mut self, dt: Duration) {
        self.controller.update(&mut self.rig, &mut self.camera, dt);
    }

    pub fn write_view(&self, queue: &wgpu::Queue, view: Matrix4<f32>) {
        let raw: [[f32; 4]; 4] = view.into();
        queue.write_buffer(&self.view_buffer, 0, bytemuck::bytes_of(&raw));
    }

    pub fn write_projection(&self, queue: &wgpu::Queue, projection: Matrix4<f32>) {
        let raw: [[f32; 4]; 4] = (OPENGL_TO_WGPU_MATRIX * projection).into();
        queue.write_buffer(&self.projection_buffer, 0, bytemuck::bytes_of(&raw));
    }
}

/// `look_at_rh` with `UP`, kept finite for degenerate directions.
///
/// A target on the eye looks down -Z. A target straight above or below the
/// eye uses +Z or -Z as up, which keeps screen-right along +X.
pub fn look_at(eye: Point3<f32>, target: Point3<f32>) -> Matrix4<f32> {
    let direction = target - eye;
    if direction.magnitude2() == 0.0 {
        return Matrix4::look_to_rh(eye, -Vector3::unit_z(), UP);
    }
    let up = if direction.normalize().cross(UP).magnitude2() < 1e-12 {
        Vector3::new(0.0, 0.0, direction.y.signum())
    } else {
        UP
    };
    Matrix4::look_at_rh(eye, target, up)
}

fn rig_for(camera: &Camera) -> FpsCamera {
    let facing = camera.target() - camera.position();
    // A camera looking at its own position has no direction yet.
    let facing = if facing.magnitude2() > 0.0 {
        facing
    } else {
        Vector3::new(0.0, 0.0, -1.0)
    };
    FpsCamera::new(UP, camera.position(), facing)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(Viewport::new(0, 0, 800, 600), Deg(45.0), 800.0 / 600.0, 0.1, 100.0)
    }

    #[test]
    fn viewport_aspect_ratio() {
        assert_eq!(Viewport::new(0, 0, 800, 400).aspect_ratio(), 2.0);
        assert_eq!(Viewport::new(0, 0, 800, 0).aspect_ratio(), 1.0);
    }

    #[test]
    fn resize_updates_aspect_once() {
        let mut camera = camera();
        camera.projection();
        camera.resize(1000, 500);
        assert_eq!(camera.viewport(), Viewport::new(0, 0, 1000, 500));
        assert_eq!(camera.aspect_ratio(), 2.0);
        assert!(camera.is_projection_dirty());
        camera.projection();
        camera.resize(1000, 500);
        assert!(!camera.is_projection_dirty());
        // minimised windows keep the last aspect ratio
        camera.resize(0, 0);
        assert_eq!(camera.aspect_ratio(), 2.0);
    }

    #[test]
    fn clip_planes_invalidate_projection() {
        let mut camera = camera();
        camera.projection();
        camera.set_clip_planes(0.1, 100.0);
        assert!(!camera.is_projection_dirty());
        camera.set_clip_planes(1.0, 100.0);
        assert!(camera.is_projection_dirty());
        assert_eq!(camera.clip_planes(), (1.0, 100.0));
    }

    #[test]
    fn rig_follows_camera_direction() {
        let mut camera = camera();
        camera.set_pos((0.0, 0.0, 3.0));
        let rig = rig_for(&camera);
        // camera looks at the origin, straight down -Z
        assert!((rig.front() - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-6);
        assert_eq!(rig.position(), Point3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn rig_for_top_down_camera_can_strafe() {
        let mut camera = camera();
        camera.set_pos((0.0, 5.0, 0.0));
        let mut rig = rig_for(&camera);
        assert_eq!(rig.pitch(), Deg(-fps::PITCH_LIMIT));
        let right = rig.right();
        assert!(right.x.is_finite() && right.y.is_finite() && right.z.is_finite());
        rig.update_movement(fps::Movement::Left, 0.1);
        let p = rig.position();
        assert!(p.x.is_finite() && p.y.is_finite() && p.z.is_finite());
    }

    #[test]
    fn rig_for_camera_on_its_target_faces_forward() {
        let mut camera = camera();
        camera.set_pos((1.0, 2.0, 3.0));
        camera.set_look_at((1.0, 2.0, 3.0));
        let rig = rig_for(&camera);
        assert!((rig.front() - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-6);
        assert_eq!(rig.pitch(), Deg(0.0));
    }
}
