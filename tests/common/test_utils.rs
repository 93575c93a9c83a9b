use scene_ngin::{
    Deg, InnerSpace, Matrix4, Point3, Vector3,
    camera::{Camera, Viewport},
};

pub(crate) const EPSILON: f32 = 1e-5;

/// 800x600 camera with a 45 degree field of view.
pub(crate) fn camera() -> Camera {
    Camera::new(
        Viewport::new(0, 0, 800, 600),
        Deg(45.0),
        800.0 / 600.0,
        0.1,
        100.0,
    )
}

pub(crate) fn assert_vec_eq(actual: Vector3<f32>, expected: Vector3<f32>) {
    assert!(
        (actual - expected).magnitude() < EPSILON,
        "{:?} != {:?}",
        actual,
        expected
    );
}

pub(crate) fn assert_point_eq(actual: Point3<f32>, expected: Point3<f32>) {
    assert_vec_eq(actual - Point3::new(0.0, 0.0, 0.0), expected - Point3::new(0.0, 0.0, 0.0));
}

pub(crate) fn assert_matrix_eq(actual: Matrix4<f32>, expected: Matrix4<f32>) {
    let a: [[f32; 4]; 4] = actual.into();
    let e: [[f32; 4]; 4] = expected.into();
    for (col_a, col_e) in a.iter().zip(e.iter()) {
        for (x, y) in col_a.iter().zip(col_e.iter()) {
            assert!((x - y).abs() < EPSILON, "{:?} != {:?}", actual, expected);
        }
    }
}

/// A device without a window, or `None` if this machine has no usable adapter.
#[cfg(feature = "integration-tests")]
pub(crate) async fn headless() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::default();
    match scene_ngin::context::request_device(&instance, None).await {
        Ok((_, device, queue)) => Some((device, queue)),
        Err(e) => {
            eprintln!("skipping GPU test: {}", e);
            None
        }
    }
}
