use scene_ngin::{Deg, Matrix4, Point3, Transform, Vector3, camera::Viewport};

use crate::common::test_utils::{assert_matrix_eq, assert_point_eq, camera};

mod common;

#[test]
fn view_matches_fresh_look_at_of_last_values() {
    let mut camera = camera();
    let positions: [(f32, f32, f32); 3] = [(0.0, 0.0, 3.0), (1.0, 2.0, 3.0), (-4.0, 0.5, 2.0)];
    let targets: [(f32, f32, f32); 3] = [(0.0, 0.0, 0.0), (0.0, 1.0, -1.0), (2.0, 0.0, 0.0)];
    for (position, target) in positions.into_iter().zip(targets) {
        camera.set_pos(position);
        camera.set_look_at(target);
        let expected = Matrix4::look_at_rh(
            Point3::from(position),
            Point3::from(target),
            Vector3::unit_y(),
        );
        assert_matrix_eq(camera.view(), expected);
    }
}

#[test]
fn view_is_recomputed_once_per_change() {
    let mut camera = camera();
    camera.set_pos((0.0, 0.0, 3.0));
    camera.set_pos((0.0, 1.0, 3.0));
    camera.set_look_at((0.0, 1.0, 0.0));
    assert!(camera.is_view_dirty());

    let first = camera.view();
    assert_eq!(camera.view_recomputations(), 1);
    assert!(!camera.is_view_dirty());
    let second = camera.view();
    assert_eq!(camera.view_recomputations(), 1);
    assert_eq!(first, second);
}

#[test]
fn setting_current_values_is_a_no_op() {
    let mut camera = camera();
    camera.set_pos((0.0, 0.0, 3.0));
    camera.view();
    camera.projection();

    camera.set_pos((0.0, 0.0, 3.0));
    camera.set_look_at((0.0, 0.0, 0.0));
    camera.set_fov(Deg(45.0));
    camera.set_aspect_ratio(800.0 / 600.0);
    camera.set_clip_planes(0.1, 100.0);
    assert!(!camera.is_view_dirty());
    assert!(!camera.is_projection_dirty());

    camera.view();
    camera.projection();
    assert_eq!(camera.view_recomputations(), 1);
    assert_eq!(camera.projection_recomputations(), 1);
}

#[test]
fn fov_change_recomputes_projection_once() {
    let mut camera = camera();
    camera.set_pos((0.0, 0.0, 0.0));
    camera.set_look_at((0.0, 0.0, -1.0));
    camera.projection();
    let before = camera.projection_recomputations();

    camera.set_fov(Deg(90.0));
    assert!(camera.is_projection_dirty());
    let first = camera.projection();
    assert_eq!(camera.projection_recomputations(), before + 1);
    assert!(!camera.is_projection_dirty());

    let second = camera.projection();
    assert_eq!(camera.projection_recomputations(), before + 1);
    let (first, second): ([[f32; 4]; 4], [[f32; 4]; 4]) = (first.into(), second.into());
    for (a, b) in first.iter().flatten().zip(second.iter().flatten()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
    assert_matrix_eq(
        Matrix4::from(first),
        scene_ngin::perspective(Deg(90.0), 800.0 / 600.0, 0.1, 100.0),
    );
}

#[test]
fn view_changes_leave_projection_alone() {
    let mut camera = camera();
    camera.projection();
    camera.set_pos((5.0, 5.0, 5.0));
    assert!(camera.is_view_dirty());
    assert!(!camera.is_projection_dirty());
}

#[test]
fn resize_follows_the_window() {
    let mut camera = camera();
    camera.resize(1024, 512);
    assert_eq!(camera.viewport(), Viewport::new(0, 0, 1024, 512));
    assert_eq!(camera.aspect_ratio(), 2.0);
    assert!(camera.is_projection_dirty());
}

fn assert_finite(m: Matrix4<f32>) {
    let raw: [[f32; 4]; 4] = m.into();
    assert!(raw.iter().flatten().all(|v| v.is_finite()), "{:?}", m);
}

#[test]
fn camera_on_its_target_looks_down_negative_z() {
    let mut camera = camera();
    assert_finite(camera.view());
    camera.set_pos((1.0, 2.0, 3.0));
    camera.set_look_at((1.0, 2.0, 3.0));
    let view = camera.view();
    assert_finite(view);
    assert_matrix_eq(
        view,
        Matrix4::look_to_rh(Point3::new(1.0, 2.0, 3.0), -Vector3::unit_z(), Vector3::unit_y()),
    );
}

#[test]
fn camera_straight_above_its_target() {
    let mut camera = camera();
    camera.set_pos((0.0, 5.0, 0.0));
    camera.set_look_at((0.0, 0.0, 0.0));
    let view = camera.view();
    assert_finite(view);
    // the target lands in front of the eye, screen-right stays +X
    assert_point_eq(view.transform_point(Point3::new(0.0, 0.0, 0.0)), Point3::new(0.0, 0.0, -5.0));
    assert_point_eq(view.transform_point(Point3::new(1.0, 5.0, 0.0)), Point3::new(1.0, 0.0, 0.0));

    camera.set_pos((0.0, -5.0, 0.0));
    let view = camera.view();
    assert_finite(view);
    assert_point_eq(view.transform_point(Point3::new(1.0, -5.0, 0.0)), Point3::new(1.0, 0.0, 0.0));
}
