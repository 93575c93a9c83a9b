use instant::Duration;
use scene_ngin::{
    Deg, ElementState, KeyCode, Point3,
    camera::{
        UP,
        controller::{CameraController, ZOOM_MAX, ZOOM_MIN, movement_for, zoom},
        fps::{FpsCamera, Movement, SPEED},
    },
    input::InputEvent,
};

use crate::common::test_utils::{assert_point_eq, camera};

mod common;

fn rig() -> FpsCamera {
    FpsCamera::new(UP, (0.0, 0.0, 3.0), (0.0, 0.0, -1.0))
}

fn key(code: KeyCode, state: ElementState) -> InputEvent {
    InputEvent::Key { code, state }
}

#[test]
fn maps_wasd_and_arrows() {
    assert_eq!(movement_for(KeyCode::KeyW), Some(Movement::Forward));
    assert_eq!(movement_for(KeyCode::ArrowDown), Some(Movement::Backward));
    assert_eq!(movement_for(KeyCode::KeyA), Some(Movement::Left));
    assert_eq!(movement_for(KeyCode::ArrowRight), Some(Movement::Right));
    assert_eq!(movement_for(KeyCode::KeyE), None);
}

#[test]
fn first_cursor_event_only_records_the_position() {
    let mut controller = CameraController::new();
    let (mut rig, mut camera) = (rig(), camera());
    assert!(controller.process_input(&InputEvent::CursorMoved { x: 400.0, y: 300.0 }));
    assert!(!controller.update(&mut rig, &mut camera, Duration::from_millis(16)));
    assert!((rig.yaw().0 + 90.0).abs() < 1e-4);
    assert!(rig.pitch().0.abs() < 1e-6);
}

#[test]
fn cursor_y_is_inverted() {
    let mut controller = CameraController::new();
    let (mut rig, mut camera) = (rig(), camera());
    controller.process_input(&InputEvent::CursorMoved { x: 400.0, y: 300.0 });
    // right and up on screen
    controller.process_input(&InputEvent::CursorMoved { x: 410.0, y: 290.0 });
    assert!(controller.update(&mut rig, &mut camera, Duration::from_millis(16)));
    assert!((rig.pitch().0 - 10.0 * rig.sensitivity).abs() < 1e-4);
    assert!((rig.yaw().0 - (-90.0 + 10.0 * rig.sensitivity)).abs() < 1e-4);
    assert_eq!(camera.target(), rig.target());
}

#[test]
fn zoom_is_clamped() {
    assert_eq!(zoom(Deg(45.0), 1.0), Deg(44.0));
    assert_eq!(zoom(Deg(2.0), 5.0), Deg(ZOOM_MIN));
    assert_eq!(zoom(Deg(44.0), -10.0), Deg(ZOOM_MAX));
}

#[test]
fn scrolling_narrows_the_camera_fov() {
    let mut controller = CameraController::new();
    let (mut rig, mut camera) = (rig(), camera());
    controller.process_input(&InputEvent::Scroll { dx: 0.0, dy: 2.0 });
    controller.update(&mut rig, &mut camera, Duration::ZERO);
    assert_eq!(camera.fov(), Deg(43.0));
    assert!(camera.is_projection_dirty());
}

#[test]
fn held_keys_move_every_frame() {
    let mut controller = CameraController::new();
    let (mut rig, mut camera) = (rig(), camera());
    assert!(controller.process_input(&key(KeyCode::KeyW, ElementState::Pressed)));
    assert!(controller.is_moving(Movement::Forward));

    let dt = Duration::from_millis(500);
    controller.update(&mut rig, &mut camera, dt);
    controller.update(&mut rig, &mut camera, dt);
    let expected = Point3::new(0.0, 0.0, 3.0 - 2.0 * SPEED * 0.5);
    assert_point_eq(rig.position(), expected);
    assert_point_eq(camera.position(), expected);

    controller.process_input(&key(KeyCode::KeyW, ElementState::Released));
    assert!(!controller.update(&mut rig, &mut camera, dt));
    assert_point_eq(rig.position(), expected);
}

#[test]
fn idle_controller_leaves_the_camera_alone() {
    let mut controller = CameraController::new();
    let (mut rig, mut camera) = (rig(), camera());
    camera.set_pos((5.0, 5.0, 5.0));
    assert!(!controller.process_input(&key(KeyCode::KeyE, ElementState::Pressed)));
    assert!(!controller.update(&mut rig, &mut camera, Duration::from_millis(16)));
    assert_eq!(camera.position(), Point3::new(5.0, 5.0, 5.0));
}

#[test]
fn disabled_controller_drops_input() {
    let mut controller = CameraController::new();
    controller.enabled = false;
    let (mut rig, mut camera) = (rig(), camera());
    controller.process_input(&key(KeyCode::KeyD, ElementState::Pressed));
    assert!(!controller.update(&mut rig, &mut camera, Duration::from_secs(1)));
    assert_eq!(rig.position(), Point3::new(0.0, 0.0, 3.0));
}

#[test]
fn captured_cursor_looks_with_raw_motion() {
    let mut controller = CameraController::new();
    controller.cursor_captured = true;
    let (mut rig, mut camera) = (rig(), camera());
    // pinned cursor positions carry no look deltas
    assert!(!controller.process_input(&InputEvent::CursorMoved { x: 400.0, y: 300.0 }));
    assert!(!controller.process_input(&InputEvent::CursorMoved { x: 900.0, y: 0.0 }));
    // right and up, as raw device deltas
    assert!(controller.process_input(&InputEvent::MouseMotion { dx: 8.0, dy: -4.0 }));
    assert!(controller.process_input(&InputEvent::MouseMotion { dx: 2.0, dy: 0.0 }));
    assert!(controller.update(&mut rig, &mut camera, Duration::from_millis(16)));
    assert!((rig.pitch().0 - 4.0 * rig.sensitivity).abs() < 1e-4);
    assert!((rig.yaw().0 - (-90.0 + 10.0 * rig.sensitivity)).abs() < 1e-4);
    assert_eq!(camera.target(), rig.target());
}

#[test]
fn free_cursor_ignores_raw_motion() {
    let mut controller = CameraController::new();
    let (mut rig, mut camera) = (rig(), camera());
    assert!(!controller.process_input(&InputEvent::MouseMotion { dx: 50.0, dy: 50.0 }));
    assert!(!controller.update(&mut rig, &mut camera, Duration::from_millis(16)));
    assert!(rig.pitch().0.abs() < 1e-6);
}
