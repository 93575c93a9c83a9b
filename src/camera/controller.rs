//! Keyboard and mouse control of the FPS rig.
//!
//! Movement keys are tracked as held state and applied every frame with the
//! frame delta. Mouse-look reads raw mouse motion while the cursor is
//! captured, and cursor positions otherwise; the first cursor event only
//! records a reference position. Scrolling zooms by narrowing the field of view.

use std::collections::HashSet;

use cgmath::Deg;
use instant::Duration;
use winit::{event::ElementState, keyboard::KeyCode};

use crate::{
    camera::{
        Camera,
        fps::{FpsCamera, Movement},
    },
    input::InputEvent,
};

/// Narrowest field of view reachable by zooming, in degrees.
pub const ZOOM_MIN: f32 = 1.0;
/// Widest field of view reachable by zooming, in degrees.
pub const ZOOM_MAX: f32 = 45.0;

const MOVEMENTS: [Movement; 4] = [
    Movement::Forward,
    Movement::Backward,
    Movement::Left,
    Movement::Right,
];

pub fn movement_for(code: KeyCode) -> Option<Movement> {
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(Movement::Forward),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(Movement::Backward),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(Movement::Left),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(Movement::Right),
        _ => None,
    }
}

/// Field of view after scrolling by `scroll` lines.
pub fn zoom(fov: Deg<f32>, scroll: f32) -> Deg<f32> {
    Deg((fov.0 - scroll).clamp(ZOOM_MIN, ZOOM_MAX))
}

#[derive(Debug)]
pub struct CameraController {
    pressed: HashSet<KeyCode>,
    last_cursor: Option<(f64, f64)>,
    pending_pitch: f32,
    pending_yaw: f32,
    pending_zoom: f32,
    pub enabled: bool,
    /// Set while the window holds the cursor; see [`Context::capture_cursor`](crate::context::Context::capture_cursor).
    pub cursor_captured: bool,
}

impl CameraController {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            last_cursor: None,
            pending_pitch: 0.0,
            pending_yaw: 0.0,
            pending_zoom: 0.0,
            enabled: true,
            cursor_captured: false,
        }
    }

    /// Record `event`. Returns whether it was relevant to the camera.
    pub fn process_input(&mut self, event: &InputEvent) -> bool {
        match *event {
            InputEvent::Key { code, state } => {
                if movement_for(code).is_none() {
                    return false;
                }
                match state {
                    ElementState::Pressed => self.pressed.insert(code),
                    ElementState::Released => self.pressed.remove(&code),
                };
                true
            }
            // a captured cursor is pinned, only raw motion carries the look deltas
            InputEvent::CursorMoved { .. } if self.cursor_captured => {
                self.last_cursor = None;
                false
            }
            InputEvent::CursorMoved { x, y } => {
                if let Some((last_x, last_y)) = self.last_cursor {
                    self.pending_yaw += (x - last_x) as f32;
                    // screen y grows downwards
                    self.pending_pitch += (last_y - y) as f32;
                }
                self.last_cursor = Some((x, y));
                true
            }
            InputEvent::MouseMotion { dx, dy } if self.cursor_captured => {
                self.pending_yaw += dx as f32;
                self.pending_pitch -= dy as f32;
                true
            }
            InputEvent::Scroll { dy, .. } => {
                self.pending_zoom += dy;
                true
            }
            _ => false,
        }
    }

    pub fn is_moving(&self, movement: Movement) -> bool {
        self.pressed
            .iter()
            .any(|code| movement_for(*code) == Some(movement))
    }

    /// Apply everything recorded since the last update.
    ///
    /// The rig is pushed into `camera` only if it changed, so a camera placed
    /// by hand stays where it is until the user touches the controls.
    pub fn update(&mut self, rig: &mut FpsCamera, camera: &mut Camera, dt: Duration) -> bool {
        let (pitch, yaw, scroll) = (self.pending_pitch, self.pending_yaw, self.pending_zoom);
        self.pending_pitch = 0.0;
        self.pending_yaw = 0.0;
        self.pending_zoom = 0.0;
        if !self.enabled {
            return false;
        }

        let mut changed = false;
        if pitch != 0.0 || yaw != 0.0 {
            rig.update_rotation(pitch, yaw);
            changed = true;
        }
        for movement in MOVEMENTS {
            if self.is_moving(movement) {
                rig.update_movement(movement, dt.as_secs_f32());
                changed = true;
            }
        }
        if scroll != 0.0 {
            camera.set_fov(zoom(camera.fov(), scroll));
        }
        if changed {
            rig.apply_to(camera);
        }
        changed
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}
