//! Input events forwarded to scene listeners.
//!
//! Window and device events from winit are reduced to the handful of
//! [`InputEvent`]s the framework reacts to.

use winit::{
    event::{DeviceEvent, ElementState, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

/// Pixels that count as one line of scrolling on touchpads.
const PIXELS_PER_LINE: f64 = 40.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Key { code: KeyCode, state: ElementState },
    CursorMoved { x: f64, y: f64 },
    MouseMotion { dx: f64, dy: f64 },
    Scroll { dx: f32, dy: f32 },
    Resized { width: u32, height: u32 },
}

impl InputEvent {
    pub fn from_window_event(event: &WindowEvent) -> Option<Self> {
        match event {
            WindowEvent::KeyboardInput { event, .. } => match event.physical_key {
                PhysicalKey::Code(code) => Some(Self::Key {
                    code,
                    state: event.state,
                }),
                PhysicalKey::Unidentified(_) => None,
            },
            WindowEvent::CursorMoved { position, .. } => Some(Self::CursorMoved {
                x: position.x,
                y: position.y,
            }),
            WindowEvent::MouseWheel { delta, .. } => Some(scroll(delta)),
            WindowEvent::Resized(size) => Some(Self::Resized {
                width: size.width,
                height: size.height,
            }),
            _ => None,
        }
    }

    pub fn from_device_event(event: &DeviceEvent) -> Option<Self> {
        match event {
            DeviceEvent::MouseMotion { delta: (dx, dy) } => Some(Self::MouseMotion { dx: *dx, dy: *dy }),
            _ => None,
        }
    }

    pub fn is_escape(&self) -> bool {
        matches!(
            self,
            Self::Key {
                code: KeyCode::Escape,
                state: ElementState::Pressed,
            }
        )
    }
}

fn scroll(delta: &MouseScrollDelta) -> InputEvent {
    match delta {
        MouseScrollDelta::LineDelta(dx, dy) => InputEvent::Scroll { dx: *dx, dy: *dy },
        MouseScrollDelta::PixelDelta(position) => InputEvent::Scroll {
            dx: (position.x / PIXELS_PER_LINE) as f32,
            dy: (position.y / PIXELS_PER_LINE) as f32,
        },
    }
}
