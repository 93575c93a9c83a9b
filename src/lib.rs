//! scene-ngin
//!
//! A small retained-mode scene framework on top of wgpu. A scene is a list of
//! items, each pairing a geometry (vertex data plus a material) with an
//! optional object transform. The loop draws the items in insertion order
//! through a camera whose view and projection matrices are recomputed only
//! when one of their inputs changes.
//!
//! High-level modules
//! - `camera`: lazily cached camera, FPS rig and its input controller
//! - `capture`: offscreen targets and GPU read-back
//! - `context`: window-bound GPU context and the setup subset `InitContext`
//! - `data_structures`: geometries, objects, materials, textures and the scene
//! - `error`: the crate error type
//! - `flow`: the event loop and the `RenderEvents` listener trait
//! - `input`: input events forwarded to listeners
//! - `pipelines`: bind group layouts and the pipeline factory
//! - `render`: frame planning and encoding
//! - `resources`: shader and texture loading from the asset root
//! - `settings`: window and asset configuration
//!

pub mod camera;
pub mod capture;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod input;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod settings;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::event::{DeviceEvent, ElementState, WindowEvent};
pub use winit::keyboard::KeyCode;
pub use wgpu;
