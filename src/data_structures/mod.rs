//! Scene data: cached values, buffers, geometries, objects, materials and textures.
//!
//! - `cached` is a value with a validity flag, used for camera matrices
//! - `buffer_table` holds reference counted GPU buffers behind opaque ids
//! - `geometry` describes vertex/index data and its attribute layout
//! - `object` is a per-instance translate/rotate/scale transform
//! - `material` holds shader programs, resolved uniform slots and textures
//! - `texture` wraps GPU textures and sampler options
//! - `scene` pairs geometries with objects into drawable items

pub mod buffer_table;
pub mod cached;
pub mod geometry;
pub mod material;
pub mod object;
pub mod scene;
pub mod texture;
