//! Error types for asset loading, GPU setup and scene bookkeeping.
//!
//! Every loader fails fast: a shader that cannot be read, a texture that
//! cannot be decoded or an id that points nowhere is returned as an [`Error`]
//! instead of silently continuing with an empty handle.

use std::path::PathBuf;

use thiserror::Error;

use crate::data_structures::{
    buffer_table::BufferId, geometry::GeometryId, material::MaterialId, object::ObjectId,
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not read asset '{path}': {source}")]
    AssetRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Shader '{path}' is empty")]
    EmptyShader { path: PathBuf },

    #[error("Shader '{path}' does not declare the entry point `{entry_point}`")]
    MissingEntryPoint {
        path: PathBuf,
        entry_point: &'static str,
    },

    #[error("Could not decode texture '{path}': {source}")]
    TextureLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Invalid geometry '{label}': {reason}")]
    InvalidGeometry { label: String, reason: String },

    #[error("Unknown geometry {0:?}")]
    UnknownGeometry(GeometryId),

    #[error("Unknown material {0:?}")]
    UnknownMaterial(MaterialId),

    #[error("Unknown object {0:?}")]
    UnknownObject(ObjectId),

    #[error("Unknown buffer {0:?}")]
    UnknownBuffer(BufferId),

    #[error("Failed to create the window surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("Failed to request WGPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("Failed to create WGPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("Surface is not supported by the adapter")]
    UnsupportedSurface,

    #[error("Failed to create the window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("Reading back GPU memory failed: {0}")]
    ReadBack(String),
}

pub type Result<T> = std::result::Result<T, Error>;
