/**
 * This module contains all logic for loading shaders and textures from the asset root.
 */
use std::path::{Path, PathBuf};

use crate::{
    data_structures::texture::{SamplerOptions, Texture},
    error::{Error, Result},
};

pub fn asset_path(root: &Path, file_name: &str) -> PathBuf {
    root.join(file_name)
}

pub async fn load_string(root: &Path, file_name: &str) -> Result<String> {
    let path = asset_path(root, file_name);
    log::debug!("loading {}", path.display());
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| Error::AssetRead { path, source })
}

pub async fn load_binary(root: &Path, file_name: &str) -> Result<Vec<u8>> {
    let path = asset_path(root, file_name);
    log::debug!("loading {}", path.display());
    tokio::fs::read(&path)
        .await
        .map_err(|source| Error::AssetRead { path, source })
}

/// Load a WGSL source and check that it declares `entry_point`.
pub async fn load_shader_source(
    root: &Path,
    file_name: &str,
    entry_point: &'static str,
) -> Result<String> {
    let source = load_string(root, file_name).await?;
    validate_shader_source(&asset_path(root, file_name), &source, entry_point)?;
    Ok(source)
}

pub fn validate_shader_source(path: &Path, source: &str, entry_point: &'static str) -> Result<()> {
    if source.trim().is_empty() {
        return Err(Error::EmptyShader {
            path: path.to_path_buf(),
        });
    }
    let declared = source.split("fn").skip(1).any(|rest| {
        let rest = rest.trim_start();
        rest.strip_prefix(entry_point)
            .is_some_and(|after| after.trim_start().starts_with('('))
    });
    if !declared {
        return Err(Error::MissingEntryPoint {
            path: path.to_path_buf(),
            entry_point,
        });
    }
    Ok(())
}

pub async fn load_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    root: &Path,
    file_name: &str,
    options: SamplerOptions,
) -> Result<Texture> {
    let data = load_binary(root, file_name).await?;
    Texture::from_bytes(device, queue, &data, file_name, options).map_err(|source| {
        Error::TextureLoad {
            path: asset_path(root, file_name),
            source,
        }
    })
}
