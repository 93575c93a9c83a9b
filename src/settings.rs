//! Application settings: window, clear colour and where assets are read from.

use std::{ffi::OsString, path::PathBuf};

/// Environment variable that overrides the asset root.
pub const ASSET_ROOT_ENV: &str = "SCENE_NGIN_ASSETS";
pub const DEFAULT_ASSET_ROOT: &str = "./assets";

#[derive(Clone, Debug, PartialEq)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    /// Hide and lock the cursor to the window for mouse-look.
    pub capture_cursor: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "scene-ngin".to_string(),
            width: 800,
            height: 600,
            resizable: false,
            capture_cursor: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub window: WindowSettings,
    /// Background colour used when the scene does not set its own.
    pub clear_colour: wgpu::Color,
    pub asset_root: PathBuf,
    pub vsync: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            clear_colour: wgpu::Color {
                r: 0.2,
                g: 0.3,
                b: 0.3,
                a: 1.0,
            },
            asset_root: asset_root_from(std::env::var_os(ASSET_ROOT_ENV)),
            vsync: true,
        }
    }
}

impl Settings {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.window.width = width;
        self.window.height = height;
        self
    }

    pub fn with_cursor_capture(mut self, capture: bool) -> Self {
        self.window.capture_cursor = capture;
        self
    }

    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }
}

/// Resolves the asset root from the value of [`ASSET_ROOT_ENV`].
///
/// An unset or empty variable falls back to [`DEFAULT_ASSET_ROOT`].
pub fn asset_root_from(var: Option<OsString>) -> PathBuf {
    match var {
        Some(root) if !root.is_empty() => PathBuf::from(root),
        _ => PathBuf::from(DEFAULT_ASSET_ROOT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_root_falls_back_to_local_assets() {
        assert_eq!(asset_root_from(None), PathBuf::from("./assets"));
        assert_eq!(asset_root_from(Some(OsString::new())), PathBuf::from("./assets"));
    }

    #[test]
    fn asset_root_uses_env_value() {
        let root = asset_root_from(Some(OsString::from("/opt/scene/assets")));
        assert_eq!(root, PathBuf::from("/opt/scene/assets"));
    }

    #[test]
    fn builder_overrides_window() {
        let settings = Settings::default()
            .with_title("cubes")
            .with_size(1024, 768)
            .with_asset_root("demo-assets")
            .with_cursor_capture(false);
        assert_eq!(settings.window.title, "cubes");
        assert_eq!((settings.window.width, settings.window.height), (1024, 768));
        assert!(!settings.window.resizable);
        assert!(!settings.window.capture_cursor);
        assert!(WindowSettings::default().capture_cursor);
        assert_eq!(settings.asset_root, PathBuf::from("demo-assets"));
    }
}
