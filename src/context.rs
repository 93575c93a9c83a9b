//! Window-bound GPU context.
//!
//! [`Context`] owns the surface, device, queue, depth buffer and the camera
//! uniforms. [`InitContext`] is the cheap subset handed to scene setup.

use std::{path::PathBuf, sync::Arc};

use cgmath::Deg;
use winit::window::{CursorGrabMode, Window};

use crate::{
    camera::{Camera, CameraResources, Viewport},
    data_structures::texture::Texture,
    error::{Error, Result},
    settings::Settings,
};

/// Default perspective for a fresh window.
const FOV: Deg<f32> = Deg(45.0);
const ZNEAR: f32 = 0.1;
const ZFAR: f32 = 100.0;

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub settings: Settings,
    should_close: bool,
}

impl Context {
    pub async fn new(window: Arc<Window>, settings: Settings) -> Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window.clone())?;
        let (adapter, device, queue) = request_device(&instance, Some(&surface)).await?;

        let mut config = surface
            .get_default_config(&adapter, size.width.max(1), size.height.max(1))
            .ok_or(Error::UnsupportedSurface)?;
        // Shaders write linear colour and expect the surface to encode sRGB
        let surface_caps = surface.get_capabilities(&adapter);
        if let Some(format) = surface_caps.formats.iter().copied().find(|f| f.is_srgb()) {
            config.format = format;
        }
        config.present_mode = if settings.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        surface.configure(&device, &config);
        log::info!(
            "surface {}x{} {:?} on {}",
            config.width,
            config.height,
            config.format,
            adapter.get_info().name
        );

        let viewport = Viewport::new(0, 0, config.width, config.height);
        let mut camera = Camera::new(viewport, FOV, viewport.aspect_ratio(), ZNEAR, ZFAR);
        // back from the origin, looking down -Z
        camera.set_pos((0.0, 0.0, 3.0));
        camera.set_look_at((0.0, 0.0, 0.0));
        let camera = CameraResources::new(&device, camera);

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera,
            settings,
            should_close: false,
        })
    }

    /// Reconfigure the surface and depth buffer. Zero sizes (minimised window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
        self.camera.camera.resize(width, height);
    }

    /// Ask the loop to terminate after the current event.
    pub fn request_close(&mut self) {
        self.should_close = true;
    }

    pub fn should_close(&self) -> bool {
        self.should_close
    }

    /// Lock and hide the cursor, or release it.
    ///
    /// Falls back to confining the cursor on platforms without pointer lock.
    /// Mouse-look follows: raw motion while captured, cursor positions otherwise.
    pub fn capture_cursor(&mut self, capture: bool) {
        let captured = capture
            && match self
                .window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined))
            {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("cursor capture unavailable: {}", e);
                    false
                }
            };
        if !captured {
            if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::None) {
                log::warn!("could not release the cursor: {}", e);
            }
        }
        self.window.set_cursor_visible(!captured);
        self.camera.controller.cursor_captured = captured;
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn asset_root(&self) -> &std::path::Path {
        &self.settings.asset_root
    }
}

/// Adapter, device and queue, optionally compatible with `surface`.
///
/// Passing no surface gives a headless device, which is what offscreen
/// rendering and the golden image tests use.
pub async fn request_device(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'_>>,
) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue)> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await?;
    log::info!("device and queue");
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            ..Default::default()
        })
        .await?;
    Ok((adapter, device, queue))
}

/// What scene setup needs from the [`Context`]: GPU handles and where to
/// read assets from.
#[derive(Debug, Clone)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub format: wgpu::TextureFormat,
    pub asset_root: PathBuf,
}

impl From<&Context> for InitContext {
    fn from(value: &Context) -> Self {
        Self {
            device: value.device.clone(),
            queue: value.queue.clone(),
            format: value.config.format,
            asset_root: value.settings.asset_root.clone(),
        }
    }
}
