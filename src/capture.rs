//! Offscreen targets and GPU read-back.
//!
//! Used by the golden image tests: render into an [`Offscreen`] target, then
//! copy it back into an [`image::RgbaImage`].

use instant::Duration;

use crate::{
    data_structures::texture::Texture,
    error::{Error, Result},
};

/// Colour and depth textures that are not tied to a window.
#[derive(Debug)]
pub struct Offscreen {
    pub color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth: Texture,
    pub width: u32,
    pub height: u32,
}

impl Offscreen {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Output Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth = Texture::create_depth_texture(device, [width, height], "offscreen_depth");
        Self {
            color,
            color_view,
            depth,
            width,
            height,
        }
    }
}

/// Bytes per row padded to what texture-to-buffer copies require.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Copy an RGBA8 texture of `width` x `height` back to the CPU.
pub async fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
) -> Result<image::RgbaImage> {
    let padded_row = padded_bytes_per_row(width);
    let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        size: (padded_row * height) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        label: Some("Read-back Buffer"),
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Read-back Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    let buffer_slice = output_buffer.slice(..);
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        // the receiver only disappears if the caller gave up waiting
        let _ = tx.send(result);
    });
    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(Duration::from_secs(3)),
        })
        .map_err(|e| Error::ReadBack(e.to_string()))?;
    rx.receive()
        .await
        .ok_or_else(|| Error::ReadBack("map callback was dropped".to_string()))?
        .map_err(|e| Error::ReadBack(e.to_string()))?;

    let data = buffer_slice.get_mapped_range();
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for row in data.chunks(padded_row as usize) {
        pixels.extend_from_slice(&row[..(width * 4) as usize]);
    }
    drop(data);
    output_buffer.unmap();

    image::RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| Error::ReadBack("read-back buffer is too small".to_string()))
}
