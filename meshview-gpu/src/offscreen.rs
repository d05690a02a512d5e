//! Offscreen rendering and frame readback
//!
//! Draws a scene into a texture instead of a window and copies the pixels
//! back to the CPU. Rows in the copy buffer are padded to wgpu's row
//! alignment and stripped again on the way out.

use crate::camera;
use crate::device::GpuContext;
use crate::overlay::OverlayRenderer;
use crate::renderer::SceneRenderer;
use meshview_core::{CameraSpec, Error, Result, RgbaFrame, Scene};

/// Format of offscreen targets; matches what PNG encoders expect.
pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Render the scene at the given pixel size and read the frame back.
pub fn render_offscreen(
    context: &GpuContext,
    renderer: &mut SceneRenderer,
    overlay: &mut OverlayRenderer,
    scene: &Scene,
    camera_spec: &CameraSpec,
    size: [u32; 2],
) -> Result<RgbaFrame> {
    if size[0] == 0 || size[1] == 0 {
        return Err(Error::Render("Frame size must be nonzero".to_string()));
    }

    let texture = context.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Target"),
        size: wgpu::Extent3d {
            width: size[0],
            height: size[1],
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: OFFSCREEN_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let target = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let aspect = size[0] as f32 / size[1] as f32;
    let radius = scene
        .bounds()
        .map(|(min, max)| ((max - min).norm() * 0.5).max(1e-3))
        .unwrap_or(1.0);
    let distance = (camera_spec.position - camera_spec.focal_point).norm();
    let (near, far) = camera::clip_planes(distance, radius);
    renderer.update_camera(
        context,
        camera::view_matrix(camera_spec),
        camera::projection_matrix(aspect, near, far),
        camera_spec.position.coords,
    );

    let mut encoder = context
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Offscreen Encoder"),
        });
    renderer.render(context, &mut encoder, &target, scene, size);
    overlay.draw(context, &mut encoder, &target, scene, camera_spec, size);

    let bytes_per_row = pad_bytes_per_row(size[0] * 4);
    let buffer_size = bytes_per_row as u64 * size[1] as u64;
    let readback = context.create_buffer(
        "Readback Buffer",
        buffer_size,
        wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
    );

    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &readback,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(size[1]),
            },
        },
        wgpu::Extent3d {
            width: size[0],
            height: size[1],
            depth_or_array_layers: 1,
        },
    );
    context.queue.submit(std::iter::once(encoder.finish()));

    let slice = readback.slice(..);
    let (tx, rx) = flume::bounded(1);
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    let _ = context.device.poll(wgpu::Maintain::Wait);
    rx.recv()
        .map_err(|_| Error::Render("Readback channel closed".to_string()))?
        .map_err(|e| Error::Render(format!("Failed to map readback buffer: {:?}", e)))?;

    let data = slice.get_mapped_range();
    let row_bytes = size[0] as usize * 4;
    let mut pixels = Vec::with_capacity(row_bytes * size[1] as usize);
    for row in 0..size[1] as usize {
        let start = row * bytes_per_row as usize;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    drop(data);
    readback.unmap();

    Ok(RgbaFrame {
        width: size[0],
        height: size[1],
        pixels,
    })
}

fn pad_bytes_per_row(unpadded: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (unpadded + align - 1) / align * align
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_padding_alignment() {
        assert_eq!(pad_bytes_per_row(256), 256);
        assert_eq!(pad_bytes_per_row(257), 512);
        // A 100 px row is 400 bytes, padded up to two alignment units.
        assert_eq!(pad_bytes_per_row(400), 512);
        assert_eq!(pad_bytes_per_row(1024), 1024);
    }
}
