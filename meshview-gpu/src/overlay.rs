//! 2D overlay drawn on top of the rendered scene
//!
//! Text annotations, the scalar bar and the orientation axes are painted
//! with egui directly into the frame, after the 3D pass. The overlay runs
//! in both the window and offscreen paths, so screenshots carry it too.

use crate::camera::view_matrix;
use crate::colormap;
use crate::device::GpuContext;
use meshview_core::{CameraSpec, Scene, SceneMesh};
use nalgebra::Vector3;

pub struct OverlayRenderer {
    ctx: egui::Context,
    renderer: egui_wgpu::Renderer,
}

impl OverlayRenderer {
    pub fn new(context: &GpuContext, format: wgpu::TextureFormat) -> Self {
        Self {
            ctx: egui::Context::default(),
            renderer: egui_wgpu::Renderer::new(&context.device, format, None, 1),
        }
    }

    /// Paint the overlay for this frame into `target` on top of whatever the
    /// scene pass produced.
    pub fn draw(
        &mut self,
        context: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        scene: &Scene,
        camera: &CameraSpec,
        size: [u32; 2],
    ) {
        let wants_scalar_bar = scene.meshes.iter().any(|m| m.has_scalars());
        if scene.annotations.is_empty() && !wants_scalar_bar && !scene.show_axes {
            return;
        }

        let screen_rect = egui::Rect::from_min_size(
            egui::Pos2::ZERO,
            egui::vec2(size[0] as f32, size[1] as f32),
        );
        let input = egui::RawInput {
            screen_rect: Some(screen_rect),
            ..Default::default()
        };
        let output = self
            .ctx
            .run(input, |ctx| paint_overlay(ctx, scene, camera, screen_rect));

        let clipped = self.ctx.tessellate(output.shapes, output.pixels_per_point);
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: size,
            pixels_per_point: output.pixels_per_point,
        };

        for (id, delta) in &output.textures_delta.set {
            self.renderer
                .update_texture(&context.device, &context.queue, *id, delta);
        }
        let _ = self.renderer.update_buffers(
            &context.device,
            &context.queue,
            encoder,
            &clipped,
            &screen,
        );
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Overlay Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.renderer.render(&mut render_pass, &clipped, &screen);
        }
        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

fn paint_overlay(
    ctx: &egui::Context,
    scene: &Scene,
    camera: &CameraSpec,
    screen_rect: egui::Rect,
) {
    let painter = egui::Painter::new(
        ctx.clone(),
        egui::LayerId::new(egui::Order::Foreground, egui::Id::new("scene_overlay")),
        screen_rect,
    );
    paint_annotations(&painter, scene, screen_rect);
    if let Some(entry) = scene.meshes.iter().find(|m| m.has_scalars()) {
        paint_scalar_bar(&painter, entry, screen_rect);
    }
    if scene.show_axes {
        paint_axes(&painter, camera, screen_rect);
    }
}

/// Annotations stack upward from the lower-left corner.
fn paint_annotations(painter: &egui::Painter, scene: &Scene, screen_rect: egui::Rect) {
    let mut anchor = screen_rect.left_bottom() + egui::vec2(10.0, -10.0);
    for annotation in &scene.annotations {
        let rect = painter.text(
            anchor,
            egui::Align2::LEFT_BOTTOM,
            &annotation.text,
            egui::FontId::proportional(annotation.font_size),
            egui::Color32::WHITE,
        );
        anchor.y -= rect.height() + 4.0;
    }
}

/// Vertical gradient bar on the right edge, low end of the range at the
/// bottom, with value labels and the optional title.
fn paint_scalar_bar(painter: &egui::Painter, entry: &SceneMesh, screen_rect: egui::Rect) {
    let Some(range) = entry.value_range() else {
        return;
    };
    let bar_width = 16.0;
    let bar_height = screen_rect.height() * 0.4;
    let left = screen_rect.right() - 40.0;
    let top = screen_rect.center().y - bar_height * 0.5;

    let steps = 64;
    for i in 0..steps {
        let t0 = i as f32 / steps as f32;
        let t1 = (i + 1) as f32 / steps as f32;
        let color = colormap::rainbow(1.0 - (t0 + t1) * 0.5);
        let rect = egui::Rect::from_min_max(
            egui::pos2(left, top + bar_height * t0),
            egui::pos2(left + bar_width, top + bar_height * t1),
        );
        painter.rect_filled(rect, 0.0, to_color32(color));
    }

    let center_x = left + bar_width * 0.5;
    painter.text(
        egui::pos2(center_x, top - 6.0),
        egui::Align2::CENTER_BOTTOM,
        format_value(range[1]),
        egui::FontId::proportional(12.0),
        egui::Color32::WHITE,
    );
    painter.text(
        egui::pos2(center_x, top + bar_height + 6.0),
        egui::Align2::CENTER_TOP,
        format_value(range[0]),
        egui::FontId::proportional(12.0),
        egui::Color32::WHITE,
    );
    if let Some(title) = &entry.options.scalar_title {
        painter.text(
            egui::pos2(center_x, top - 26.0),
            egui::Align2::CENTER_BOTTOM,
            title,
            egui::FontId::proportional(14.0),
            egui::Color32::WHITE,
        );
    }
}

/// Orientation triad in the lower-left corner; arrow lengths foreshorten
/// with orientation the way the world axes do on screen.
fn paint_axes(painter: &egui::Painter, camera: &CameraSpec, screen_rect: egui::Rect) {
    let view = view_matrix(camera);
    let origin = screen_rect.left_bottom() + egui::vec2(55.0, -55.0);
    let axes: [(Vector3<f32>, egui::Color32, &str); 3] = [
        (Vector3::x(), egui::Color32::from_rgb(220, 60, 60), "X"),
        (Vector3::y(), egui::Color32::from_rgb(60, 200, 60), "Y"),
        (Vector3::z(), egui::Color32::from_rgb(80, 120, 255), "Z"),
    ];
    for (axis, color, label) in axes {
        let v = view.transform_vector(&axis);
        // Screen y grows downward.
        let dir = egui::vec2(v.x, -v.y);
        if dir.length() < 1e-3 {
            continue;
        }
        painter.arrow(origin, dir * 34.0, egui::Stroke::new(2.0, color));
        painter.text(
            origin + dir * 34.0 + dir.normalized() * 9.0,
            egui::Align2::CENTER_CENTER,
            label,
            egui::FontId::proportional(12.0),
            color,
        );
    }
}

fn to_color32(c: [f32; 3]) -> egui::Color32 {
    egui::Color32::from_rgb(
        (c[0].clamp(0.0, 1.0) * 255.0) as u8,
        (c[1].clamp(0.0, 1.0) * 255.0) as u8,
        (c[2].clamp(0.0, 1.0) * 255.0) as u8,
    )
}

fn format_value(v: f32) -> String {
    if v == 0.0 || (v.abs() >= 1e-3 && v.abs() < 1e4) {
        format!("{:.3}", v)
    } else {
        format!("{:.3e}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_labels_pick_a_readable_form() {
        assert_eq!(format_value(0.0), "0.000");
        assert_eq!(format_value(1.5), "1.500");
        assert_eq!(format_value(12300.0), "1.230e4");
        assert_eq!(format_value(0.0001), "1.000e-4");
    }

    #[test]
    fn test_color32_conversion_clamps() {
        assert_eq!(to_color32([2.0, -1.0, 0.5]), egui::Color32::from_rgb(255, 0, 127));
    }
}
