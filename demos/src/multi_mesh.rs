//! Several meshes in one scene: named flat colors, scalar color mapping
//! with a scalar bar, and an overlay caption.

use anyhow::Result;
use meshview_core::{shapes, MeshOptions, Point3f, RenderOptions};
use meshview_plot::Plotter;

fn main() -> Result<()> {
    env_logger::init();

    let red_sphere = shapes::sphere(0.4, Point3f::new(-0.7, 0.0, 0.4));
    let blue_sphere = shapes::sphere(0.25, Point3f::new(0.6, 0.3, 0.25));
    let ground = shapes::plane(Point3f::origin(), [4.0, 4.0], [32, 32]);

    // Color the ground by distance from its center.
    let scalars: Vec<f32> = ground
        .points
        .iter()
        .map(|p| (p.x * p.x + p.y * p.y).sqrt())
        .collect();

    let mut plotter = Plotter::with_title("meshview demo");
    plotter.add_mesh(
        &red_sphere,
        None,
        MeshOptions::surface().with_named_color("r")?,
    )?;
    plotter.add_mesh(
        &blue_sphere,
        None,
        MeshOptions::surface().with_named_color("b")?.with_show_edges(true),
    )?;
    plotter.add_mesh(
        &ground,
        Some(&scalars),
        MeshOptions::surface().with_scalar_title("Distance"),
    )?;
    plotter.add_text("Two spheres over a color-mapped ground")?;
    plotter.add_axes()?;

    println!("Drag to orbit, right-drag to pan, scroll to zoom; q closes");
    plotter.render(&RenderOptions::default())?;
    plotter.close();
    Ok(())
}
