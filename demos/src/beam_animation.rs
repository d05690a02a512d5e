//! Hexahedral beam demo: a static displaced view, then update-and-render
//! animation of the bending beam, then the same animation as a wireframe.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use meshview_core::{shapes, CameraSpec, CellGrid, MeshOptions, Point3f, RenderOptions, Vector3f};
use meshview_plot::Plotter;

fn main() -> Result<()> {
    env_logger::init();

    let grid = shapes::beam_grid([2, 2, 10], [1.0, 1.0, 5.0]);

    // Fictitious Y displacement growing with the cube of the height.
    let displacement: Vec<f32> = grid.points.iter().map(|p| p.z.powi(3) / 250.0).collect();
    let max = displacement.iter().fold(0.0f32, |a, &b| a.max(b.abs()));

    let camera = CameraSpec::from((
        [11.9151, 6.1139, 3.6125],
        [0.0, 0.375, 2.0],
        [-0.4255, 0.9024, -0.0679],
    ));

    // Static displaced beam. The render blocks until the window is closed
    // and hands back the camera pose the user ended up with.
    println!("Static beam: close the window to start the animation");
    let mut plotter = Plotter::with_title("Static Beam");
    let id = plotter.add_mesh(
        &grid,
        Some(&displacement),
        MeshOptions::surface()
            .with_scalar_title("Y Displacement")
            .with_value_range(-max, max),
    )?;
    let displaced = displaced_points(&grid, &displacement, 1.0);
    plotter.update_coordinates(id, &displaced, false)?;
    plotter.add_axes()?;
    set_camera(&mut plotter, camera)?;
    plotter.add_text("Static Beam Example")?;
    let camera = plotter.render(&RenderOptions::default())?;
    plotter.close();

    animate(
        &grid,
        &displacement,
        max,
        camera,
        MeshOptions::surface().with_show_edges(true),
        "Beam Animation Example",
    )?;
    animate(
        &grid,
        &displacement,
        max,
        camera,
        MeshOptions::wireframe(),
        "Beam Animation Example 2",
    )?;
    Ok(())
}

/// Drive an open window with coordinate and scalar updates, one explicit
/// render per frame.
fn animate(
    grid: &CellGrid,
    displacement: &[f32],
    max: f32,
    camera: CameraSpec,
    options: MeshOptions,
    caption: &str,
) -> Result<()> {
    let mut plotter = Plotter::with_title("Beam Animation");
    let id = plotter.add_mesh(
        grid,
        Some(displacement),
        options
            .with_scalar_title("Y Displacement")
            .with_value_range(-max, max),
    )?;
    plotter.add_axes()?;
    set_camera(&mut plotter, camera)?;
    plotter.add_text(caption)?;
    plotter.render(
        &RenderOptions::new()
            .non_interactive()
            .keep_open()
            .with_window_size(800, 600),
    )?;

    let frames = 100;
    for frame in 0..frames {
        let phase = 4.0 * std::f32::consts::PI * frame as f32 / (frames - 1) as f32;
        let factor = phase.cos();
        let points = displaced_points(grid, displacement, factor);
        let scalars: Vec<f32> = displacement.iter().map(|d| d * factor).collect();

        plotter.update_coordinates(id, &points, false)?;
        plotter.update_scalars(id, &scalars, false)?;
        plotter.render(&RenderOptions::new().non_interactive().keep_open())?;
        thread::sleep(Duration::from_millis(10));
    }
    plotter.close();
    Ok(())
}

fn displaced_points(grid: &CellGrid, displacement: &[f32], factor: f32) -> Vec<Point3f> {
    grid.points
        .iter()
        .zip(displacement)
        .map(|(p, &d)| p + Vector3f::new(0.0, d * factor, 0.0))
        .collect()
}

fn set_camera(plotter: &mut Plotter, camera: CameraSpec) -> Result<()> {
    plotter.set_camera_position(
        camera.position.into(),
        camera.focal_point.into(),
        camera.view_up.into(),
    )?;
    Ok(())
}
