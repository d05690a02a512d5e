//! Display a mesh file from the command line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use meshview_core::{MeshOptions, RenderOptions};
use meshview_io::read_any;
use meshview_plot::Plotter;

#[derive(Parser)]
#[command(about = "Display a PLY or legacy VTK file")]
struct Args {
    /// Path to a .ply or .vtk file
    path: PathBuf,

    /// Draw as a wireframe instead of a shaded surface
    #[arg(long)]
    wireframe: bool,

    /// Overlay the mesh edges
    #[arg(long)]
    show_edges: bool,

    /// Flat color name, used when the file carries no scalars
    #[arg(long, default_value = "lightblue")]
    color: String,

    /// Write a screenshot to this path instead of opening a window
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Window width and height in pixels
    #[arg(long, num_args = 2)]
    window_size: Option<Vec<u32>>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mesh = read_any(&args.path)
        .with_context(|| format!("Failed to load {}", args.path.display()))?;
    println!(
        "Loaded {} with {} points",
        args.path.display(),
        mesh.point_count()
    );

    let style = if args.wireframe {
        MeshOptions::wireframe()
    } else {
        MeshOptions::surface()
    };
    let options = style
        .with_named_color(&args.color)?
        .with_show_edges(args.show_edges);

    let size = args.window_size.as_ref().map(|v| [v[0], v[1]]);

    let mut plotter = if args.screenshot.is_some() {
        Plotter::off_screen()
    } else {
        Plotter::with_title("meshview")
    };
    plotter.add_mesh(&mesh, None, options)?;
    plotter.add_axes()?;

    if let Some(path) = &args.screenshot {
        plotter.screenshot(path, size)?;
        println!("Wrote {}", path.display());
    } else {
        let mut render = RenderOptions::default();
        if let Some([width, height]) = size {
            render = render.with_window_size(width, height);
        }
        plotter.render(&render)?;
    }
    plotter.close();
    Ok(())
}
