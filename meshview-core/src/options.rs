//! Display and render options

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// How a mesh entry is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DisplayStyle {
    /// Filled, shaded triangles.
    #[default]
    Surface,
    /// Edge lines only.
    Wireframe,
    /// The point set only.
    Points,
}

/// Display options for one mesh entry.
///
/// Built with chained `with_*` calls:
///
/// ```
/// use meshview_core::{DisplayStyle, MeshOptions};
///
/// let options = MeshOptions::surface()
///     .with_named_color("lightblue")
///     .unwrap()
///     .with_show_edges(true);
/// assert_eq!(options.style, DisplayStyle::Surface);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshOptions {
    /// Flat color, used when no scalars are mapped. White by default.
    pub color: [f32; 3],
    pub style: DisplayStyle,
    /// Overlay the edge set on a surface rendering.
    pub show_edges: bool,
    pub opacity: f32,
    /// Point diameter in pixels for the `Points` style.
    pub point_size: f32,
    /// Line width in pixels for wireframe and edge display.
    pub line_width: f32,
    /// Explicit color-mapping range; derived from the scalars when `None`.
    pub value_range: Option<[f32; 2]>,
    /// Title shown above the scalar bar when scalars are mapped.
    pub scalar_title: Option<String>,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            style: DisplayStyle::Surface,
            show_edges: false,
            opacity: 1.0,
            point_size: 5.0,
            line_width: 1.0,
            value_range: None,
            scalar_title: None,
        }
    }
}

impl MeshOptions {
    /// Options for a shaded surface rendering
    pub fn surface() -> Self {
        Self::default()
    }

    /// Options for a wireframe rendering
    pub fn wireframe() -> Self {
        Self {
            style: DisplayStyle::Wireframe,
            ..Self::default()
        }
    }

    /// Options for a point rendering
    pub fn points() -> Self {
        Self {
            style: DisplayStyle::Points,
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.color = color;
        self
    }

    /// Set the color from a name such as `"r"`, `"red"` or `"lightblue"`.
    pub fn with_named_color(self, name: &str) -> Result<Self> {
        Ok(self.with_color(parse_color(name)?))
    }

    pub fn with_style(mut self, style: DisplayStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_show_edges(mut self, show_edges: bool) -> Self {
        self.show_edges = show_edges;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_point_size(mut self, point_size: f32) -> Self {
        self.point_size = point_size;
        self
    }

    pub fn with_line_width(mut self, line_width: f32) -> Self {
        self.line_width = line_width;
        self
    }

    pub fn with_value_range(mut self, min: f32, max: f32) -> Self {
        self.value_range = Some([min, max]);
        self
    }

    pub fn with_scalar_title(mut self, title: impl Into<String>) -> Self {
        self.scalar_title = Some(title.into());
        self
    }
}

/// Options for one render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Block and run the window event loop until the user closes it.
    pub interactive: bool,
    /// Tear the window down when the render returns. Set to `false` to keep
    /// it open for update-and-render animation loops.
    pub autoclose: bool,
    /// Window or offscreen target size; the renderer default when `None`.
    pub window_size: Option<[u32; 2]>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            interactive: true,
            autoclose: true,
            window_size: None,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw one frame without blocking on user input.
    pub fn non_interactive(mut self) -> Self {
        self.interactive = false;
        self
    }

    /// Leave the window open after the render for further updates.
    pub fn keep_open(mut self) -> Self {
        self.autoclose = false;
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = Some([width, height]);
        self
    }
}

/// Parse a color name into RGB.
///
/// Single-letter matplotlib-style names and a handful of full names are
/// accepted; anything else is an error.
pub fn parse_color(name: &str) -> Result<[f32; 3]> {
    let rgb = match name.to_ascii_lowercase().as_str() {
        "r" | "red" => [1.0, 0.0, 0.0],
        "g" | "green" => [0.0, 1.0, 0.0],
        "b" | "blue" => [0.0, 0.0, 1.0],
        "k" | "black" => [0.0, 0.0, 0.0],
        "w" | "white" => [1.0, 1.0, 1.0],
        "y" | "yellow" => [1.0, 1.0, 0.0],
        "m" | "magenta" => [1.0, 0.0, 1.0],
        "c" | "cyan" => [0.0, 1.0, 1.0],
        "grey" | "gray" => [0.5, 0.5, 0.5],
        "lightgrey" | "lightgray" => [0.83, 0.83, 0.83],
        "lightblue" => [0.68, 0.85, 0.9],
        "orange" => [1.0, 0.65, 0.0],
        "tan" => [0.82, 0.71, 0.55],
        other => {
            return Err(Error::InvalidData(format!("Unknown color name: {}", other)));
        }
    };
    Ok(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chains() {
        let options = MeshOptions::wireframe()
            .with_line_width(2.0)
            .with_value_range(-0.5, 0.5)
            .with_scalar_title("Displacement");
        assert_eq!(options.style, DisplayStyle::Wireframe);
        assert_eq!(options.line_width, 2.0);
        assert_eq!(options.value_range, Some([-0.5, 0.5]));
        assert_eq!(options.scalar_title.as_deref(), Some("Displacement"));
    }

    #[test]
    fn test_named_colors() {
        assert_eq!(parse_color("r").unwrap(), [1.0, 0.0, 0.0]);
        assert_eq!(parse_color("WHITE").unwrap(), [1.0, 1.0, 1.0]);
        assert_eq!(parse_color("grey").unwrap(), parse_color("gray").unwrap());
        assert!(parse_color("chartreuse-ish").is_err());
    }

    #[test]
    fn test_render_options_defaults() {
        let options = RenderOptions::default();
        assert!(options.interactive);
        assert!(options.autoclose);
        assert_eq!(options.window_size, None);

        let frame = RenderOptions::new()
            .non_interactive()
            .keep_open()
            .with_window_size(800, 600);
        assert!(!frame.interactive);
        assert!(!frame.autoclose);
        assert_eq!(frame.window_size, Some([800, 600]));
    }
}
