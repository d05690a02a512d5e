//! Scalar-to-color mapping
//!
//! Scalars are mapped through the classic rainbow colormap: the low end of
//! the range is blue, the high end red, with the hue sweeping through cyan,
//! green and yellow in between. Values outside the range clamp to the
//! endpoint colors.

use rayon::prelude::*;

/// Below this many values the per-value work is too small to farm out.
const PARALLEL_THRESHOLD: usize = 4096;

/// Color for a normalized value in `[0, 1]`, blue through red.
pub fn rainbow(t: f32) -> [f32; 3] {
    let t = t.clamp(0.0, 1.0);
    let hue = 240.0 * (1.0 - t);
    hsv_to_rgb(hue, 1.0, 1.0)
}

fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> [f32; 3] {
    let c = value * saturation;
    let h = hue / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as i32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = value - c;
    [r + m, g + m, b + m]
}

fn normalize(v: f32, range: [f32; 2]) -> f32 {
    if !v.is_finite() {
        return 0.5;
    }
    let span = range[1] - range[0];
    if span.abs() <= f32::EPSILON {
        return 0.5;
    }
    (v - range[0]) / span
}

/// Map a scalar array into vertex colors over the given value range.
pub fn map_scalars(values: &[f32], range: [f32; 2]) -> Vec<[f32; 3]> {
    if values.len() >= PARALLEL_THRESHOLD {
        values
            .par_iter()
            .map(|&v| rainbow(normalize(v, range)))
            .collect()
    } else {
        values
            .iter()
            .map(|&v| rainbow(normalize(v, range)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rainbow_endpoints() {
        let low = rainbow(0.0);
        assert_relative_eq!(low[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(low[1], 0.0, epsilon = 1e-6);
        assert_relative_eq!(low[2], 1.0, epsilon = 1e-6);

        let high = rainbow(1.0);
        assert_relative_eq!(high[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(high[1], 0.0, epsilon = 1e-6);
        assert_relative_eq!(high[2], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rainbow_midpoint_is_green() {
        let mid = rainbow(0.5);
        assert_relative_eq!(mid[1], 1.0, epsilon = 1e-6);
        assert!(mid[0] < 0.01);
        assert!(mid[2] < 0.01);
    }

    #[test]
    fn test_out_of_range_values_clamp() {
        let colors = map_scalars(&[-10.0, 10.0], [0.0, 1.0]);
        assert_eq!(colors[0], rainbow(0.0));
        assert_eq!(colors[1], rainbow(1.0));
    }

    #[test]
    fn test_degenerate_range_maps_to_midpoint() {
        let colors = map_scalars(&[3.0, 3.0, 3.0], [3.0, 3.0]);
        for c in colors {
            assert_eq!(c, rainbow(0.5));
        }
    }

    #[test]
    fn test_non_finite_values_map_to_midpoint() {
        let colors = map_scalars(&[f32::NAN, 0.0, 1.0], [0.0, 1.0]);
        assert_eq!(colors[0], rainbow(0.5));
        assert_eq!(colors[1], rainbow(0.0));
        assert_eq!(colors[2], rainbow(1.0));
    }
}
