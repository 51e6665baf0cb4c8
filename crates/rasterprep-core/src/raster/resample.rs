//! Raster resizing with selectable interpolation kernels.
//!
//! Resizing is separable: a horizontal pass into an `f64` scratch buffer,
//! then a vertical pass back to the raster's element type. Sampling is
//! center-aligned and borders are replicated, so a constant raster stays
//! constant under every kernel. Values are never clamped: rasters carry
//! raw numeric data, not display intensities.
//!
//! # Kernels
//!
//! | Kernel    | Support | Notes                       |
//! |-----------|---------|-----------------------------|
//! | `Nearest` | -       | floor mapping, no blending  |
//! | `Linear`  | 1       | triangle                    |
//! | `Cubic`   | 2       | Keys, a = -0.75             |
//! | `Lanczos` | 4       | windowed sinc, a = 4        |

use serde::{Deserialize, Serialize};

use super::{Element, Raster};

/// Interpolation kernel for resize operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interpolation {
    /// Nearest neighbor (fastest, blocky).
    Nearest,
    /// Bilinear interpolation.
    #[default]
    Linear,
    /// Bicubic interpolation.
    Cubic,
    /// Lanczos interpolation over an 8x8 neighborhood.
    Lanczos,
}

impl Interpolation {
    /// Look up a kernel by its configuration name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "nearest" => Some(Interpolation::Nearest),
            "linear" => Some(Interpolation::Linear),
            "cubic" => Some(Interpolation::Cubic),
            "lanczos" => Some(Interpolation::Lanczos),
            _ => None,
        }
    }

    /// Parse a colon-delimited kernel list.
    ///
    /// Unrecognized tokens are dropped. An empty result falls back to a
    /// single [`Interpolation::Linear`] entry.
    pub fn parse_list(names: &str) -> Vec<Self> {
        let mut kernels: Vec<Self> = names.split(':').filter_map(Self::from_name).collect();
        if kernels.is_empty() {
            kernels.push(Interpolation::Linear);
        }
        kernels
    }

    /// Kernel radius in source pixels.
    fn support(self) -> i64 {
        match self {
            Interpolation::Nearest => 0,
            Interpolation::Linear => 1,
            Interpolation::Cubic => 2,
            Interpolation::Lanczos => 4,
        }
    }

    fn weight(self, x: f64) -> f64 {
        match self {
            Interpolation::Nearest => {
                if x.abs() < 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            Interpolation::Linear => (1.0 - x.abs()).max(0.0),
            Interpolation::Cubic => cubic_weight(x, -0.75),
            Interpolation::Lanczos => lanczos_weight(x, 4.0),
        }
    }
}

/// Resize `src` to exactly `width` x `height`, keeping its channel count.
///
/// The result is always a contiguous raster in new memory.
pub fn resize<T: Element>(
    src: &Raster<T>,
    width: usize,
    height: usize,
    interpolation: Interpolation,
) -> Raster<T> {
    let channels = src.channels();

    // Nothing to sample from, or nothing to produce
    if src.is_empty() || width == 0 || height == 0 {
        return Raster::zeros(width, height, channels);
    }

    // Fast path: dimensions already match
    if src.width() == width && src.height() == height {
        return src.to_contiguous();
    }

    match interpolation {
        Interpolation::Nearest => resize_nearest(src, width, height),
        kernel => resize_separable(src, width, height, kernel),
    }
}

fn resize_nearest<T: Element>(src: &Raster<T>, width: usize, height: usize) -> Raster<T> {
    let channels = src.channels();
    let x_map: Vec<usize> = (0..width)
        .map(|x| nearest_index(x, src.width(), width))
        .collect();

    let mut out = Vec::with_capacity(width * height * channels);
    for y in 0..height {
        let row = src.row(nearest_index(y, src.height(), height));
        for &sx in &x_map {
            out.extend_from_slice(&row[sx * channels..(sx + 1) * channels]);
        }
    }
    Raster::owned(out, width, height, channels)
}

#[inline]
fn nearest_index(dst: usize, src_len: usize, dst_len: usize) -> usize {
    let scale = src_len as f64 / dst_len as f64;
    ((dst as f64 * scale).floor() as usize).min(src_len - 1)
}

fn resize_separable<T: Element>(
    src: &Raster<T>,
    width: usize,
    height: usize,
    kernel: Interpolation,
) -> Raster<T> {
    let channels = src.channels();
    let x_taps = compute_taps(src.width(), width, kernel);
    let y_taps = compute_taps(src.height(), height, kernel);

    // Horizontal pass: src.height() rows of `width` pixels
    let scratch_stride = width * channels;
    let mut scratch = vec![0.0f64; src.height() * scratch_stride];
    for (sy, row) in src.rows().enumerate() {
        let dst_row = &mut scratch[sy * scratch_stride..(sy + 1) * scratch_stride];
        for (dx, taps) in x_taps.iter().enumerate() {
            for c in 0..channels {
                let mut acc = 0.0;
                for &(sx, w) in taps {
                    acc += row[sx * channels + c].to_f64() * w;
                }
                dst_row[dx * channels + c] = acc;
            }
        }
    }

    // Vertical pass
    let mut out = Vec::with_capacity(height * scratch_stride);
    for taps in &y_taps {
        for i in 0..scratch_stride {
            let mut acc = 0.0;
            for &(sy, w) in taps {
                acc += scratch[sy * scratch_stride + i] * w;
            }
            out.push(T::from_f64(acc));
        }
    }

    Raster::owned(out, width, height, channels)
}

/// Source indices and normalized weights for every destination coordinate.
fn compute_taps(src_len: usize, dst_len: usize, kernel: Interpolation) -> Vec<Vec<(usize, f64)>> {
    let scale = src_len as f64 / dst_len as f64;
    let support = kernel.support();
    let last = src_len as i64 - 1;

    (0..dst_len)
        .map(|d| {
            let center = (d as f64 + 0.5) * scale - 0.5;
            let base = center.floor() as i64;

            let mut taps = Vec::with_capacity((2 * support) as usize);
            let mut sum = 0.0;
            for k in (base - support + 1)..=(base + support) {
                let w = kernel.weight(center - k as f64);
                if w == 0.0 {
                    continue;
                }
                taps.push((k.clamp(0, last) as usize, w));
                sum += w;
            }

            if sum.abs() < f64::EPSILON {
                let nearest = (center.round() as i64).clamp(0, last) as usize;
                return vec![(nearest, 1.0)];
            }
            for tap in &mut taps {
                tap.1 /= sum;
            }
            taps
        })
        .collect()
}

/// Keys cubic convolution kernel with parameter `a`.
fn cubic_weight(x: f64, a: f64) -> f64 {
    let x = x.abs();
    if x <= 1.0 {
        ((a + 2.0) * x - (a + 3.0)) * x * x + 1.0
    } else if x < 2.0 {
        ((a * x - 5.0 * a) * x + 8.0 * a) * x - 4.0 * a
    } else {
        0.0
    }
}

/// Lanczos kernel weight function.
///
/// ```text
/// L(x) = sinc(x) * sinc(x/a)  for |x| < a
/// L(x) = 0                     for |x| >= a
/// ```
fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }

    let pi_x = std::f64::consts::PI * x;
    let pi_x_a = pi_x / a;
    (a * pi_x.sin() * pi_x_a.sin()) / (pi_x * pi_x)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
