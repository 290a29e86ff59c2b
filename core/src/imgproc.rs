//! Small, self-contained image-processing primitives.
//!
//! The reference implementation leans on OpenCV for pyramids, separable
//! blur, morphology, and contour extraction. This crate has no binding to an
//! external vision library, so the handful of operations the pipeline
//! actually needs are implemented directly here: a 5-tap Gaussian
//! pyramid, a separable Gaussian blur with reflected borders, rectangular
//! erode/dilate, thresholding, and a 4-connected flood-fill stand-in for
//! external-contour extraction (the ROI logic only ever inspects area and
//! bounding box, never polygon geometry, so a labeled-component pass is
//! sufficient).

use crate::frame::LumaPlane;
use rayon::prelude::*;

/// Reflect `i` into `[0, len)` the way OpenCV's `BORDER_REFLECT_101` does.
#[inline]
fn reflect(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let len = len as isize;
    let mut i = i;
    while i < 0 || i >= len {
        if i < 0 {
            i = -i;
        }
        if i >= len {
            i = 2 * (len - 1) - i;
        }
    }
    i as usize
}

/// Convolve `plane` with a small 1-D kernel, separately along rows and
/// columns (used for both the Riesz `[-0.6, 0, 0.6]` kernel and Gaussian
/// blur).
pub fn convolve_1d_horizontal(plane: &LumaPlane, kernel: &[f32]) -> LumaPlane {
    let half = (kernel.len() / 2) as isize;
    let mut out = LumaPlane::zeros(plane.width, plane.height);
    for y in 0..plane.height {
        for x in 0..plane.width {
            let mut acc = 0f32;
            for (k, &w) in kernel.iter().enumerate() {
                let sx = reflect(x as isize + k as isize - half, plane.width);
                acc += w * plane.get(sx, y);
            }
            out.set(x, y, acc);
        }
    }
    out
}

pub fn convolve_1d_vertical(plane: &LumaPlane, kernel: &[f32]) -> LumaPlane {
    let half = (kernel.len() / 2) as isize;
    let mut out = LumaPlane::zeros(plane.width, plane.height);
    for y in 0..plane.height {
        for x in 0..plane.width {
            let mut acc = 0f32;
            for (k, &w) in kernel.iter().enumerate() {
                let sy = reflect(y as isize + k as isize - half, plane.height);
                acc += w * plane.get(x, sy);
            }
            out.set(x, y, acc);
        }
    }
    out
}

/// Build a 1-D Gaussian kernel of `aperture` taps (odd) and std-dev `sigma`,
/// normalized to unit sum. Grounded on the construction style of
/// `build_gaussian_kernel` in `av_metrics`'s SSIM implementation: a small
/// fixed-aperture kernel built once and reused across calls.
pub fn gaussian_kernel(sigma: f32, aperture: usize) -> Vec<f32> {
    let half = (aperture / 2) as isize;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| {
            let x = i as f32;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    for v in kernel.iter_mut() {
        *v /= sum;
    }
    kernel
}

/// Separable Gaussian blur, row pass then column pass. The two passes are
/// independent of each other across rows/columns, so they are dispatched
/// with `rayon` the way embarrassingly-parallel per-row work is dispatched
/// elsewhere in `av_metrics`'s metric code.
pub fn gaussian_blur(plane: &LumaPlane, sigma: f32, aperture: usize) -> LumaPlane {
    let kernel = gaussian_kernel(sigma, aperture);
    let horizontal = convolve_1d_horizontal_parallel(plane, &kernel);
    convolve_1d_vertical_parallel(&horizontal, &kernel)
}

fn convolve_1d_horizontal_parallel(plane: &LumaPlane, kernel: &[f32]) -> LumaPlane {
    let half = (kernel.len() / 2) as isize;
    let width = plane.width;
    let height = plane.height;
    let mut data = vec![0f32; width * height];
    data.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let mut acc = 0f32;
                for (k, &w) in kernel.iter().enumerate() {
                    let sx = reflect(x as isize + k as isize - half, width);
                    acc += w * plane.get(sx, y);
                }
                *out = acc;
            }
        });
    LumaPlane { width, height, data }
}

fn convolve_1d_vertical_parallel(plane: &LumaPlane, kernel: &[f32]) -> LumaPlane {
    let half = (kernel.len() / 2) as isize;
    let width = plane.width;
    let height = plane.height;
    let mut data = vec![0f32; width * height];
    data.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let mut acc = 0f32;
                for (k, &w) in kernel.iter().enumerate() {
                    let sy = reflect(y as isize + k as isize - half, height);
                    acc += w * plane.get(x, sy);
                }
                *out = acc;
            }
        });
    LumaPlane { width, height, data }
}

const PYR_KERNEL: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// Downsample by 2 with a 5-tap binomial low-pass, reflected border.
pub fn pyr_down(plane: &LumaPlane) -> LumaPlane {
    let blurred_h = convolve_1d_horizontal(plane, &PYR_KERNEL);
    let blurred = convolve_1d_vertical(&blurred_h, &PYR_KERNEL);
    let out_w = (plane.width + 1) / 2;
    let out_h = (plane.height + 1) / 2;
    let mut out = LumaPlane::zeros(out_w, out_h);
    for y in 0..out_h {
        for x in 0..out_w {
            out.set(x, y, blurred.get((x * 2).min(plane.width - 1), (y * 2).min(plane.height - 1)));
        }
    }
    out
}

/// Upsample to `(target_w, target_h)`, inserting zeros and re-blurring
/// (scaled by 4 to preserve energy), matching OpenCV's `pyrUp` semantics
/// closely enough for this pipeline's purposes (the collapse step only
/// needs approximate reconstruction, never exact inversion).
pub fn pyr_up(plane: &LumaPlane, target_w: usize, target_h: usize) -> LumaPlane {
    let mut expanded = LumaPlane::zeros(target_w, target_h);
    for y in 0..plane.height {
        for x in 0..plane.width {
            let tx = x * 2;
            let ty = y * 2;
            if tx < target_w && ty < target_h {
                expanded.set(tx, ty, plane.get(x, y) * 4.0);
            }
        }
    }
    let blurred_h = convolve_1d_horizontal(&expanded, &PYR_KERNEL);
    convolve_1d_vertical(&blurred_h, &PYR_KERNEL)
}

/// Rectangular binary erode: a pixel stays 255 only if every pixel under a
/// `size x size` window centered on it is also 255 (out-of-bounds treated
/// as 0, i.e. border shrinks toward 0).
pub fn erode(mask: &[bool], width: usize, height: usize, size: usize) -> Vec<bool> {
    rect_morphology(mask, width, height, size, true)
}

/// Rectangular binary dilate: a pixel becomes 255 if any pixel under the
/// window is 255.
pub fn dilate(mask: &[bool], width: usize, height: usize, size: usize) -> Vec<bool> {
    rect_morphology(mask, width, height, size, false)
}

fn rect_morphology(mask: &[bool], width: usize, height: usize, size: usize, is_erode: bool) -> Vec<bool> {
    if size <= 1 {
        return mask.to_vec();
    }
    let half = (size / 2) as isize;
    let mut out = vec![false; width * height];
    for y in 0..height as isize {
        for x in 0..width as isize {
            let mut acc = is_erode;
            'window: for dy in -half..=half {
                for dx in -half..=half {
                    let (sx, sy) = (x + dx, y + dy);
                    let v = if sx < 0 || sy < 0 || sx >= width as isize || sy >= height as isize {
                        false
                    } else {
                        mask[sy as usize * width + sx as usize]
                    };
                    if is_erode && !v {
                        acc = false;
                        break 'window;
                    }
                    if !is_erode && v {
                        acc = true;
                        break 'window;
                    }
                }
            }
            out[y as usize * width + x as usize] = acc;
        }
    }
    out
}

/// Binary threshold: output is `true` wherever `plane >= threshold`.
pub fn threshold(plane: &LumaPlane, threshold_value: f32) -> Vec<bool> {
    plane.data.iter().map(|&v| v >= threshold_value).collect()
}

/// An axis-aligned bounding box plus pixel count, the only two properties
/// the ROI logic inspects from a "contour".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
    pub area: usize,
}

/// 4-connected flood fill over a binary mask, returning one [`Component`]
/// per connected region of `true` pixels. Stands in for external-contour
/// extraction: the ROI policy only ever reads `area` and the bounding box.
pub fn connected_components(mask: &[bool], width: usize, height: usize) -> Vec<Component> {
    let mut visited = vec![false; width * height];
    let mut components = Vec::new();
    let mut stack = Vec::new();

    for start in 0..mask.len() {
        if !mask[start] || visited[start] {
            continue;
        }
        visited[start] = true;
        stack.push(start);
        let (mut min_x, mut min_y) = (width, height);
        let (mut max_x, mut max_y) = (0usize, 0usize);
        let mut area = 0usize;

        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % width, idx / width);
            area += 1;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);

            let neighbors = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            for (nx, ny) in neighbors {
                if nx >= width || ny >= height {
                    continue;
                }
                let nidx = ny * width + nx;
                if mask[nidx] && !visited[nidx] {
                    visited[nidx] = true;
                    stack.push(nidx);
                }
            }
        }

        components.push(Component {
            x: min_x,
            y: min_y,
            w: max_x - min_x + 1,
            h: max_y - min_y + 1,
            area,
        });
    }
    components
}
