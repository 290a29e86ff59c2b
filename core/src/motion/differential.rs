//! Three-frame differencing, the evaluation-mask half of motion detection.
//!
//! Grounded on `MotionDetection.cpp::DifferentialCollins`. The
//! specification text calls for an erode step sized by `erode_dimension`
//! inside this function (see DESIGN.md for how this reconciles with the
//! particular reference source snapshot, which has that call commented
//! out in favor of a separate fixed kernel inside the motion counter).

use crate::frame::LumaPlane;
use crate::imgproc;

/// `evaluation = erode(threshold(|f0-f2| AND |f1-f2|, diff_threshold),
/// erode_dimension)`.
pub fn differential_collins(
    f0: &LumaPlane,
    f1: &LumaPlane,
    f2: &LumaPlane,
    diff_threshold: f32,
    erode_dimension: usize,
) -> Vec<bool> {
    let n = f0.data.len();
    let mut mask = vec![false; n];
    for i in 0..n {
        let d1 = (f0.data[i] - f2.data[i]).abs();
        let d2 = (f1.data[i] - f2.data[i]).abs();
        mask[i] = d1 >= diff_threshold && d2 >= diff_threshold;
    }
    imgproc::erode(&mask, f0.width, f0.height, erode_dimension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_pixels_changed_in_both_comparisons() {
        let width = 4;
        let height = 4;
        let mut f0 = LumaPlane::zeros(width, height);
        let mut f1 = LumaPlane::zeros(width, height);
        let f2 = LumaPlane::zeros(width, height);
        f0.data[5] = 1.0;
        f1.data[5] = 1.0;
        let mask = differential_collins(&f0, &f1, &f2, 0.1, 1);
        assert!(mask[5]);
        assert!(!mask[0]);
    }

    #[test]
    fn requires_change_in_both_comparisons_not_just_one() {
        let width = 4;
        let height = 4;
        let mut f0 = LumaPlane::zeros(width, height);
        let f1 = LumaPlane::zeros(width, height);
        let f2 = LumaPlane::zeros(width, height);
        f0.data[5] = 1.0;
        let mask = differential_collins(&f0, &f1, &f2, 0.1, 1);
        assert!(!mask[5]);
    }
}
