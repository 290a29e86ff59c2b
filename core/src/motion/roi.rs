//! Adaptive region-of-interest derivation from an accumulated motion mask.
//!
//! Grounded on `MotionDetection.cpp::calculateROI`. Connected-component
//! labeling (`crate::imgproc::connected_components`) stands in for external
//! contour extraction; the policy below only ever inspects a component's
//! area and bounding box, which a labeled blob provides just as well as a
//! polygon contour would.

use crate::imgproc::{self, Component};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Rect {
    pub fn area(&self) -> usize {
        self.w * self.h
    }

    pub fn full_frame(width: usize, height: usize) -> Self {
        Rect { x: 0, y: 0, w: width, h: height }
    }
}

/// Mutable ROI-tracking state carried across calls (the reference keeps
/// `prevArea` as a function-local static; this crate owns it explicitly).
pub struct RoiTracker {
    prev_area: usize,
}

impl RoiTracker {
    pub fn new(frame_width: usize, frame_height: usize) -> Self {
        RoiTracker {
            prev_area: frame_width * frame_height / 3,
        }
    }

    /// Derive a new candidate ROI from `accumulator`, keeping `current_roi`
    /// unless the candidate passes the smoothing gate.
    pub fn update(
        &mut self,
        accumulator: &[bool],
        frame_width: usize,
        frame_height: usize,
        erode_dim: usize,
        dilate_dim: usize,
        current_roi: Rect,
    ) -> Rect {
        let eroded = imgproc::erode(accumulator, frame_width, frame_height, erode_dim);
        let dilated = imgproc::dilate(&eroded, frame_width, frame_height, dilate_dim);

        let components = imgproc::connected_components(&dilated, frame_width, frame_height);
        let largest = components.into_iter().max_by_key(|c| c.area);

        let third = frame_width * frame_height / 3;
        let (candidate, candidate_area) = match largest {
            None => {
                if current_roi.area() > third {
                    (Rect { x: 0, y: 0, w: frame_width / 3, h: frame_height / 3 }, frame_width * frame_height / 9)
                } else {
                    return current_roi;
                }
            }
            Some(component) => self.policy(component, frame_width, frame_height),
        };

        let change = (candidate_area as isize - self.prev_area as isize).unsigned_abs();
        let relative = change * 100 / self.prev_area.max(1);
        if relative <= 80 {
            self.prev_area = candidate_area;
            candidate
        } else {
            current_roi
        }
    }

    fn policy(&self, component: Component, frame_width: usize, frame_height: usize) -> (Rect, usize) {
        let third = frame_width * frame_height / 3;
        let twentieth = frame_width * frame_height / 20;
        let cx = component.x + component.w / 2;
        let cy = component.y + component.h / 2;

        if component.area >= third {
            (clamp_box(cx, cy, 300, 300, frame_width, frame_height), 300 * 300)
        } else if component.area <= twentieth {
            (clamp_box(cx, cy, 200, 200, frame_width, frame_height), 200 * 200)
        } else {
            (
                Rect { x: component.x, y: component.y, w: component.w, h: component.h },
                component.area,
            )
        }
    }
}

fn clamp_box(cx: usize, cy: usize, w: usize, h: usize, frame_width: usize, frame_height: usize) -> Rect {
    let mut x = cx as isize - (w / 2) as isize;
    let mut y = cy as isize - (h / 2) as isize;
    if x < 0 {
        x = 0;
    }
    if y < 0 {
        y = 0;
    }
    if x as usize + w > frame_width {
        x = frame_width as isize - w as isize;
    }
    if y as usize + h > frame_height {
        y = frame_height as isize - h as isize;
    }
    Rect {
        x: x.max(0) as usize,
        y: y.max(0) as usize,
        w: w.min(frame_width),
        h: h.min(frame_height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_contours_keeps_prior_roi_when_not_full_frame() {
        let mut tracker = RoiTracker::new(300, 300);
        let accumulator = vec![false; 300 * 300];
        let current = Rect { x: 10, y: 10, w: 50, h: 50 };
        let updated = tracker.update(&accumulator, 300, 300, 3, 60, current);
        assert_eq!(updated, current);
    }

    #[test]
    fn small_component_grows_to_two_hundred_box() {
        let width = 640;
        let height = 480;
        let mut tracker = RoiTracker::new(width, height);
        tracker.prev_area = 200 * 200;
        let mut accumulator = vec![false; width * height];
        // A tiny 2x2 blob near the center, well under W*H/20.
        for y in 240..242 {
            for x in 320..322 {
                accumulator[y * width + x] = true;
            }
        }
        let current = Rect::full_frame(width, height);
        let updated = tracker.update(&accumulator, width, height, 1, 1, current);
        assert_eq!(updated.w, 200);
        assert_eq!(updated.h, 200);
    }

    #[test]
    fn large_change_is_rejected_by_smoothing_gate() {
        let width = 640;
        let height = 480;
        let mut tracker = RoiTracker::new(width, height);
        tracker.prev_area = 10;
        let mut accumulator = vec![false; width * height];
        for y in 100..300 {
            for x in 100..300 {
                accumulator[y * width + x] = true;
            }
        }
        let current = Rect { x: 0, y: 0, w: 5, h: 5 };
        let updated = tracker.update(&accumulator, width, height, 1, 1, current);
        assert_eq!(updated, current);
    }
}
