//! Farneback dense optical flow estimator.

use crate::convert::{backend, frame_to_gray};
use flowvis::prelude::v1::*;
use nalgebra as na;
use opencv::core::{Mat, Point2f};
use opencv::prelude::*;

/// Estimates dense optical flow with OpenCV's Farneback implementation.
///
/// The estimator holds no state between calls, so it may be shared between frame pairs freely.
#[derive(Clone, Debug, Default)]
pub struct FarnebackEstimator {
    params: FlowParams,
}

impl FarnebackEstimator {
    /// Create a new estimator.
    ///
    /// Fails with `Config` if the parameters are out of range.
    pub fn new(params: FlowParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }
}

impl FlowEstimator for FarnebackEstimator {
    fn estimate(&self, prev: &Frame, next: &Frame) -> Result<FlowField> {
        let prev_gray = frame_to_gray(prev).map_err(backend)?;
        let next_gray = frame_to_gray(next).map_err(backend)?;

        let FlowParams {
            pyr_scale,
            levels,
            win_size,
            iterations,
            poly_n,
            poly_sigma,
        } = self.params;

        let mut flow = Mat::default();

        opencv::video::calc_optical_flow_farneback(
            &prev_gray,
            &next_gray,
            &mut flow,
            pyr_scale,
            levels as _,
            win_size as _,
            iterations as _,
            poly_n as _,
            poly_sigma,
            0,
        )
        .map_err(backend)?;

        let (width, height) = prev.dim();
        let mut field = FlowField::new(width, height);

        for y in 0..flow.rows() {
            let row = flow.at_row::<Point2f>(y).map_err(backend)?;
            for (x, dir) in row.iter().enumerate() {
                field.set_motion(x, y as _, na::Vector2::new(dir.x, dir.y));
            }
        }

        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Frame with a bright, textured square at the given offset on a dark, textured background.
    fn square(w: usize, h: usize, ox: usize, oy: usize) -> Frame {
        let pixels = (0..w * h)
            .map(|i| {
                let (x, y) = (i % w, i / w);
                if (ox..ox + 16).contains(&x) && (oy..oy + 16).contains(&y) {
                    let v = 150 + (((x - ox) * 13 + (y - oy) * 7) % 80) as u8;
                    Bgr::new(v, v, v)
                } else {
                    let v = ((x * 3 + y * 5) % 20) as u8;
                    Bgr::new(v, v, v)
                }
            })
            .collect();
        Frame::from_pixels(w, h, pixels).unwrap()
    }

    #[test]
    fn field_has_frame_dimensions() {
        let est = FarnebackEstimator::default();
        let field = est
            .estimate(&square(64, 48, 10, 10), &square(64, 48, 12, 10))
            .unwrap();
        assert_eq!(field.dim(), (64, 48));
    }

    #[test]
    fn identical_frames_have_no_motion() {
        let est = FarnebackEstimator::default();
        let frame = square(64, 48, 20, 16);
        let field = est.estimate(&frame, &frame).unwrap();
        for y in 0..48 {
            for x in 0..64 {
                assert!(field.get_motion(x, y).norm() < 1e-3);
            }
        }
    }

    #[test]
    fn detects_horizontal_motion() {
        let est = FarnebackEstimator::default();
        let field = est
            .estimate(&square(64, 64, 20, 24), &square(64, 64, 22, 24))
            .unwrap();

        let motion = field.get_motion(28, 32);
        assert!(motion.x > 0.5, "{motion:?}");
        assert!(motion.x.abs() > motion.y.abs(), "{motion:?}");
    }

    #[test]
    fn colorizer_is_deterministic() {
        let colorizer = crate::farneback_colorizer(Default::default()).unwrap();
        let a = square(48, 48, 8, 8);
        let b = square(48, 48, 11, 9);
        let first = colorizer.colorize(&a, &b).unwrap();
        let second = colorizer.colorize(&a, &b).unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
        assert_eq!(first.dim(), (48, 48));
    }

    #[test]
    fn rightward_motion_is_red() {
        let colorizer = crate::farneback_colorizer(Default::default()).unwrap();
        let out = colorizer
            .colorize(&square(64, 64, 20, 24), &square(64, 64, 22, 24))
            .unwrap();

        let brightest = out
            .pixels()
            .iter()
            .max_by_key(|p| p.b.max(p.g).max(p.r))
            .copied()
            .unwrap();

        // Rightward motion has hue near 0, which keeps red at full value.
        assert_eq!(brightest.r, 255, "{brightest:?}");
        assert!(brightest.g < 255 && brightest.b < 255, "{brightest:?}");

        let centre = out.get(28, 32);
        assert!(centre.r > 32, "{centre:?}");
        assert!(centre.r > centre.g && centre.r > centre.b, "{centre:?}");
    }

    #[test]
    fn rejects_invalid_params() {
        let params = FlowParams {
            poly_n: 3,
            ..Default::default()
        };
        assert!(matches!(
            FarnebackEstimator::new(params),
            Err(Error::Config(_))
        ));
    }
}
