//! HSV rendering of flow fields.

use crate::convert::{backend, mat_to_frame};
use flowvis::prelude::v1::*;
use opencv::core::{
    cart_to_polar, merge, no_array, normalize, Mat, Scalar, Vector, CV_32FC1, CV_8U, CV_8UC1,
    NORM_MINMAX,
};
use opencv::imgproc;
use opencv::prelude::*;

/// Renders flow with hue encoding direction and value encoding magnitude.
///
/// Hue is the angle of motion in degrees halved, so that a full turn fits 8-bit hue range
/// `[0, 180)`. Saturation is always full. Value is the magnitude, min-max normalised across the
/// field to `[0, 255]`. A field with uniform magnitude renders black.
#[derive(Clone, Copy, Debug, Default)]
pub struct HsvRenderer;

impl FlowRenderer for HsvRenderer {
    fn render(&self, field: &FlowField) -> Result<Frame> {
        flow_to_display(field).map_err(backend).and_then(|bgr| mat_to_frame(&bgr))
    }
}

/// Split the field into horizontal and vertical component matrices.
fn split_field(field: &FlowField) -> opencv::Result<(Mat, Mat)> {
    let (w, h) = field.dim();

    let mut xs = Mat::new_rows_cols_with_default(h as _, w as _, CV_32FC1, Scalar::all(0.0))?;
    let mut ys = Mat::new_rows_cols_with_default(h as _, w as _, CV_32FC1, Scalar::all(0.0))?;

    for y in 0..h {
        let xrow = xs.at_row_mut::<f32>(y as _)?;
        for (x, out) in xrow.iter_mut().enumerate() {
            *out = field.get_motion(x, y).x;
        }

        let yrow = ys.at_row_mut::<f32>(y as _)?;
        for (x, out) in yrow.iter_mut().enumerate() {
            *out = field.get_motion(x, y).y;
        }
    }

    Ok((xs, ys))
}

fn flow_to_display(field: &FlowField) -> opencv::Result<Mat> {
    let (xs, ys) = split_field(field)?;

    let mut magnitude = Mat::default();
    let mut angle = Mat::default();
    cart_to_polar(&xs, &ys, &mut magnitude, &mut angle, true)?;

    let mut hue = Mat::default();
    angle.convert_to(&mut hue, CV_8U, 0.5, 0.0)?;

    let saturation =
        Mat::new_rows_cols_with_default(hue.rows(), hue.cols(), CV_8UC1, Scalar::all(255.0))?;

    let mut value = Mat::default();
    normalize(
        &magnitude,
        &mut value,
        0.0,
        255.0,
        NORM_MINMAX,
        CV_8U,
        &no_array(),
    )?;

    let mut hsv_split = Vector::<Mat>::new();
    hsv_split.push(hue);
    hsv_split.push(saturation);
    hsv_split.push(value);

    let mut hsv = Mat::default();
    merge(&hsv_split, &mut hsv)?;

    let mut bgr = Mat::default();
    imgproc::cvt_color_def(&hsv, &mut bgr, imgproc::COLOR_HSV2BGR)?;

    Ok(bgr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra as na;

    fn render(field: &FlowField) -> Frame {
        HsvRenderer.render(field).unwrap()
    }

    #[test]
    fn motionless_field_is_black() {
        let frame = render(&FlowField::new(8, 6));
        assert_eq!(frame.dim(), (8, 6));
        assert!(frame.pixels().iter().all(|p| *p == Bgr::default()));
    }

    #[test]
    fn uniform_motion_is_black() {
        let mut field = FlowField::new(3, 3);
        for y in 0..3 {
            for x in 0..3 {
                field.set_motion(x, y, na::Vector2::new(2.0, 2.0));
            }
        }
        assert!(render(&field).pixels().iter().all(|p| *p == Bgr::default()));
    }

    #[test]
    fn small_motion_is_stretched() {
        let mut field = FlowField::new(2, 1);
        field.set_motion(1, 0, na::Vector2::new(5e-4, 0.0));

        let frame = render(&field);
        assert_eq!(frame.get(0, 0), Bgr::new(0, 0, 0));
        assert_eq!(frame.get(1, 0), Bgr::new(0, 0, 255));
    }

    #[test]
    fn strongest_motion_is_brightest() {
        let mut field = FlowField::new(3, 1);
        field.set_motion(1, 0, na::Vector2::new(1.0, 0.0));
        field.set_motion(2, 0, na::Vector2::new(4.0, 0.0));

        let frame = render(&field);
        // Rightward motion has hue 0, which is pure red.
        assert_eq!(frame.get(0, 0), Bgr::new(0, 0, 0));
        assert_eq!(frame.get(2, 0), Bgr::new(0, 0, 255));
        let mid = frame.get(1, 0);
        assert_eq!((mid.b, mid.g), (0, 0));
        assert!((63..=64).contains(&mid.r), "{mid:?}");
    }

    #[test]
    fn direction_maps_to_hue() {
        let mut field = FlowField::new(4, 1);
        // Downward motion is 90 degrees, hue 45, between yellow and green.
        field.set_motion(1, 0, na::Vector2::new(0.0, 3.0));
        // Leftward motion is 180 degrees, hue 90, cyan.
        field.set_motion(2, 0, na::Vector2::new(-3.0, 0.0));
        // Upward motion is 270 degrees, hue 135, between blue and magenta.
        field.set_motion(3, 0, na::Vector2::new(0.0, -3.0));

        let frame = render(&field);

        let down = frame.get(1, 0);
        assert_eq!((down.b, down.g), (0, 255), "{down:?}");
        assert!((127..=128).contains(&down.r), "{down:?}");

        assert_eq!(frame.get(2, 0), Bgr::new(255, 255, 0));

        let up = frame.get(3, 0);
        assert_eq!((up.b, up.g), (255, 0), "{up:?}");
        assert!((127..=128).contains(&up.r), "{up:?}");
    }
}
