//! Conversions between `Frame` and OpenCV matrices.

use flowvis::prelude::v1::*;
use opencv::core::{Mat, Scalar, CV_8UC3};
use opencv::imgproc;
use opencv::prelude::*;

/// Wrap an OpenCV error into a backend error.
pub(crate) fn backend(e: opencv::Error) -> Error {
    Error::Backend(e.to_string())
}

/// Copy a frame into a 3-channel 8-bit matrix.
///
/// `out` is reused if it already has the right size and type.
pub fn frame_to_mat(frame: &Frame, out: &mut Mat) -> opencv::Result<()> {
    let (w, h) = frame.dim();

    if out.rows() != h as i32 || out.cols() != w as i32 || out.typ() != CV_8UC3 {
        *out = Mat::new_rows_cols_with_default(h as _, w as _, CV_8UC3, Scalar::all(0.0))?;
    }

    out.data_bytes_mut()?.copy_from_slice(frame.as_bytes());

    Ok(())
}

/// Copy an 8-bit matrix into a frame.
///
/// Grey and BGRA matrices are converted to BGR.
pub fn mat_to_frame(mat: &Mat) -> Result<Frame> {
    let code = match mat.channels() {
        3 => None,
        1 => Some(imgproc::COLOR_GRAY2BGR),
        4 => Some(imgproc::COLOR_BGRA2BGR),
        c => {
            return Err(Error::InvalidFrame(format!(
                "unsupported channel count {c}"
            )))
        }
    };

    let mut converted = Mat::default();

    let bgr = if let Some(code) = code {
        imgproc::cvt_color_def(mat, &mut converted, code).map_err(backend)?;
        &converted
    } else if !mat.is_continuous() {
        converted = mat.try_clone().map_err(backend)?;
        &converted
    } else {
        mat
    };

    if bgr.typ() != CV_8UC3 {
        return Err(Error::InvalidFrame(format!(
            "expected an 8-bit image, got type {}",
            bgr.typ()
        )));
    }

    Frame::from_bytes(
        bgr.cols() as _,
        bgr.rows() as _,
        bgr.data_bytes().map_err(backend)?,
    )
}

/// Convert a frame to a single channel intensity matrix.
pub fn frame_to_gray(frame: &Frame) -> opencv::Result<Mat> {
    let mut bgr = Mat::default();
    let mut gray = Mat::default();
    frame_to_mat(frame, &mut bgr)?;
    imgproc::cvt_color_def(&bgr, &mut gray, imgproc::COLOR_BGR2GRAY)?;
    Ok(gray)
}
