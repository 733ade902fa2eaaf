//! OpenCV video decoder.

use crate::convert::mat_to_frame;
use flowvis::prelude::v1::*;
use log::{debug, trace, warn};
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{
    VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_COUNT, CAP_PROP_FRAME_HEIGHT,
    CAP_PROP_FRAME_WIDTH,
};
use std::path::Path;

/// Decodes a video file through OpenCV's `VideoCapture`.
pub struct CvDecoder {
    capture: VideoCapture,
    frame: Mat,
    metadata: Metadata,
    path: String,
    read: u64,
    closed: bool,
}

impl CvDecoder {
    /// Open a video file.
    ///
    /// Fails with `SourceUnavailable` if the file can not be opened, or does not report usable
    /// dimensions and frame rate.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_string_lossy().into_owned();

        let unavailable = |reason: String| Error::SourceUnavailable {
            path: path.clone(),
            reason,
        };

        let capture =
            VideoCapture::from_file(&path, CAP_ANY).map_err(|e| unavailable(e.to_string()))?;

        if !capture.is_opened().map_err(|e| unavailable(e.to_string()))? {
            return Err(unavailable(
                "file is missing or the container is not supported".into(),
            ));
        }

        let prop = |id| capture.get(id).map_err(|e| unavailable(e.to_string()));

        let width = prop(CAP_PROP_FRAME_WIDTH)?;
        let height = prop(CAP_PROP_FRAME_HEIGHT)?;
        let frame_rate = prop(CAP_PROP_FPS)?;
        let frame_count = prop(CAP_PROP_FRAME_COUNT)?;

        if width < 1.0 || height < 1.0 {
            return Err(unavailable(format!("invalid dimensions {width}x{height}")));
        }

        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            return Err(unavailable(format!("invalid frame rate {frame_rate}")));
        }

        let metadata = Metadata {
            width: width as _,
            height: height as _,
            frame_rate,
            frame_count: if frame_count >= 1.0 {
                Some(frame_count as _)
            } else {
                None
            },
        };

        debug!("Opened {path}: {metadata:?}");

        Ok(Self {
            capture,
            frame: Default::default(),
            metadata,
            path,
            read: 0,
            closed: false,
        })
    }

    /// Release the decoding handle.
    ///
    /// Subsequent reads report the end of the stream.
    pub fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.capture.release().map_err(|e| Error::DecodeError {
                index: self.read,
                reason: e.to_string(),
            })?;
            debug!("Closed {} after {} frames", self.path, self.read);
        }
        Ok(())
    }
}

impl Decoder for CvDecoder {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.closed {
            return Ok(None);
        }

        let index = self.read;
        let decode_error = |reason: String| Error::DecodeError { index, reason };

        if !self
            .capture
            .read(&mut self.frame)
            .map_err(|e| decode_error(e.to_string()))?
        {
            trace!("End of stream after {index} frames");
            return Ok(None);
        }

        if self.frame.empty() {
            return Err(decode_error("decoded frame is empty".into()));
        }

        let dim = (self.frame.cols() as usize, self.frame.rows() as usize);

        if dim != self.metadata.dim() {
            return Err(decode_error(format!(
                "frame is {}x{}, stream is {}x{}",
                dim.0, dim.1, self.metadata.width, self.metadata.height
            )));
        }

        let frame = mat_to_frame(&self.frame).map_err(|e| decode_error(e.to_string()))?;

        self.read += 1;

        Ok(Some(frame))
    }
}

impl Drop for CvDecoder {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("{e}");
        }
    }
}
