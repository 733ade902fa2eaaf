//! OpenCV video encoder.

use crate::convert::frame_to_mat;
use flowvis::prelude::v1::*;
use log::{debug, warn};
use opencv::core::{Mat, Size};
use opencv::prelude::*;
use opencv::videoio::VideoWriter;
use std::path::Path;

/// Encodes frames into a video file through OpenCV's `VideoWriter`.
///
/// The container is finalised on `close`, or when the encoder is dropped.
pub struct CvEncoder {
    writer: VideoWriter,
    buf: Mat,
    dim: (usize, usize),
    path: String,
    written: u64,
    closed: bool,
}

impl CvEncoder {
    /// Open an output video.
    ///
    /// # Arguments
    ///
    /// * `path` - output file. The container is picked from its extension.
    /// * `metadata` - dimensions and frame rate of the output.
    /// * `fourcc` - output codec.
    pub fn open(path: impl AsRef<Path>, metadata: &Metadata, fourcc: FourCc) -> Result<Self> {
        let path = path.as_ref().to_string_lossy().into_owned();

        let unwritable = |reason: String| Error::DestinationUnwritable {
            path: path.clone(),
            reason,
        };

        let [c1, c2, c3, c4] = fourcc.chars();
        let code = VideoWriter::fourcc(c1, c2, c3, c4).map_err(|e| unwritable(e.to_string()))?;

        let size = Size::new(metadata.width as _, metadata.height as _);

        let writer = VideoWriter::new(&path, code, metadata.frame_rate, size, true)
            .map_err(|e| unwritable(e.to_string()))?;

        if !writer.is_opened().map_err(|e| unwritable(e.to_string()))? {
            return Err(unwritable(format!(
                "no backend accepts {fourcc} at {}x{} @ {} fps",
                metadata.width, metadata.height, metadata.frame_rate
            )));
        }

        debug!("Opened {path} for writing ({fourcc})");

        Ok(Self {
            writer,
            buf: Default::default(),
            dim: metadata.dim(),
            path,
            written: 0,
            closed: false,
        })
    }

    /// Number of frames written so far.
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl Encoder for CvEncoder {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let index = self.written;
        let encode_error = |reason: String| Error::EncodeError { index, reason };

        if self.closed {
            return Err(encode_error("writer is closed".into()));
        }

        if frame.dim() != self.dim {
            return Err(encode_error(format!(
                "frame is {}x{}, output is {}x{}",
                frame.width(),
                frame.height(),
                self.dim.0,
                self.dim.1
            )));
        }

        frame_to_mat(frame, &mut self.buf).map_err(|e| encode_error(e.to_string()))?;
        self.writer
            .write(&self.buf)
            .map_err(|e| encode_error(e.to_string()))?;

        self.written += 1;

        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.writer.release().map_err(|e| Error::EncodeError {
                index: self.written,
                reason: e.to_string(),
            })?;
            debug!("Closed {} after {} frames", self.path, self.written);
        }
        Ok(())
    }
}

impl Drop for CvEncoder {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("{e}");
        }
    }
}
