//! # Frame decoding and encoding

use crate::prelude::v1::*;

/// Sequential video frame source.
pub trait Decoder {
    /// Stream properties captured when the source was opened.
    fn metadata(&self) -> &Metadata;

    /// Decode the next frame in the stream.
    ///
    /// Frames are returned in strict temporal order. `Ok(None)` marks the end of the stream,
    /// and `Err` is returned if a frame could not be retrieved, in which case the run should be
    /// aborted.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

impl<T: Decoder + ?Sized> Decoder for Box<T> {
    fn metadata(&self) -> &Metadata {
        (**self).metadata()
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        (**self).next_frame()
    }
}

/// Sequential video frame sink.
///
/// Implementations must finalise the container when dropped without an explicit `close`, so
/// that error paths still release the handle.
pub trait Encoder {
    /// Append a frame to the output.
    ///
    /// Fails with `EncodeError` if the frame does not match the declared dimensions.
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Flush and finalise the output.
    ///
    /// Calling this more than once is a no-op.
    fn close(&mut self) -> Result<()>;
}

impl<T: Encoder + ?Sized> Encoder for Box<T> {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        (**self).write_frame(frame)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
