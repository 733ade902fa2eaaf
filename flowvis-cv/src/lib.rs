//! OpenCV backend for flowvis
//!
//! Provides video decoding and encoding through `videoio`, dense optical flow through
//! Farneback's algorithm and HSV rendering of the flow.

pub mod convert;
pub mod decoder;
pub mod encoder;
pub mod farneback;
pub mod render;

pub use decoder::CvDecoder;
pub use encoder::CvEncoder;
pub use farneback::FarnebackEstimator;
pub use render::HsvRenderer;

use flowvis::prelude::v1::*;

/// Colourizer pairing Farneback flow estimation with HSV rendering.
pub type FarnebackColorizer = FlowColorizer<FarnebackEstimator, HsvRenderer>;

/// Create the standard flow colourizer, backed by OpenCV's Farneback implementation.
pub fn farneback_colorizer(params: FlowParams) -> Result<FarnebackColorizer> {
    Ok(FlowColorizer::new(FarnebackEstimator::new(params)?, HsvRenderer))
}

/// Options for [`visualise`].
#[derive(Clone, Debug, Default)]
pub struct VisualiseOptions {
    pub params: FlowParams,
    pub fourcc: FourCc,
    pub mode: PipelineMode,
    pub cancel: CancelToken,
}

/// Visualise the optical flow of a video file into another video file.
///
/// The source is opened before anything else, so an unavailable source never creates the
/// output.
///
/// # Arguments
///
/// * `input` - source video.
/// * `output` - destination video. Frame rate and dimensions match the source.
/// * `options` - flow parameters, codec and pipeline mode.
/// * `progress` - receives progress updates.
pub fn visualise(
    input: impl AsRef<std::path::Path>,
    output: impl AsRef<std::path::Path>,
    options: &VisualiseOptions,
    progress: &mut dyn ProgressObserver,
) -> Result<Summary> {
    let colorizer = farneback_colorizer(options.params)?;
    let mut decoder = CvDecoder::open(input)?;

    let summary = Pipeline::new(colorizer)
        .with_mode(options.mode)
        .with_cancel_token(options.cancel.clone())
        .run(
            &mut decoder,
            |metadata| CvEncoder::open(output, metadata, options.fourcc),
            progress,
        )?;

    decoder.close()?;

    Ok(summary)
}
