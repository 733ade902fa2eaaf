//! # Dense Optical Flow Visualisation
//!
//! This library turns a video into a visualisation of its dense optical flow. Every pair of
//! adjacent frames is colourised, with hue encoding direction and value encoding magnitude of
//! motion, and the results are written out at the source frame rate.
//!
//! The library only describes the pipeline. Video backends and flow estimators implement the
//! [`Decoder`](decoder::Decoder), [`Encoder`](decoder::Encoder) and
//! [`FlowEstimator`](estimator::FlowEstimator) and [`FlowRenderer`](estimator::FlowRenderer)
//! traits.
//!
//! The easiest way to use the library is to import its prelude:
//!
//! ```
//! use flowvis::prelude::v1::*;
//! ```

pub mod decoder;
pub mod error;
pub mod estimator;
pub mod flow_field;
pub mod frame;
pub mod params;
pub mod pipeline;
pub mod progress;

pub use error::{Error, Result};

pub mod prelude {
    pub mod v1 {
        pub use crate::{
            decoder::{Decoder, Encoder},
            error::{Error, Result},
            estimator::{Colorizer, FlowColorizer, FlowEstimator, FlowRenderer},
            flow_field::FlowField,
            frame::{Bgr, Frame, Metadata},
            params::{FlowParams, FourCc},
            pipeline::{CancelToken, Pipeline, PipelineMode, Summary},
            progress::{LogProgress, NoProgress, ProgressObserver, ProgressTracker, Stage},
        };
    }
}
