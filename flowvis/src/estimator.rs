//! # Flow estimation and colourisation

use crate::prelude::v1::*;

/// Dense optical flow estimator.
pub trait FlowEstimator {
    /// Estimate motion of every pixel between two frames.
    ///
    /// The returned field has the same dimensions as the frames.
    ///
    /// # Arguments
    ///
    /// * `prev` - earlier frame.
    /// * `next` - frame immediately following `prev`.
    fn estimate(&self, prev: &Frame, next: &Frame) -> Result<FlowField>;
}

/// Turns a pair of adjacent frames into a single output frame.
///
/// Implementations must not hold mutable state between calls: identical inputs always produce
/// identical outputs, and distinct frame pairs may be processed independently.
pub trait Colorizer {
    fn colorize(&self, prev: &Frame, next: &Frame) -> Result<Frame>;
}

/// Renders a flow field as an image.
pub trait FlowRenderer {
    /// Render the field into a frame of the same dimensions.
    fn render(&self, field: &FlowField) -> Result<Frame>;
}

/// Colourises the optical flow between two frames.
///
/// The estimator computes the motion of every pixel, and the renderer turns that motion into
/// colour.
pub struct FlowColorizer<E, R> {
    estimator: E,
    renderer: R,
}

impl<E: FlowEstimator, R: FlowRenderer> FlowColorizer<E, R> {
    pub fn new(estimator: E, renderer: R) -> Self {
        Self {
            estimator,
            renderer,
        }
    }
}

impl<E: FlowEstimator, R: FlowRenderer> Colorizer for FlowColorizer<E, R> {
    fn colorize(&self, prev: &Frame, next: &Frame) -> Result<Frame> {
        if prev.dim() != next.dim() {
            return Err(Error::InvalidFrame(format!(
                "frame pair dimensions differ: {:?} vs {:?}",
                prev.dim(),
                next.dim()
            )));
        }

        let field = self.estimator.estimate(prev, next)?;

        if field.dim() != prev.dim() {
            return Err(Error::Backend(format!(
                "estimator produced a {:?} field for {:?} frames",
                field.dim(),
                prev.dim()
            )));
        }

        self.renderer.render(&field)
    }
}

impl<T: Colorizer + ?Sized> Colorizer for &T {
    fn colorize(&self, prev: &Frame, next: &Frame) -> Result<Frame> {
        (**self).colorize(prev, next)
    }
}
