//! # Frame pair processing pipeline
//!
//! The pipeline reads frames from a [`Decoder`], colourises every adjacent pair with a
//! [`Colorizer`] and hands the results to an [`Encoder`]. A run with `N` input frames produces
//! `N - 1` output frames with the dimensions and frame rate of the source.

use crate::prelude::v1::*;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How colourised frames are handed to the encoder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PipelineMode {
    /// Colourise the whole video into memory, then open the output and write it out.
    Buffered,
    /// Open the output first and write every frame as soon as it is colourised.
    #[default]
    Streaming,
}

/// Shared flag that aborts a run between frame pairs.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Outcome of a successful run.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    /// Metadata of the source, which the output shares.
    pub metadata: Metadata,
    pub frames_read: u64,
    pub frames_written: u64,
}

/// Drives frames from a decoder through a colourizer into an encoder.
pub struct Pipeline<C> {
    colorizer: C,
    mode: PipelineMode,
    cancel: CancelToken,
}

impl<C: Colorizer> Pipeline<C> {
    pub fn new(colorizer: C) -> Self {
        Self {
            colorizer,
            mode: Default::default(),
            cancel: Default::default(),
        }
    }

    pub fn with_mode(mut self, mode: PipelineMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Process the whole stream.
    ///
    /// # Arguments
    ///
    /// * `decoder` - opened source. Its metadata is used for the output.
    /// * `open_encoder` - opens the output for the given metadata. In buffered mode this is only
    /// called after every frame has been colourised.
    /// * `progress` - receives progress updates.
    pub fn run<D, E, F>(
        &self,
        decoder: &mut D,
        open_encoder: F,
        progress: &mut dyn ProgressObserver,
    ) -> Result<Summary>
    where
        D: Decoder + ?Sized,
        E: Encoder,
        F: FnOnce(&Metadata) -> Result<E>,
    {
        let metadata = decoder.metadata().clone();

        info!(
            "Source: {}x{} @ {} fps, {} frames",
            metadata.width,
            metadata.height,
            metadata.frame_rate,
            metadata
                .frame_count
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".into())
        );

        let summary = match self.mode {
            PipelineMode::Buffered => self.run_buffered(decoder, metadata, open_encoder, progress),
            PipelineMode::Streaming => {
                self.run_streaming(decoder, metadata, open_encoder, progress)
            }
        }?;

        info!(
            "Done: {} frames read, {} frames written",
            summary.frames_read, summary.frames_written
        );

        Ok(summary)
    }

    fn run_buffered<D, E, F>(
        &self,
        decoder: &mut D,
        metadata: Metadata,
        open_encoder: F,
        progress: &mut dyn ProgressObserver,
    ) -> Result<Summary>
    where
        D: Decoder + ?Sized,
        E: Encoder,
        F: FnOnce(&Metadata) -> Result<E>,
    {
        debug!("Reading");

        let mut frames = vec![];
        let frames_read = self.for_each_pair(decoder, &metadata, progress, |frame| {
            frames.push(frame);
            Ok(())
        })?;

        debug!("Writing {} buffered frames", frames.len());

        let mut encoder = open_encoder(&metadata)?;
        let mut tracker = ProgressTracker::new(Some(frames.len() as u64));
        let mut frames_written = 0;

        for frame in frames.drain(..) {
            encoder.write_frame(&frame)?;
            frames_written += 1;
            progress.on_progress(Stage::Writing, tracker.update(frames_written));
        }

        encoder.close()?;
        progress.on_progress(Stage::Writing, tracker.finish());

        Ok(Summary {
            metadata,
            frames_read,
            frames_written,
        })
    }

    fn run_streaming<D, E, F>(
        &self,
        decoder: &mut D,
        metadata: Metadata,
        open_encoder: F,
        progress: &mut dyn ProgressObserver,
    ) -> Result<Summary>
    where
        D: Decoder + ?Sized,
        E: Encoder,
        F: FnOnce(&Metadata) -> Result<E>,
    {
        let mut encoder = open_encoder(&metadata)?;
        let mut frames_written = 0;

        debug!("Processing");

        let frames_read = self.for_each_pair(decoder, &metadata, progress, |frame| {
            encoder.write_frame(&frame)?;
            frames_written += 1;
            Ok(())
        })?;

        encoder.close()?;

        Ok(Summary {
            metadata,
            frames_read,
            frames_written,
        })
    }

    /// Colourise every adjacent frame pair, in order.
    ///
    /// Returns the number of frames read.
    fn for_each_pair<D: Decoder + ?Sized>(
        &self,
        decoder: &mut D,
        metadata: &Metadata,
        progress: &mut dyn ProgressObserver,
        mut sink: impl FnMut(Frame) -> Result<()>,
    ) -> Result<u64> {
        let mut tracker = ProgressTracker::new(metadata.frame_count);

        self.check_cancelled()?;

        let mut prev = match decoder.next_frame()? {
            Some(frame) => frame,
            None => {
                warn!("Source contains no frames");
                progress.on_progress(Stage::Processing, tracker.finish());
                return Ok(0);
            }
        };

        let mut frames_read = 1;
        progress.on_progress(Stage::Processing, tracker.update(frames_read));

        loop {
            self.check_cancelled()?;

            let Some(next) = decoder.next_frame()? else {
                break;
            };

            frames_read += 1;
            sink(self.colorizer.colorize(&prev, &next)?)?;
            prev = next;

            progress.on_progress(Stage::Processing, tracker.update(frames_read));
        }

        progress.on_progress(Stage::Processing, tracker.finish());

        Ok(frames_read)
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::tests::{test_colorizer, TestColorizer};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct VecDecoder {
        metadata: Metadata,
        frames: std::vec::IntoIter<Frame>,
        fail_at: Option<u64>,
        read: u64,
    }

    impl VecDecoder {
        fn new(count: usize, reported: Option<u64>) -> Self {
            let frames = (0..count)
                .map(|i| Frame::filled(4, 3, Bgr::new(i as u8 * 20, 0, 0)))
                .collect::<Vec<_>>();
            Self {
                metadata: Metadata {
                    width: 4,
                    height: 3,
                    frame_rate: 10.0,
                    frame_count: reported,
                },
                frames: frames.into_iter(),
                fail_at: None,
                read: 0,
            }
        }
    }

    impl Decoder for VecDecoder {
        fn metadata(&self) -> &Metadata {
            &self.metadata
        }

        fn next_frame(&mut self) -> Result<Option<Frame>> {
            if Some(self.read) == self.fail_at {
                return Err(Error::DecodeError {
                    index: self.read,
                    reason: "corrupt".into(),
                });
            }
            self.read += 1;
            Ok(self.frames.next())
        }
    }

    #[derive(Default)]
    struct Sink {
        opened: Option<Metadata>,
        frames: Vec<Frame>,
        closes: usize,
        dropped: bool,
    }

    struct VecEncoder {
        sink: Rc<RefCell<Sink>>,
        dim: (usize, usize),
        closed: bool,
    }

    impl VecEncoder {
        fn opener(
            sink: &Rc<RefCell<Sink>>,
        ) -> impl FnOnce(&Metadata) -> Result<VecEncoder> + '_ {
            move |metadata| {
                sink.borrow_mut().opened = Some(metadata.clone());
                Ok(VecEncoder {
                    sink: sink.clone(),
                    dim: metadata.dim(),
                    closed: false,
                })
            }
        }
    }

    impl Encoder for VecEncoder {
        fn write_frame(&mut self, frame: &Frame) -> Result<()> {
            if frame.dim() != self.dim || self.closed {
                return Err(Error::EncodeError {
                    index: self.sink.borrow().frames.len() as u64,
                    reason: "bad frame".into(),
                });
            }
            self.sink.borrow_mut().frames.push(frame.clone());
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            if !self.closed {
                self.closed = true;
                self.sink.borrow_mut().closes += 1;
            }
            Ok(())
        }
    }

    impl Drop for VecEncoder {
        fn drop(&mut self) {
            let _ = self.close();
            self.sink.borrow_mut().dropped = true;
        }
    }

    fn pipeline(mode: PipelineMode) -> Pipeline<TestColorizer> {
        Pipeline::new(test_colorizer()).with_mode(mode)
    }

    const MODES: [PipelineMode; 2] = [PipelineMode::Buffered, PipelineMode::Streaming];

    #[test]
    fn produces_one_less_frame() {
        for mode in MODES {
            let sink = Rc::new(RefCell::new(Sink::default()));
            let mut decoder = VecDecoder::new(10, Some(10));

            let summary = pipeline(mode)
                .run(&mut decoder, VecEncoder::opener(&sink), &mut NoProgress)
                .unwrap();

            assert_eq!(summary.frames_read, 10);
            assert_eq!(summary.frames_written, 9);

            let sink = sink.borrow();
            assert_eq!(sink.frames.len(), 9);
            assert_eq!(sink.closes, 1);
            assert!(sink.frames.iter().all(|f| f.dim() == (4, 3)));

            let opened = sink.opened.as_ref().unwrap();
            assert_eq!(opened.frame_rate, 10.0);
            assert_eq!(opened.dim(), (4, 3));
        }
    }

    #[test]
    fn short_sources_produce_nothing() {
        for mode in MODES {
            for count in [0, 1] {
                let sink = Rc::new(RefCell::new(Sink::default()));
                let mut decoder = VecDecoder::new(count, Some(count as u64));
                let summary = pipeline(mode)
                    .run(&mut decoder, VecEncoder::opener(&sink), &mut NoProgress)
                    .unwrap();
                assert_eq!(summary.frames_written, 0);
                assert_eq!(sink.borrow().closes, 1);
            }
        }
    }

    #[test]
    fn progress_is_monotonic_and_bounded() {
        for mode in MODES {
            // Misreported frame counts must not break progress either.
            for reported in [None, Some(0), Some(3), Some(6), Some(50)] {
                let sink = Rc::new(RefCell::new(Sink::default()));
                let mut decoder = VecDecoder::new(6, reported);
                let mut seen: Vec<(Stage, f32)> = vec![];

                pipeline(mode)
                    .run(
                        &mut decoder,
                        VecEncoder::opener(&sink),
                        &mut |stage: Stage, percent: f32| seen.push((stage, percent)),
                    )
                    .unwrap();

                for stage in [Stage::Processing, Stage::Writing] {
                    let values = seen
                        .iter()
                        .filter(|(s, _)| *s == stage)
                        .map(|(_, p)| *p)
                        .collect::<Vec<_>>();

                    if stage == Stage::Writing && mode == PipelineMode::Streaming {
                        assert!(values.is_empty());
                        continue;
                    }

                    assert!(values.iter().all(|v| (0.0..=100.0).contains(v)));
                    assert!(values.windows(2).all(|w| w[0] <= w[1]));
                    assert_eq!(values.last().copied(), Some(100.0));
                }
            }
        }
    }

    #[test]
    fn buffered_opens_output_after_processing() {
        let events = RefCell::new(vec![]);
        let mut decoder = VecDecoder::new(5, Some(5));

        let res = pipeline(PipelineMode::Buffered).run(
            &mut decoder,
            |_: &Metadata| -> Result<VecEncoder> {
                events.borrow_mut().push(None);
                Err(Error::DestinationUnwritable {
                    path: "out".into(),
                    reason: "read-only".into(),
                })
            },
            &mut |stage: Stage, percent: f32| events.borrow_mut().push(Some((stage, percent))),
        );

        assert!(matches!(res, Err(Error::DestinationUnwritable { .. })));
        // Every frame was read before the output was opened.
        assert_eq!(decoder.read, 6);

        let events = events.into_inner();
        let open = events.iter().position(Option::is_none).unwrap();
        assert_eq!(open, events.len() - 1);
        assert_eq!(events[open - 1], Some((Stage::Processing, 100.0)));
    }

    #[test]
    fn decode_error_aborts_and_closes_output() {
        for mode in MODES {
            let sink = Rc::new(RefCell::new(Sink::default()));
            let mut decoder = VecDecoder::new(8, Some(8));
            decoder.fail_at = Some(4);

            let res = pipeline(mode).run(&mut decoder, VecEncoder::opener(&sink), &mut NoProgress);

            assert!(matches!(res, Err(Error::DecodeError { index: 4, .. })));

            let sink = sink.borrow();
            match mode {
                PipelineMode::Buffered => assert!(sink.opened.is_none()),
                PipelineMode::Streaming => {
                    assert_eq!(sink.frames.len(), 3);
                    assert_eq!(sink.closes, 1);
                    assert!(sink.dropped);
                }
            }
        }
    }

    #[test]
    fn cancellation_stops_between_pairs() {
        for mode in MODES {
            let sink = Rc::new(RefCell::new(Sink::default()));
            let mut decoder = VecDecoder::new(8, Some(8));
            let token = CancelToken::new();
            let observer_token = token.clone();

            let res = pipeline(mode).with_cancel_token(token).run(
                &mut decoder,
                VecEncoder::opener(&sink),
                &mut move |_: Stage, percent: f32| {
                    if percent >= 50.0 {
                        observer_token.cancel();
                    }
                },
            );

            assert!(matches!(res, Err(Error::Cancelled)));
            assert!(decoder.read < 8);
        }
    }

    #[test]
    fn encode_error_aborts() {
        let sink = Rc::new(RefCell::new(Sink::default()));
        let mut decoder = VecDecoder::new(3, Some(3));

        let res = pipeline(PipelineMode::Streaming).run(
            &mut decoder,
            |metadata: &Metadata| -> Result<VecEncoder> {
                let mut enc = VecEncoder::opener(&sink)(metadata)?;
                enc.dim = (1, 1);
                Ok(enc)
            },
            &mut NoProgress,
        );

        assert!(matches!(res, Err(Error::EncodeError { index: 0, .. })));
        assert_eq!(sink.borrow().closes, 1);
    }
}
