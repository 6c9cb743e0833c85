use anyhow::Result;
use image::{GrayImage, RgbImage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, info, warn};

use crate::detection::annotate::annotate;
use crate::detection::{
    analyze, select_largest_and_child, ColorRangeModel, ContourSet, DetectorConfig, HsvFrame,
    PairClassifier, ShapeMatcher,
};
use crate::error::DetectError;
use crate::frames::{DisplaySink, FrameSource};
use crate::models::{ClassificationResult, Hsv, HsvBounds, Verdict};

/// Whether the color model has been seeded yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    AwaitingSeed,
    Tracking,
}

/// Request to reset the color bounds, consumed at the top of the next frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReseedRequest {
    /// Take the color of the frame pixel at (x, y)
    Pixel { x: u32, y: u32 },
    Hsv(Hsv),
}

/// Everything the display sink receives for one frame
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub index: u64,
    /// Mask built from the bounds in effect when the frame arrived
    pub mask: GrayImage,
    pub annotated: RgbImage,
    pub result: ClassificationResult,
    /// Bounds after this frame's expansion
    pub bounds: HsvBounds,
}

/// Per-frame detection: threshold, trace, adapt, classify.
///
/// Owns the color model outright. Reseed requests arrive over a channel so
/// any thread can click without touching the bounds directly.
pub struct FrameProcessor {
    model: ColorRangeModel,
    classifier: Box<dyn PairClassifier>,
    state: TrackerState,
    reseeds: Receiver<ReseedRequest>,
    frames_seen: u64,
}

impl FrameProcessor {
    /// Create a processor and the sender used to deliver reseed requests
    pub fn new(config: &DetectorConfig) -> (Self, Sender<ReseedRequest>) {
        let (sender, receiver) = mpsc::channel();
        let processor = Self {
            model: ColorRangeModel::new(config),
            classifier: Box::new(ShapeMatcher::new(config)),
            state: TrackerState::AwaitingSeed,
            reseeds: receiver,
            frames_seen: 0,
        };
        (processor, sender)
    }

    /// Replace the default `ShapeMatcher` with another pair classifier
    pub fn with_classifier(mut self, classifier: Box<dyn PairClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn bounds(&self) -> HsvBounds {
        self.model.bounds()
    }

    /// Number of frames processed so far, i.e. the index of the next frame
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Seed the color model directly and start tracking
    pub fn seed(&mut self, hsv: Hsv) {
        self.model.seed(hsv);
        self.state = TrackerState::Tracking;
        info!(bounds = %self.model.bounds(), "seeded color bounds");
    }

    fn apply_reseeds(&mut self, frame: &HsvFrame) {
        while let Ok(request) = self.reseeds.try_recv() {
            match request {
                ReseedRequest::Hsv(hsv) => self.seed(hsv),
                ReseedRequest::Pixel { x, y } => match frame.get(x, y) {
                    Some(hsv) => {
                        debug!(x, y, %hsv, "click sampled");
                        self.seed(hsv);
                    }
                    None => {
                        let err = DetectError::ClickOutOfFrame {
                            x,
                            y,
                            width: frame.width(),
                            height: frame.height(),
                        };
                        warn!(error = %err, "ignoring click");
                    }
                },
            }
        }
    }

    /// Run one frame through the pipeline. Per-frame errors are logged and
    /// folded into the report; nothing here stops the caller's loop.
    pub fn process(&mut self, frame: &RgbImage) -> FrameReport {
        let index = self.frames_seen;
        self.frames_seen += 1;

        let hsv = HsvFrame::from_rgb(frame);
        self.apply_reseeds(&hsv);

        let mask = self.model.mask(&hsv);
        let set = analyze(&mask);
        debug!(frame = index, contours = set.len(), "traced mask");

        let result = if set.is_empty() {
            ClassificationResult::bare(Verdict::NoContours)
        } else {
            self.track(index, &hsv, &set)
        };

        FrameReport {
            index,
            annotated: annotate(frame, &result),
            mask,
            result,
            bounds: self.model.bounds(),
        }
    }

    /// Select the pair, adapt the bounds, classify.
    ///
    /// Expansion only runs in `Tracking`: while `AwaitingSeed` the bounds are
    /// the unseeded (0,0,0) point, so the frame is still traced and classified
    /// but nothing is learned from it.
    fn track(&mut self, index: u64, frame: &HsvFrame, set: &ContourSet) -> ClassificationResult {
        let (outer, inner) = match select_largest_and_child(set) {
            Ok(selection) => selection,
            Err(err) => {
                warn!(frame = index, error = %err, "contour selection failed");
                return ClassificationResult::bare(Verdict::Undetermined);
            }
        };

        if self.state == TrackerState::Tracking {
            self.model.expand(frame, &set.contours[outer]);
            if let Some(inner) = inner {
                self.model.expand(frame, &set.contours[inner]);
            }
        }

        let inner_contour = inner.map(|i| &set.contours[i]);
        match self.classifier.classify(&set.contours[outer], inner_contour) {
            Ok(result) => result,
            Err(err) => {
                warn!(frame = index, error = %err, "skipping classification");
                ClassificationResult::bare(Verdict::Undetermined)
            }
        }
    }
}

/// A reseed request to deliver just before a given frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledClick {
    pub frame: u64,
    pub request: ReseedRequest,
}

/// Main loop: pull frames, process them, hand reports to the sink
pub struct Tracker {
    processor: FrameProcessor,
    reseeds: Sender<ReseedRequest>,
    schedule: Vec<ScheduledClick>,
}

impl Tracker {
    pub fn new(config: &DetectorConfig) -> Self {
        let (processor, reseeds) = FrameProcessor::new(config);
        Self {
            processor,
            reseeds,
            schedule: Vec::new(),
        }
    }

    pub fn with_schedule(mut self, schedule: Vec<ScheduledClick>) -> Self {
        self.schedule = schedule;
        self
    }

    /// Sender for reseed requests from another thread or an input handler
    pub fn reseed_handle(&self) -> Sender<ReseedRequest> {
        self.reseeds.clone()
    }

    pub fn processor(&self) -> &FrameProcessor {
        &self.processor
    }

    /// Process frames until the source runs dry or `stop` is raised.
    /// Returns the bounds learned by the end of the run.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        sink: &mut dyn DisplaySink,
        stop: &AtomicBool,
    ) -> Result<HsvBounds> {
        info!(source = source.name(), "tracking started");

        while !stop.load(Ordering::Relaxed) {
            let next = self.processor.frames_seen();
            for click in self.schedule.iter().filter(|c| c.frame == next) {
                self.reseeds
                    .send(click.request)
                    .map_err(|e| anyhow::anyhow!("Failed to queue reseed: {}", e))?;
            }

            let Some(frame) = source.next_frame()? else {
                info!("frame source exhausted");
                break;
            };

            let report = self.processor.process(&frame);
            debug!(frame = report.index, verdict = %report.result.verdict, bounds = %report.bounds, "frame done");
            sink.show(&report)?;
        }

        let bounds = self.processor.bounds();
        info!(frames = self.processor.frames_seen(), %bounds, "tracking finished");
        Ok(bounds)
    }
}
