//! Tests for the per-frame state machine and the tracker loop.

mod common;

use common::*;
use donutseg::frames::{CollectingSink, DirectorySink, DirectorySource, MemorySource, StillImageSource};
use donutseg::{
    ClassificationResult, DetectError, DisplaySink, FrameSource, PairClassifier, ScheduledClick,
    Tracker,
};
use image::{Rgb, RgbImage};
use std::sync::atomic::AtomicBool;

const OUTER_LINE: Rgb<u8> = Rgb([0, 255, 0]);
const INNER_LINE: Rgb<u8> = Rgb([0, 0, 255]);

/// Classifier that always sees a flat box
struct FlatBoxClassifier;

impl PairClassifier for FlatBoxClassifier {
    fn classify(&self, _outer: &Contour, _inner: Option<&Contour>) -> donutseg::error::Result<ClassificationResult> {
        Err(DetectError::DegenerateGeometry { x: 40, y: 40, width: 100, height: 0 })
    }
}

fn body_click() -> ReseedRequest {
    ReseedRequest::Pixel { x: 45, y: 45 }
}

#[test]
fn test_unseeded_processor_finds_nothing() {
    let (mut processor, _reseeds) = FrameProcessor::new(&DetectorConfig::default());
    assert_eq!(processor.state(), TrackerState::AwaitingSeed);

    let report = processor.process(&concentric_donut());
    assert_eq!(report.result.verdict, Verdict::NoContours);
    assert_eq!(processor.state(), TrackerState::AwaitingSeed);
    assert_eq!(report.index, 0);
}

#[test]
fn test_click_seeds_and_detects_donut() {
    let (mut processor, reseeds) = FrameProcessor::new(&DetectorConfig::default());
    reseeds.send(body_click()).unwrap();

    let report = processor.process(&concentric_donut());
    assert_eq!(processor.state(), TrackerState::Tracking);
    assert_eq!(report.result.verdict, Verdict::Match);
    assert_eq!(report.bounds, processor.bounds());
    assert!(report.bounds.contains(&rgb_to_hsv(FOREGROUND)));
    assert!(!report.bounds.contains(&rgb_to_hsv(BACKGROUND)));

    assert_eq!(report.mask.get_pixel(45, 45)[0], 255);
    assert_eq!(report.mask.get_pixel(90, 90)[0], 0);
    assert_eq!(*report.annotated.get_pixel(40, 40), OUTER_LINE);
    assert!(report.annotated.pixels().any(|p| *p == INNER_LINE));
}

#[test]
fn test_tracking_stays_stable_over_frames() {
    let (mut processor, reseeds) = FrameProcessor::new(&DetectorConfig::default());
    reseeds.send(body_click()).unwrap();

    let frame = concentric_donut();
    let first = processor.process(&frame);
    let second = processor.process(&frame);
    let third = processor.process(&frame);

    assert_eq!(second.result.verdict, Verdict::Match);
    assert_eq!(third.result.verdict, Verdict::Match);
    assert!(second.bounds.encloses(&first.bounds));
    assert_eq!(second.bounds, third.bounds);
    assert_eq!(third.index, 2);
}

#[test]
fn test_offset_hole_reports_mismatch() {
    let (mut processor, reseeds) = FrameProcessor::new(&DetectorConfig::default());
    reseeds.send(ReseedRequest::Pixel { x: 25, y: 25 }).unwrap();

    let frame = donut_frame(square(20, 20, 160), &[square(110, 80, 40)]);
    let report = processor.process(&frame);
    assert_eq!(report.result.verdict, Verdict::Mismatch);
    assert!(report.result.inner.is_some());
}

#[test]
fn test_solid_square_has_no_inner_contour() {
    let (mut processor, reseeds) = FrameProcessor::new(&DetectorConfig::default());
    reseeds.send(body_click()).unwrap();

    let report = processor.process(&donut_frame(square(40, 40, 100), &[]));
    assert_eq!(report.result.verdict, Verdict::NoInnerContour);
    assert_eq!(report.result.inner, None);
    assert_eq!(*report.annotated.get_pixel(40, 40), OUTER_LINE);
    assert!(!report.annotated.pixels().any(|p| *p == INNER_LINE));
}

#[test]
fn test_click_outside_frame_is_ignored() {
    let (mut processor, reseeds) = FrameProcessor::new(&DetectorConfig::default());
    reseeds.send(ReseedRequest::Pixel { x: 500, y: 10 }).unwrap();

    let report = processor.process(&concentric_donut());
    assert_eq!(processor.state(), TrackerState::AwaitingSeed);
    assert_eq!(report.result.verdict, Verdict::NoContours);
}

#[test]
fn test_reseed_resets_bounds_but_keeps_tracking() {
    let (mut processor, reseeds) = FrameProcessor::new(&DetectorConfig::default());
    reseeds.send(body_click()).unwrap();
    processor.process(&concentric_donut());

    let elsewhere = Hsv::new(60, 100, 100);
    reseeds.send(ReseedRequest::Hsv(elsewhere)).unwrap();
    let report = processor.process(&concentric_donut());

    assert_eq!(processor.state(), TrackerState::Tracking);
    assert_eq!(report.result.verdict, Verdict::NoContours);
    assert_eq!(processor.bounds(), HsvBounds::point(elsewhere));
}

#[test]
fn test_latest_pending_reseed_wins() {
    let (mut processor, reseeds) = FrameProcessor::new(&DetectorConfig::default());
    reseeds.send(ReseedRequest::Hsv(Hsv::new(60, 100, 100))).unwrap();
    reseeds.send(body_click()).unwrap();

    let report = processor.process(&concentric_donut());
    assert_eq!(report.result.verdict, Verdict::Match);
}

#[test]
fn test_unseeded_bounds_do_not_learn() {
    let (mut processor, _reseeds) = FrameProcessor::new(&DetectorConfig::default());
    let mut frame = RgbImage::from_pixel(200, 200, BACKGROUND);
    imageproc::drawing::draw_filled_rect_mut(
        &mut frame,
        imageproc::rect::Rect::at(50, 50).of_size(60, 60),
        Rgb([0, 0, 0]),
    );

    let report = processor.process(&frame);
    assert_eq!(report.result.verdict, Verdict::NoInnerContour);
    assert_eq!(processor.bounds(), HsvBounds::point(Hsv::new(0, 0, 0)));
}

#[test]
fn test_tracker_runs_until_source_is_exhausted() -> anyhow::Result<()> {
    let mut tracker = Tracker::new(&DetectorConfig::default())
        .with_schedule(vec![ScheduledClick { frame: 1, request: body_click() }]);
    let mut source = MemorySource::new(vec![concentric_donut(); 3]);
    let mut sink = CollectingSink::default();

    let bounds = tracker.run(&mut source, &mut sink, &AtomicBool::new(false))?;

    let verdicts: Vec<Verdict> = sink.reports.iter().map(|r| r.result.verdict).collect();
    assert_eq!(verdicts, vec![Verdict::NoContours, Verdict::Match, Verdict::Match]);
    assert_eq!(bounds, tracker.processor().bounds());
    assert!(bounds.contains(&rgb_to_hsv(FOREGROUND)));
    Ok(())
}

#[test]
fn test_tracker_honors_stop_signal() -> anyhow::Result<()> {
    let mut tracker = Tracker::new(&DetectorConfig::default());
    let mut source = StillImageSource::new(concentric_donut(), None);
    let mut sink = CollectingSink::default();

    let bounds = tracker.run(&mut source, &mut sink, &AtomicBool::new(true))?;
    assert!(sink.reports.is_empty());
    assert_eq!(bounds, HsvBounds::point(Hsv::new(0, 0, 0)));
    Ok(())
}

#[test]
fn test_reseed_from_another_thread() -> anyhow::Result<()> {
    let mut tracker = Tracker::new(&DetectorConfig::default());
    let handle = tracker.reseed_handle();
    std::thread::spawn(move || handle.send(body_click()))
        .join()
        .expect("sender thread panicked")?;

    let mut source = StillImageSource::new(concentric_donut(), Some(2));
    let mut sink = CollectingSink::default();
    tracker.run(&mut source, &mut sink, &AtomicBool::new(false))?;

    assert_eq!(sink.reports.len(), 2);
    assert_eq!(sink.reports[0].result.verdict, Verdict::Match);
    Ok(())
}

#[test]
fn test_still_image_source_repeats_exactly() -> anyhow::Result<()> {
    let mut source = StillImageSource::new(concentric_donut(), Some(3));
    let mut count = 0;
    while source.next_frame()?.is_some() {
        count += 1;
    }
    assert_eq!(count, 3);
    Ok(())
}

#[test]
fn test_directory_round_trip() -> anyhow::Result<()> {
    let input = tempfile::TempDir::new()?;
    concentric_donut().save(input.path().join("b.png"))?;
    donut_frame(square(40, 40, 100), &[]).save(input.path().join("a.png"))?;
    std::fs::write(input.path().join("notes.txt"), "not a frame")?;

    let mut source = DirectorySource::open(input.path())?;
    assert_eq!(source.remaining(), 2);

    let output = tempfile::TempDir::new()?;
    let out_dir = output.path().join("run");
    let mut sink = DirectorySink::create(out_dir.clone())?;

    let mut tracker = Tracker::new(&DetectorConfig::default())
        .with_schedule(vec![ScheduledClick { frame: 0, request: body_click() }]);
    tracker.run(&mut source, &mut sink, &AtomicBool::new(false))?;

    assert!(out_dir.join("00000_mask.png").exists());
    assert!(out_dir.join("00001_annotated.png").exists());
    let verdicts = std::fs::read_to_string(out_dir.join("verdicts.txt"))?;
    let lines: Vec<&str> = verdicts.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(Verdict::NoInnerContour.label()));
    assert!(lines[1].contains(Verdict::Match.label()));
    Ok(())
}

#[test]
fn test_directory_sink_requires_empty_dir() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("existing.txt"), "x")?;

    let result = DirectorySink::create(dir.path().to_path_buf());
    assert!(result.is_err());
    let error_msg = result.err().unwrap().to_string();
    assert!(error_msg.contains("not empty"), "got: {}", error_msg);
    Ok(())
}

#[test]
fn test_directory_source_rejects_empty_dir() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    assert!(DirectorySource::open(dir.path()).is_err());
    Ok(())
}

#[test]
fn test_collecting_sink_is_a_display_sink() -> anyhow::Result<()> {
    let (mut processor, _reseeds) = FrameProcessor::new(&DetectorConfig::default());
    let report = processor.process(&concentric_donut());

    let mut sink = CollectingSink::default();
    DisplaySink::show(&mut sink, &report)?;
    assert_eq!(sink.reports.len(), 1);
    Ok(())
}

#[test]
fn test_degenerate_geometry_is_contained_per_frame() {
    let (processor, reseeds) = FrameProcessor::new(&DetectorConfig::default());
    let mut processor = processor.with_classifier(Box::new(FlatBoxClassifier));
    reseeds.send(body_click()).unwrap();

    let frame = concentric_donut();
    let first = processor.process(&frame);
    assert_eq!(first.result.verdict, Verdict::Undetermined);
    assert_eq!(first.result.outer, None);
    assert_eq!(first.result.inner, None);
    // Adaptation still happened before classification failed
    assert!(first.bounds.contains(&rgb_to_hsv(FOREGROUND)));
    assert_ne!(first.bounds, HsvBounds::point(rgb_to_hsv(FOREGROUND)));
    assert!(!first.annotated.pixels().any(|p| *p == OUTER_LINE));

    let second = processor.process(&frame);
    assert_eq!(second.index, 1);
    assert_eq!(second.result.verdict, Verdict::Undetermined);
    assert_eq!(processor.state(), TrackerState::Tracking);
}
