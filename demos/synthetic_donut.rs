use donutseg::frames::{CollectingSink, StillImageSource};
use donutseg::{DetectorConfig, ReseedRequest, ScheduledClick, Tracker};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use std::sync::atomic::AtomicBool;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Orange ring on a dark teal background, with a soft edge band that the
    // seed color alone does not cover
    let mut img = RgbImage::from_pixel(240, 240, Rgb([10, 60, 70]));
    draw_filled_rect_mut(&mut img, Rect::at(38, 38).of_size(164, 164), Rgb([225, 125, 35]));
    draw_filled_rect_mut(&mut img, Rect::at(40, 40).of_size(160, 160), Rgb([230, 120, 30]));
    draw_filled_rect_mut(&mut img, Rect::at(90, 90).of_size(60, 60), Rgb([10, 60, 70]));

    let mut source = StillImageSource::new(img, Some(5));
    let mut sink = CollectingSink::default();
    let mut tracker = Tracker::new(&DetectorConfig::default()).with_schedule(vec![ScheduledClick {
        frame: 0,
        request: ReseedRequest::Pixel { x: 60, y: 60 },
    }]);

    let bounds = tracker.run(&mut source, &mut sink, &AtomicBool::new(false))?;

    for report in &sink.reports {
        println!("frame {}: {} (bounds {})", report.index, report.result.verdict, report.bounds);
    }
    println!("\nFinal bounds: {}", bounds);

    Ok(())
}
