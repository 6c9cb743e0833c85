use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use tracing::Level;

use donutseg::frames::{DirectorySink, DirectorySource, NullSink, StillImageSource};
use donutseg::{DetectorConfig, DisplaySink, FrameSource, Hsv, ReseedRequest, ScheduledClick, Tracker};

#[derive(Parser)]
#[command(name = "donutseg")]
#[command(about = "Learn a color range from a seed click and look for donut-shaped regions")]
struct Cli {
    /// Image file (replayed as a still) or directory of frames
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// How many times to replay a still image
    #[arg(long, default_value_t = 30)]
    frames: u64,

    /// Seed click as X,Y or FRAME@X,Y (repeatable)
    #[arg(long = "click", value_name = "[FRAME@]X,Y", value_parser = parse_click)]
    clicks: Vec<ScheduledClick>,

    /// Seed the bounds with an HSV color before the first frame
    #[arg(long, value_name = "H,S,V", value_parser = parse_hsv)]
    hsv: Option<Hsv>,

    /// Write masks, annotated frames and verdicts to this directory (must be empty)
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Side of the neighborhood sampled around contour points
    #[arg(long, default_value_t = 5)]
    neighborhood: u32,

    /// HSV tolerance used when growing the bounds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(i32).range(0..=255))]
    tolerance: i32,

    /// Minimum contour area for the shape check
    #[arg(long, default_value_t = 100.0)]
    min_area: f64,

    /// Largest aspect-ratio difference still counted as a match
    #[arg(long, default_value_t = 10.0)]
    max_aspect_delta: f64,

    /// Largest center distance in pixels still counted as a match
    #[arg(long, default_value_t = 20.0)]
    max_center_distance: f64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_pair(s: &str) -> Result<(u32, u32), String> {
    let (x, y) = s.split_once(',').ok_or_else(|| format!("expected X,Y, got '{}'", s))?;
    let x = x.trim().parse().map_err(|e| format!("bad x '{}': {}", x, e))?;
    let y = y.trim().parse().map_err(|e| format!("bad y '{}': {}", y, e))?;
    Ok((x, y))
}

fn parse_click(s: &str) -> Result<ScheduledClick, String> {
    let (frame, coords) = match s.split_once('@') {
        Some((frame, coords)) => {
            let frame = frame.trim().parse().map_err(|e| format!("bad frame '{}': {}", frame, e))?;
            (frame, coords)
        }
        None => (0, s),
    };
    let (x, y) = parse_pair(coords)?;
    Ok(ScheduledClick {
        frame,
        request: ReseedRequest::Pixel { x, y },
    })
}

fn parse_hsv(s: &str) -> Result<Hsv, String> {
    let parts: Vec<i32> = s
        .split(',')
        .map(|p| p.trim().parse::<i32>().map_err(|e| format!("bad channel '{}': {}", p, e)))
        .collect::<Result<_, _>>()?;
    match parts.as_slice() {
        [h, s, v] => Ok(Hsv::new(*h, *s, *v)),
        _ => Err(format!("expected H,S,V, got '{}'", s)),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    let config = DetectorConfig {
        neighborhood_size: args.neighborhood,
        tolerance: args.tolerance,
        min_area: args.min_area,
        max_aspect_delta: args.max_aspect_delta,
        max_center_distance: args.max_center_distance,
    };

    let mut source: Box<dyn FrameSource> = if args.input.is_dir() {
        Box::new(DirectorySource::open(&args.input)?)
    } else {
        Box::new(StillImageSource::open(&args.input, Some(args.frames))?)
    };

    let mut sink: Box<dyn DisplaySink> = match args.out {
        Some(dir) => Box::new(DirectorySink::create(dir)?),
        None => Box::new(NullSink),
    };

    let mut schedule = args.clicks;
    if let Some(hsv) = args.hsv {
        schedule.insert(0, ScheduledClick { frame: 0, request: ReseedRequest::Hsv(hsv) });
    }
    if schedule.is_empty() {
        tracing::warn!("no seed given; the bounds will stay unseeded");
    }

    let mut tracker = Tracker::new(&config).with_schedule(schedule);
    let stop = AtomicBool::new(false);
    let bounds = tracker.run(source.as_mut(), sink.as_mut(), &stop)?;

    println!("lower bound: {}", bounds.lower);
    println!("upper bound: {}", bounds.upper);

    Ok(())
}
