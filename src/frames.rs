use anyhow::Result;
use image::{ImageReader, RgbImage};
use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::pipeline::FrameReport;

/// Supplies RGB frames to the tracker
pub trait FrameSource {
    /// Next frame, or `None` once the source is exhausted
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Human-readable name (used in log output)
    fn name(&self) -> &str;
}

/// Receives the mask and annotated frame for every processed frame
pub trait DisplaySink {
    fn show(&mut self, report: &FrameReport) -> Result<()>;
}

fn load_rgb(path: &Path) -> Result<RgbImage> {
    let img = ImageReader::open(path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image {}: {}", path.display(), e))?;
    Ok(img.to_rgb8())
}

/// One still image served repeatedly, `None` repeat meaning forever
pub struct StillImageSource {
    image: RgbImage,
    remaining: Option<u64>,
}

impl StillImageSource {
    pub fn new(image: RgbImage, repeat: Option<u64>) -> Self {
        Self {
            image,
            remaining: repeat,
        }
    }

    pub fn open(path: &Path, repeat: Option<u64>) -> Result<Self> {
        Ok(Self::new(load_rgb(path)?, repeat))
    }
}

impl FrameSource for StillImageSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        match &mut self.remaining {
            Some(0) => Ok(None),
            Some(n) => {
                *n -= 1;
                Ok(Some(self.image.clone()))
            }
            None => Ok(Some(self.image.clone())),
        }
    }

    fn name(&self) -> &str {
        "still image"
    }
}

/// Image files in a directory, played back in file-name order
pub struct DirectorySource {
    paths: VecDeque<PathBuf>,
}

impl DirectorySource {
    const EXTENSIONS: [&'static str; 5] = ["png", "jpg", "jpeg", "bmp", "tiff"];

    pub fn open(dir: &Path) -> Result<Self> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| Self::EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            })
            .collect();

        if paths.is_empty() {
            anyhow::bail!("No image files found in {}", dir.display());
        }
        paths.sort();

        Ok(Self {
            paths: paths.into(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

impl FrameSource for DirectorySource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        match self.paths.pop_front() {
            Some(path) => {
                debug!(path = %path.display(), "loading frame");
                load_rgb(&path).map(Some)
            }
            None => Ok(None),
        }
    }

    fn name(&self) -> &str {
        "image directory"
    }
}

/// Frames already held in memory
pub struct MemorySource {
    frames: VecDeque<RgbImage>,
}

impl MemorySource {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        Ok(self.frames.pop_front())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Writes `NNNNN_mask.png`, `NNNNN_annotated.png` and a line per frame in
/// `verdicts.txt`
pub struct DirectorySink {
    output_dir: PathBuf,
}

impl DirectorySink {
    /// The directory must be empty or non-existent
    pub fn create(output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Output directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl DisplaySink for DirectorySink {
    fn show(&mut self, report: &FrameReport) -> Result<()> {
        let mask_path = self.output_dir.join(format!("{:05}_mask.png", report.index));
        report.mask.save(&mask_path)
            .map_err(|e| anyhow::anyhow!("Failed to save mask: {}", e))?;

        let annotated_path = self.output_dir.join(format!("{:05}_annotated.png", report.index));
        report.annotated.save(&annotated_path)
            .map_err(|e| anyhow::anyhow!("Failed to save annotated frame: {}", e))?;

        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.output_dir.join("verdicts.txt"))?;
        writeln!(log, "{:05}\t{}\t{}", report.index, report.result.verdict, report.bounds)?;

        Ok(())
    }
}

/// Keeps every report in memory
#[derive(Default)]
pub struct CollectingSink {
    pub reports: Vec<FrameReport>,
}

impl DisplaySink for CollectingSink {
    fn show(&mut self, report: &FrameReport) -> Result<()> {
        self.reports.push(report.clone());
        Ok(())
    }
}

/// Discards everything
pub struct NullSink;

impl DisplaySink for NullSink {
    fn show(&mut self, _report: &FrameReport) -> Result<()> {
        Ok(())
    }
}
