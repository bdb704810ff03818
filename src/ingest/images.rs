//! Image-directory backend for `FileSource`.
//!
//! Every `.png`, `.jpg` or `.jpeg` file in the directory is one frame, in file
//! name order. Images are converted to RGB8 and resized to the configured
//! frame size when they differ. Files that fail to decode are skipped with a
//! warning. A frame's index is its file's position in that order, so a
//! skipped file leaves a gap instead of shifting later frames.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use image::imageops::FilterType;

use super::file::{FileConfig, FileStats};
use crate::frame::Frame;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

pub(crate) struct ImageDirSource {
    config: FileConfig,
    files: Vec<PathBuf>,
    next: usize,
    frame_count: u64,
    skipped: u64,
}

impl ImageDirSource {
    pub(crate) fn new(config: FileConfig) -> Result<Self> {
        let dir = Path::new(&config.path);
        if !dir.is_dir() {
            return Err(anyhow!("{} is not a directory", dir.display()));
        }
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| anyhow!("failed to list {}: {}", dir.display(), e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_image_extension(path))
            .collect();
        files.sort();
        Ok(Self {
            config,
            files,
            next: 0,
            frame_count: 0,
            skipped: 0,
        })
    }

    pub(crate) fn connect(&mut self) -> Result<()> {
        if self.files.is_empty() {
            return Err(anyhow!("no images found in {}", self.config.path));
        }
        log::info!(
            "FileSource: connected to {} ({} image(s))",
            self.config.path,
            self.files.len()
        );
        Ok(())
    }

    pub(crate) fn next_frame(&mut self) -> Result<Option<Frame>> {
        while let Some(path) = self.files.get(self.next) {
            let index = self.next as u64;
            self.next += 1;
            match image::open(path) {
                Ok(img) => {
                    let mut rgb = img.to_rgb8();
                    if rgb.dimensions() != (self.config.width, self.config.height) {
                        rgb = image::imageops::resize(
                            &rgb,
                            self.config.width,
                            self.config.height,
                            FilterType::Triangle,
                        );
                    }
                    let frame = Frame::new(
                        rgb.into_raw(),
                        self.config.width,
                        self.config.height,
                        index,
                    )?;
                    self.frame_count += 1;
                    return Ok(Some(frame));
                }
                Err(err) => {
                    log::warn!("FileSource: skipping {}: {}", path.display(), err);
                    self.skipped += 1;
                }
            }
        }
        Ok(None)
    }

    pub(crate) fn is_healthy(&self) -> bool {
        self.frame_count > 0 || self.skipped == 0
    }

    pub(crate) fn stats(&self) -> FileStats {
        FileStats {
            frames_captured: self.frame_count,
            frames_skipped: self.skipped,
            path: self.config.path.clone(),
        }
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::FileSource;
    use tempfile::TempDir;

    #[test]
    fn reads_images_in_name_order_and_resizes() {
        let dir = TempDir::new().unwrap();
        image::RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30]))
            .save(dir.path().join("b.png"))
            .unwrap();
        image::RgbImage::from_pixel(8, 8, image::Rgb([200, 100, 50]))
            .save(dir.path().join("a.png"))
            .unwrap();
        std::fs::write(dir.path().join("c.png"), b"not an image").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let mut source = FileSource::new(FileConfig {
            path: dir.path().display().to_string(),
            width: 8,
            height: 8,
        })
        .unwrap();
        source.connect().unwrap();

        let a = source.next_frame().unwrap().unwrap();
        assert_eq!(a.index, 0);
        assert_eq!(&a.pixels()[..3], &[200, 100, 50]);
        let b = source.next_frame().unwrap().unwrap();
        assert_eq!((b.index, b.width, b.height), (1, 8, 8));
        assert_eq!(&b.pixels()[..3], &[10, 20, 30]);
        assert!(source.next_frame().unwrap().is_none());

        let stats = source.stats();
        assert_eq!(stats.frames_captured, 2);
        assert_eq!(stats.frames_skipped, 1);
    }

    #[test]
    fn undecodable_file_keeps_its_index() {
        let dir = TempDir::new().unwrap();
        for (name, value) in [("a.png", 1u8), ("c.png", 3u8)] {
            image::RgbImage::from_pixel(4, 4, image::Rgb([value; 3]))
                .save(dir.path().join(name))
                .unwrap();
        }
        std::fs::write(dir.path().join("b.png"), b"truncated").unwrap();

        let mut source = FileSource::new(FileConfig {
            path: dir.path().display().to_string(),
            width: 4,
            height: 4,
        })
        .unwrap();
        source.connect().unwrap();

        let a = source.next_frame().unwrap().unwrap();
        assert_eq!(a.index, 0);
        let c = source.next_frame().unwrap().unwrap();
        assert_eq!(c.index, 2);
        assert_eq!(&c.pixels()[..3], &[3, 3, 3]);
        assert!(source.next_frame().unwrap().is_none());

        let stats = source.stats();
        assert_eq!(stats.frames_captured, 2);
        assert_eq!(stats.frames_skipped, 1);
        assert!(source.is_healthy());
    }

    #[test]
    fn empty_directory_fails_to_connect() {
        let dir = TempDir::new().unwrap();
        let mut source = FileSource::new(FileConfig {
            path: dir.path().display().to_string(),
            width: 8,
            height: 8,
        })
        .unwrap();
        assert!(source.connect().is_err());
    }
}
