use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use anyhow::{Context, Result};
use image::DynamicImage;

pub enum LoadEvent {
    Decoded {
        generation: u64,
        image: DynamicImage,
    },
    Failed {
        generation: u64,
        message: String,
    },
}

/// Decodes images off the UI thread. Each request gets a generation number;
/// results from outdated requests are dropped, so the last request wins no
/// matter how decode times interleave.
pub struct ImageLoader {
    tx: Sender<LoadEvent>,
    rx: Receiver<LoadEvent>,
    generation: u64,
}

impl ImageLoader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            generation: 0,
        }
    }

    pub fn load_path(&mut self, path: PathBuf) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        let tx = self.tx.clone();
        thread::spawn(move || {
            let event = match decode_file(&path) {
                Ok(image) => LoadEvent::Decoded { generation, image },
                Err(err) => LoadEvent::Failed {
                    generation,
                    message: format!("{err:#}"),
                },
            };
            let _ = tx.send(event);
        });
        generation
    }

    pub fn load_bytes(&mut self, bytes: Vec<u8>) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        let tx = self.tx.clone();
        thread::spawn(move || {
            let event = match decode_bytes(&bytes) {
                Ok(image) => LoadEvent::Decoded { generation, image },
                Err(err) => LoadEvent::Failed {
                    generation,
                    message: format!("{err:#}"),
                },
            };
            let _ = tx.send(event);
        });
        generation
    }

    /// Non-blocking poll for the newest current result.
    pub fn try_recv(&mut self) -> Option<LoadEvent> {
        while let Ok(event) = self.rx.try_recv() {
            let generation = match &event {
                LoadEvent::Decoded { generation, .. } => *generation,
                LoadEvent::Failed { generation, .. } => *generation,
            };
            if generation == self.generation {
                return Some(event);
            }
            // A newer request superseded this one.
        }
        None
    }
}

fn decode_file(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("cannot decode image {}", path.display()))
}

fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).context("cannot decode image data")
}

#[cfg(test)]
mod tests {
    use super::{ImageLoader, LoadEvent};
    use image::{DynamicImage, RgbaImage};
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image =
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, image::Rgba([1, 2, 3, 255])));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn wait_for_event(loader: &mut ImageLoader) -> LoadEvent {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(event) = loader.try_recv() {
                return event;
            }
            assert!(Instant::now() < deadline, "decode worker never answered");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn decodes_bytes_in_background() {
        let mut loader = ImageLoader::new();
        loader.load_bytes(png_bytes(12, 7));
        match wait_for_event(&mut loader) {
            LoadEvent::Decoded { image, .. } => {
                assert_eq!((image.width(), image.height()), (12, 7));
            }
            LoadEvent::Failed { message, .. } => panic!("decode failed: {message}"),
        }
    }

    #[test]
    fn invalid_data_reports_failure() {
        let mut loader = ImageLoader::new();
        let generation = loader.load_bytes(vec![0, 1, 2, 3]);
        match wait_for_event(&mut loader) {
            LoadEvent::Failed { generation: seen, .. } => assert_eq!(seen, generation),
            LoadEvent::Decoded { .. } => panic!("garbage must not decode"),
        }
    }

    #[test]
    fn newer_request_supersedes_older() {
        let mut loader = ImageLoader::new();
        loader.load_bytes(png_bytes(3, 3));
        let latest = loader.load_bytes(png_bytes(20, 10));

        // Whichever finishes first, only the latest generation may surface.
        let event = wait_for_event(&mut loader);
        match event {
            LoadEvent::Decoded { generation, image } => {
                assert_eq!(generation, latest);
                assert_eq!((image.width(), image.height()), (20, 10));
            }
            LoadEvent::Failed { message, .. } => panic!("decode failed: {message}"),
        }
    }
}
