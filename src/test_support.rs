//! Fakes shared by the unit tests.

use crate::error::ClassifierError;
use crate::models::capture_types::{CapturedImage, Orientation, SourceKind};
use crate::models::presentation_types::{PresentationState, Transition};
use crate::services::classifier::backend::InferenceBackend;
use crate::services::image_source::PhotoPicker;
use crate::services::presentation::DisplaySurface;
use futures::future::BoxFuture;
use futures::FutureExt;
use image::{DynamicImage, Rgb, RgbImage};
use ndarray::{Array4, Axis};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

pub fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

pub fn solid_capture(color: Rgb<u8>, orientation: Orientation) -> CapturedImage {
    CapturedImage {
        source: SourceKind::PhotoLibrary,
        image: DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 8, color)),
        orientation,
    }
}

pub fn encoded_png(color: Rgb<u8>, width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, color))
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Pseudo-random pixels; compresses badly, so the encoded file stays large.
pub fn noise_image(width: u32, height: u32) -> DynamicImage {
    let mut state: u32 = 0x2545_f491;
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        };
        Rgb([next(), next(), next()])
    }))
}

/// Little-endian TIFF block with a single Orientation entry in IFD0.
pub fn orientation_exif(value: u16) -> Vec<u8> {
    let mut tiff = b"II*\0".to_vec();
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0112u16.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&value.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_le_bytes());
    tiff
}

/// Encodes `img` as JPEG or WebP carrying an EXIF orientation tag.
pub fn encoded_with_orientation(img: &DynamicImage, format: image::ImageFormat, orientation: u16) -> Vec<u8> {
    use image::ImageEncoder;

    let rgb = img.to_rgb8();
    let mut bytes = Vec::new();
    match format {
        image::ImageFormat::Jpeg => {
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, 100);
            encoder.set_exif_metadata(orientation_exif(orientation)).unwrap();
            encoder
                .write_image(rgb.as_raw(), rgb.width(), rgb.height(), image::ExtendedColorType::Rgb8)
                .unwrap();
        }
        image::ImageFormat::WebP => {
            let mut encoder = image::codecs::webp::WebPEncoder::new_lossless(&mut bytes);
            encoder.set_exif_metadata(orientation_exif(orientation)).unwrap();
            encoder
                .write_image(rgb.as_raw(), rgb.width(), rgb.height(), image::ExtendedColorType::Rgb8)
                .unwrap();
        }
        other => panic!("no EXIF fixture for {:?}", other),
    }
    bytes
}

/// Returns the same scores (or error) for every input.
pub struct ScriptedBackend {
    result: Result<Vec<f32>, ClassifierError>,
}

impl ScriptedBackend {
    pub fn scores(scores: Vec<f32>) -> Self {
        Self { result: Ok(scores) }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(ClassifierError::Underlying(message.to_string())),
        }
    }
}

impl InferenceBackend for ScriptedBackend {
    fn run(&self, _input: Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        self.result.clone()
    }
}

pub struct PanickingBackend;

impl InferenceBackend for PanickingBackend {
    fn run(&self, _input: Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        panic!("model runtime crashed");
    }
}

/// Scores each colour channel by its mean normalised value, so a solid red
/// image classifies as class 0, green as 1, blue as 2. Runs whose winning
/// channel is gated block until the gate is released.
#[derive(Clone, Default)]
pub struct ChannelBackend {
    gate: Option<(usize, Arc<Mutex<mpsc::Receiver<()>>>)>,
}

impl ChannelBackend {
    pub fn gated_on(channel: usize) -> (mpsc::Sender<()>, Self) {
        let (tx, rx) = mpsc::channel();
        (
            tx,
            Self {
                gate: Some((channel, Arc::new(Mutex::new(rx)))),
            },
        )
    }
}

impl InferenceBackend for ChannelBackend {
    fn run(&self, input: Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        let scores: Vec<f32> = input
            .axis_iter(Axis(1))
            .map(|channel| channel.mean().unwrap_or(0.0))
            .collect();

        let winner = scores
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, &s)| if s > best.1 { (i, s) } else { best })
            .0;

        if let Some((gated, rx)) = &self.gate {
            if *gated == winner {
                let _ = rx.lock().unwrap().recv();
            }
        }
        Ok(scores)
    }
}

/// Keeps every transition it is asked to apply.
#[derive(Clone, Default)]
pub struct RecordingSurface {
    applied: Arc<Mutex<Vec<Transition>>>,
}

impl RecordingSurface {
    pub fn transitions(&self) -> Vec<Transition> {
        self.applied.lock().unwrap().clone()
    }
}

impl DisplaySurface for RecordingSurface {
    fn apply(&self, transition: &Transition, _state: &PresentationState) {
        self.applied.lock().unwrap().push(transition.clone());
    }
}

pub struct FixedPicker {
    path: Option<PathBuf>,
}

impl FixedPicker {
    pub fn cancelled() -> Self {
        Self { path: None }
    }

    pub fn returning(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }
}

impl PhotoPicker for FixedPicker {
    fn pick_photo(&self) -> BoxFuture<'_, Option<PathBuf>> {
        let path = self.path.clone();
        async move { path }.boxed()
    }
}
