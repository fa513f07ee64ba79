use crate::config::CropScale;
use crate::error::ClassifierError;
use crate::models::classify_types::Prediction;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use ndarray::Array4;

// ImageNet normalization constants
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Scales an upright image to `size`x`size` according to the crop policy.
pub fn crop_and_scale(img: &DynamicImage, policy: CropScale, size: u32) -> RgbImage {
    match policy {
        CropScale::CenterCrop => {
            let (w, h) = (img.width(), img.height());
            let side = w.min(h);
            let x = (w - side) / 2;
            let y = (h - side) / 2;
            img.crop_imm(x, y, side, side)
                .resize_exact(size, size, FilterType::Triangle)
                .to_rgb8()
        }
        CropScale::ScaleFill => img.resize_exact(size, size, FilterType::Triangle).to_rgb8(),
        CropScale::ScaleFit => {
            let fitted = img.resize(size, size, FilterType::Triangle).to_rgb8();
            let mut canvas = RgbImage::new(size, size);
            let x = (size - fitted.width()) / 2;
            let y = (size - fitted.height()) / 2;
            image::imageops::replace(&mut canvas, &fitted, x as i64, y as i64);
            canvas
        }
    }
}

/// Normalises an RGB square into a (1, 3, H, W) tensor.
pub fn to_tensor(rgb: RgbImage) -> Result<Array4<f32>, ClassifierError> {
    let (width, height) = rgb.dimensions();
    let hw = (width * height) as usize;

    // Pass 1: normalise in pixel order so reads and writes stay contiguous.
    let raw = rgb.into_raw();
    let mut interleaved = vec![0f32; 3 * hw];
    for (i, pixel) in raw.chunks_exact(3).enumerate() {
        let off = i * 3;
        interleaved[off] = (pixel[0] as f32 / 255.0 - MEAN[0]) / STD[0];
        interleaved[off + 1] = (pixel[1] as f32 / 255.0 - MEAN[1]) / STD[1];
        interleaved[off + 2] = (pixel[2] as f32 / 255.0 - MEAN[2]) / STD[2];
    }

    // Pass 2: HWC -> CHW in tiles that fit in L1.
    let mut data = vec![0f32; 3 * hw];
    const TILE: usize = 1024;
    for base in (0..hw).step_by(TILE) {
        let end = (base + TILE).min(hw);
        for i in base..end {
            let src = i * 3;
            data[i] = interleaved[src];
            data[hw + i] = interleaved[src + 1];
            data[2 * hw + i] = interleaved[src + 2];
        }
    }

    Array4::from_shape_vec((1, 3, height as usize, width as usize), data)
        .map_err(|e| ClassifierError::Preprocess(format!("Failed to create tensor: {}", e)))
}

pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exp_sum: f32 = scores.iter().map(|&x| (x - max).exp()).sum();
    scores.iter().map(|&x| (x - max).exp() / exp_sum).collect()
}

/// Ranks class scores by descending confidence. The sort is stable, so equal
/// scores keep the model's class order and the earlier class wins.
pub fn rank(
    scores: &[f32],
    labels: &[String],
    apply_softmax: bool,
    top_k: usize,
    min_confidence: f32,
) -> Vec<Prediction> {
    if scores.is_empty() {
        return Vec::new();
    }

    let probabilities = if apply_softmax {
        softmax(scores)
    } else {
        scores.to_vec()
    };

    let mut indexed: Vec<(usize, f32)> = probabilities.into_iter().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    indexed
        .into_iter()
        .take(top_k)
        .filter(|&(_, conf)| conf >= min_confidence)
        .map(|(idx, conf)| {
            let class_name = labels
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("class_{}", idx));
            Prediction::new(class_name, conf.clamp(0.0, 1.0))
        })
        .collect()
}
