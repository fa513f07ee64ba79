use image::DynamicImage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    Camera,
    PhotoLibrary,
}

/// The eight EXIF orientations. Discriminants are the raw tag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    #[default]
    Up = 1,
    UpMirrored = 2,
    Down = 3,
    DownMirrored = 4,
    LeftMirrored = 5,
    Right = 6,
    RightMirrored = 7,
    Left = 8,
}

impl Orientation {
    /// Values outside 1..=8 are treated as unrotated.
    pub fn from_exif(value: u32) -> Self {
        match value {
            2 => Orientation::UpMirrored,
            3 => Orientation::Down,
            4 => Orientation::DownMirrored,
            5 => Orientation::LeftMirrored,
            6 => Orientation::Right,
            7 => Orientation::RightMirrored,
            8 => Orientation::Left,
            _ => Orientation::Up,
        }
    }

    pub fn exif_value(self) -> u32 {
        self as u32
    }

    /// True when displaying the image swaps its width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::LeftMirrored
                | Orientation::Right
                | Orientation::RightMirrored
                | Orientation::Left
        )
    }
}

#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub source: SourceKind,
    pub image: DynamicImage,
    pub orientation: Orientation,
}

impl CapturedImage {
    /// Dimensions after the orientation is applied.
    pub fn display_size(&self) -> (u32, u32) {
        let (w, h) = (self.image.width(), self.image.height());
        if self.orientation.swaps_dimensions() {
            (h, w)
        } else {
            (w, h)
        }
    }
}

#[derive(Debug)]
pub enum Acquisition {
    Captured(CapturedImage),
    Cancelled,
}
