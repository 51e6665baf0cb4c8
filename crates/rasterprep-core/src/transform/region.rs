//! Crop window selection.

use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TransformError;
use crate::raster::Rect;

/// Number of views produced per image in multi-view mode.
pub const MULTIVIEW_COUNT: u64 = 10;

/// Crop window placement policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CropType {
    #[default]
    Center,
    Random,
    /// Four corners plus center, each with and without a horizontal flip.
    MultiView10,
}

impl FromStr for CropType {
    type Err = TransformError;

    /// Case-insensitive. An empty string selects [`CropType::Center`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "center" => Ok(CropType::Center),
            "random" => Ok(CropType::Random),
            "multiview10" => Ok(CropType::MultiView10),
            _ => Err(TransformError::config(format!("Invalid crop type: {}", s))),
        }
    }
}

/// View index of a sample: `id mod 10` in multi-view mode, 0 otherwise.
pub fn view_index(crop_type: CropType, id: u64) -> usize {
    match crop_type {
        CropType::MultiView10 => (id % MULTIVIEW_COUNT) as usize,
        CropType::Center | CropType::Random => 0,
    }
}

/// Square crop window of side `floor(min(rows, cols) * ratio)`.
///
/// - `Center`: centered, integer division rounding toward the top-left.
/// - `Random`: x then y drawn uniformly from the valid offsets.
/// - `MultiView10`: `view_index % 5` picks top-left, top-right,
///   bottom-left, bottom-right or center.
///
/// Callers guarantee `rows > 0`, `cols > 0` and `0 < ratio <= 1`.
pub fn crop_rect<R: Rng + ?Sized>(
    crop_type: CropType,
    view_index: usize,
    rows: usize,
    cols: usize,
    ratio: f64,
    rng: &mut R,
) -> Rect {
    debug_assert!(rows > 0 && cols > 0);
    debug_assert!(ratio > 0.0 && ratio <= 1.0);

    let side = (rows.min(cols) as f64 * ratio) as usize;
    let max_x = cols - side;
    let max_y = rows - side;

    let (x, y) = match crop_type {
        CropType::Center => {
            debug_assert_eq!(view_index, 0, "center crop takes no view index");
            (max_x / 2, max_y / 2)
        }
        CropType::Random => {
            debug_assert_eq!(view_index, 0, "random crop takes no view index");
            let x = rng.random_range(0..=max_x);
            let y = rng.random_range(0..=max_y);
            (x, y)
        }
        CropType::MultiView10 => match view_index % 5 {
            0 => (0, 0),
            1 => (max_x, 0),
            2 => (0, max_y),
            3 => (max_x, max_y),
            _ => (max_x / 2, max_y / 2),
        },
    };

    Rect::new(x, y, side, side)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0)
    }

    #[test]
    fn test_crop_type_parse() {
        assert_eq!("".parse::<CropType>().unwrap(), CropType::Center);
        assert_eq!("Center".parse::<CropType>().unwrap(), CropType::Center);
        assert_eq!("RANDOM".parse::<CropType>().unwrap(), CropType::Random);
        assert_eq!("MultiView10".parse::<CropType>().unwrap(), CropType::MultiView10);
        assert!(matches!(
            "corner".parse::<CropType>(),
            Err(TransformError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_crop_type_error_shows_configured_value() {
        let err = " Corner ".parse::<CropType>().unwrap_err();
        assert!(err.to_string().contains("Invalid crop type:  Corner "));
    }

    #[test]
    fn test_center_crop_32() {
        let rect = crop_rect(CropType::Center, 0, 32, 32, 0.875, &mut rng());
        assert_eq!(rect, Rect::new(2, 2, 28, 28));
    }

    #[test]
    fn test_center_crop_rounds_toward_origin() {
        // 5 spare columns split as 2 left, 3 right
        let rect = crop_rect(CropType::Center, 0, 10, 15, 1.0, &mut rng());
        assert_eq!(rect, Rect::new(2, 0, 10, 10));
    }

    #[test]
    fn test_multiview_positions() {
        let mut r = rng();
        let rects: Vec<Rect> = (0..5)
            .map(|v| crop_rect(CropType::MultiView10, v, 30, 40, 0.5, &mut r))
            .collect();
        assert_eq!(
            rects,
            vec![
                Rect::new(0, 0, 15, 15),
                Rect::new(25, 0, 15, 15),
                Rect::new(0, 15, 15, 15),
                Rect::new(25, 15, 15, 15),
                Rect::new(12, 7, 15, 15),
            ]
        );
    }

    #[test]
    fn test_side_truncates() {
        let rect = crop_rect(CropType::Center, 0, 7, 7, 0.5, &mut rng());
        assert_eq!(rect.width, 3);
        assert_eq!(rect.height, 3);
    }

    #[test]
    fn test_view_index() {
        assert_eq!(view_index(CropType::MultiView10, 23), 3);
        assert_eq!(view_index(CropType::Random, 23), 0);
        assert_eq!(view_index(CropType::Center, 9), 0);
    }
}
