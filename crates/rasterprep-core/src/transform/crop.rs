//! Square crops with optional ratio jitter and horizontal flip.
//!
//! The crop window is a view into the input raster, so a crop that spans
//! full rows is passed on without copying. A flip always writes a new
//! buffer.
//!
//! # Example
//!
//! ```ignore
//! let mut crop = CropTransform::new(&CropConfig {
//!     crop_type: "random".into(),
//!     crop_ratio: "0.8:1.0".into(),
//!     jitter_type: "uniRatio".into(),
//!     ..Default::default()
//! })?;
//! crop.negotiate(&stream)?;
//! let out = crop.apply(sample)?;
//! ```

use std::str::FromStr;
use std::sync::Arc;

use rand::Rng;

use crate::config::CropConfig;
use crate::error::{Result, TransformError};
use crate::raster::{AnyRaster, Element, Raster};
use crate::rng::RngPool;
use crate::sample::Sample;
use crate::stream::StreamDescriptor;

use super::region::{crop_rect, view_index, CropType};
use super::{RasterOp, Transform, TransformBase};

/// How the crop ratio varies between samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JitterType {
    #[default]
    None,
    UniformRatio,
    /// Parsed but not implemented.
    UniformLength,
    /// Parsed but not implemented.
    UniformArea,
}

impl FromStr for JitterType {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(JitterType::None),
            "uniratio" => Ok(JitterType::UniformRatio),
            "unilength" => Ok(JitterType::UniformLength),
            "uniarea" => Ok(JitterType::UniformArea),
            _ => Err(TransformError::config(format!("Invalid jitter type: {}", s))),
        }
    }
}

/// Crop transform.
#[derive(Debug)]
pub struct CropTransform {
    base: TransformBase,
    crop_type: CropType,
    ratio_min: f64,
    ratio_max: f64,
    jitter: JitterType,
    hflip: bool,
    rngs: RngPool,
}

impl CropTransform {
    /// Build a crop transform from its configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an unknown crop or jitter type, or a bad
    /// crop ratio.
    pub fn new(config: &CropConfig) -> Result<Self> {
        let crop_type: CropType = config.crop_type.parse()?;
        let (ratio_min, ratio_max) = config.crop_ratio.bounds()?;
        let jitter: JitterType = config.jitter_type.parse()?;
        let hflip = config.hflip.unwrap_or(crop_type == CropType::Random);

        tracing::debug!(
            ?crop_type,
            ratio_min,
            ratio_max,
            ?jitter,
            hflip,
            seed = config.seed,
            "crop transform configured"
        );

        Ok(Self {
            base: TransformBase::new("crop"),
            crop_type,
            ratio_min,
            ratio_max,
            jitter,
            hflip,
            rngs: RngPool::new(config.seed),
        })
    }

    pub fn crop_type(&self) -> CropType {
        self.crop_type
    }

    pub fn ratio_bounds(&self) -> (f64, f64) {
        (self.ratio_min, self.ratio_max)
    }

    pub fn jitter(&self) -> JitterType {
        self.jitter
    }

    pub fn hflip(&self) -> bool {
        self.hflip
    }

    fn ratio<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        match self.jitter {
            JitterType::None => Ok(self.ratio_min),
            JitterType::UniformRatio if self.ratio_min == self.ratio_max => Ok(self.ratio_min),
            JitterType::UniformRatio => Ok(rng.random_range(self.ratio_min..self.ratio_max)),
            JitterType::UniformLength | JitterType::UniformArea => Err(
                TransformError::unimplemented(format!("{:?} crop jitter", self.jitter)),
            ),
        }
    }

    fn crop<T: Element>(&self, id: u64, raster: Raster<T>) -> Result<Raster<T>> {
        if raster.width() == 0 || raster.height() == 0 {
            return Err(TransformError::sample(format!(
                "cannot crop an empty {}x{} raster",
                raster.width(),
                raster.height()
            )));
        }

        let mut rng = self.rngs.acquire();
        let ratio = self.ratio(&mut *rng)?;
        let view = view_index(self.crop_type, id);
        let rect = crop_rect(
            self.crop_type,
            view,
            raster.height(),
            raster.width(),
            ratio,
            &mut *rng,
        );
        if rect.width == 0 {
            return Err(TransformError::sample(format!(
                "crop of {}x{} at ratio {} is empty",
                raster.width(),
                raster.height(),
                ratio
            )));
        }

        let cropped = raster.crop(rect)?;
        let flip = (self.hflip && rng.random_bool(0.5)) || view >= 5;
        tracing::trace!(id, view, ratio, ?rect, flip, "crop");

        Ok(if flip {
            cropped.flip_horizontal()
        } else {
            cropped
        })
    }
}

impl RasterOp for CropTransform {
    fn apply_raster(&self, id: u64, raster: AnyRaster) -> Result<AnyRaster> {
        match raster {
            AnyRaster::F32(r) => self.crop(id, r).map(AnyRaster::F32),
            AnyRaster::F64(r) => self.crop(id, r).map(AnyRaster::F64),
        }
    }
}

impl Transform for CropTransform {
    fn name(&self) -> &'static str {
        "crop"
    }

    fn negotiate(&mut self, input: &StreamDescriptor) -> Result<StreamDescriptor> {
        self.base.negotiate(input)
    }

    fn apply(&self, sample: Arc<Sample>) -> Result<Arc<Sample>> {
        self.base.apply_sample(self, sample)
    }
}
