//! Resize samples to the fixed network input size.

use std::sync::Arc;

use rand::Rng;

use crate::config::ScaleConfig;
use crate::error::{Result, TransformError};
use crate::raster::{resize, AnyRaster, Interpolation};
use crate::rng::RngPool;
use crate::sample::Sample;
use crate::stream::{ImageDimensions, Layout, StreamDescriptor};

use super::{RasterOp, Transform, TransformBase};

/// Scale transform.
///
/// When several interpolation kernels are configured, each sample uses one
/// picked uniformly at random.
#[derive(Debug)]
pub struct ScaleTransform {
    base: TransformBase,
    dims: ImageDimensions,
    interpolations: Vec<Interpolation>,
    rngs: RngPool,
}

impl ScaleTransform {
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `width * height * channels` is zero or
    /// larger than `usize::MAX / 2`.
    pub fn new(config: &ScaleConfig) -> Result<Self> {
        let count = config
            .width
            .checked_mul(config.height)
            .and_then(|n| n.checked_mul(config.channels));
        match count {
            Some(n) if n > 0 && n <= usize::MAX / 2 => {}
            _ => {
                return Err(TransformError::config(format!(
                    "Invalid image dimensions {}x{}x{}",
                    config.width, config.height, config.channels
                )))
            }
        }

        let dims = ImageDimensions::new(config.width, config.height, config.channels);
        let interpolations = Interpolation::parse_list(&config.interpolations);

        tracing::debug!(
            width = dims.width,
            height = dims.height,
            channels = dims.channels,
            ?interpolations,
            "scale transform configured"
        );

        Ok(Self {
            base: TransformBase::new("scale"),
            dims,
            interpolations,
            rngs: RngPool::new(config.seed),
        })
    }

    pub fn dims(&self) -> ImageDimensions {
        self.dims
    }

    pub fn interpolations(&self) -> &[Interpolation] {
        &self.interpolations
    }

    fn pick_kernel(&self) -> Interpolation {
        match self.interpolations.as_slice() {
            [only] => *only,
            kernels => {
                let index = self.rngs.acquire().random_range(0..kernels.len());
                kernels[index]
            }
        }
    }
}

impl RasterOp for ScaleTransform {
    fn apply_raster(&self, id: u64, raster: AnyRaster) -> Result<AnyRaster> {
        let raster = raster.convert_to(self.base.element_type()?)?;

        let channels = raster.dims().channels;
        if channels != self.dims.channels {
            return Err(TransformError::sample(format!(
                "scale expects {} channels, sample {} has {}",
                self.dims.channels, id, channels
            )));
        }

        let kernel = self.pick_kernel();
        tracing::trace!(id, ?kernel, from = ?raster.dims(), "scale");

        let (width, height) = (self.dims.width, self.dims.height);
        Ok(match raster {
            AnyRaster::F32(r) => AnyRaster::F32(resize(&r, width, height, kernel)),
            AnyRaster::F64(r) => AnyRaster::F64(resize(&r, width, height, kernel)),
        })
    }
}

impl Transform for ScaleTransform {
    fn name(&self) -> &'static str {
        "scale"
    }

    fn negotiate(&mut self, input: &StreamDescriptor) -> Result<StreamDescriptor> {
        let mut output = self.base.negotiate(input)?;
        output.dims = self.dims;
        output.layout = Layout::Hwc;
        self.base.set_output(output.clone());
        Ok(output)
    }

    fn apply(&self, sample: Arc<Sample>) -> Result<Arc<Sample>> {
        self.base.apply_sample(self, sample)
    }
}
