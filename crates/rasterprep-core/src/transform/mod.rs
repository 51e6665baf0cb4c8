//! Per-sample image transforms and their chaining protocol.
//!
//! Every transform takes part in two phases:
//!
//! 1. **Negotiation** (once per stream): the transform receives the upstream
//!    [`StreamDescriptor`] and returns its own output descriptor. No data
//!    flows in this phase.
//! 2. **Application** (once per sample, from any number of worker threads):
//!    the transform receives a [`Sample`] and returns a new one.
//!
//! # Transform Order
//!
//! A typical training chain is:
//! 1. Crop (random or multi-view)
//! 2. Scale to the network input size
//! 3. Mean subtraction
//! 4. Transpose HWC -> CHW
//!
//! # Memory
//!
//! Transforms that only narrow the raster (a full-width crop, a skipped
//! mean) hand the input memory forward and keep the input sample alive
//! through [`Sample::original`]. Non-contiguous views are compacted.
//! Transpose always writes a new buffer.

mod base;
mod chain;
mod crop;
mod mean;
mod region;
mod scale;
mod transpose;

use std::sync::Arc;

use crate::error::Result;
use crate::raster::AnyRaster;
use crate::sample::Sample;
use crate::stream::StreamDescriptor;

pub use base::TransformBase;
pub use chain::{ImageTransform, TransformChain};
pub use crop::{CropTransform, JitterType};
pub use mean::{MatrixData, MeanImage, MeanImageFile, MeanTransform};
pub use region::{crop_rect, view_index, CropType, MULTIVIEW_COUNT};
pub use scale::ScaleTransform;
pub use transpose::{transpose_hwc_to_chw, TransposeTransform};

/// The two-phase protocol shared by all transforms.
pub trait Transform: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Negotiate stream metadata and return the output descriptor.
    fn negotiate(&mut self, input: &StreamDescriptor) -> Result<StreamDescriptor>;

    /// Transform one sample.
    fn apply(&self, sample: Arc<Sample>) -> Result<Arc<Sample>>;
}

/// The raster-level operation of a transform.
///
/// [`TransformBase::apply_sample`] wraps it into the sample-level protocol.
pub trait RasterOp {
    fn apply_raster(&self, id: u64, raster: AnyRaster) -> Result<AnyRaster>;
}
