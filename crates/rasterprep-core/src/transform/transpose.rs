//! Channel-interleaved (HWC) to planar (CHW) relayout.

use std::sync::Arc;

use crate::config::TransposeConfig;
use crate::error::{Result, TransformError};
use crate::raster::Element;
use crate::sample::{Sample, SampleBuffer, SharedBuffer};
use crate::stream::{ElementType, ImageDimensions, Layout, StreamDescriptor};

use super::{Transform, TransformBase};

/// Relayout an HWC buffer as CHW: `dst[c * (w * h) + p] = src[p * C + c]`.
pub fn transpose_hwc_to_chw<T: Element>(src: &[T], dims: ImageDimensions) -> Vec<T> {
    let plane = dims.pixel_count();
    let channels = dims.channels;
    debug_assert_eq!(src.len(), plane * channels);

    let mut dst = vec![T::default(); src.len()];
    if channels == 0 {
        return dst;
    }
    for (p, pixel) in src.chunks_exact(channels).enumerate() {
        for (c, &value) in pixel.iter().enumerate() {
            dst[c * plane + p] = value;
        }
    }
    dst
}

/// Transpose transform. Output samples always own a new buffer.
#[derive(Debug)]
pub struct TransposeTransform {
    base: TransformBase,
}

impl TransposeTransform {
    pub fn new(_config: &TransposeConfig) -> Self {
        Self {
            base: TransformBase::new("transpose"),
        }
    }
}

impl Default for TransposeTransform {
    fn default() -> Self {
        Self::new(&TransposeConfig::default())
    }
}

impl Transform for TransposeTransform {
    fn name(&self) -> &'static str {
        "transpose"
    }

    fn negotiate(&mut self, input: &StreamDescriptor) -> Result<StreamDescriptor> {
        let mut output = self.base.negotiate(input)?;
        output.layout = Layout::Chw;
        self.base.set_output(output.clone());
        Ok(output)
    }

    fn apply(&self, sample: Arc<Sample>) -> Result<Arc<Sample>> {
        let element_type = self.base.element_type()?;
        if sample.layout() != Layout::Hwc {
            return Err(TransformError::sample(format!(
                "transpose expects HWC samples, sample {} is {:?}",
                sample.id(),
                sample.layout()
            )));
        }

        let dims = sample.dims();
        if sample.buffer().len() != dims.element_count() {
            return Err(TransformError::sample(format!(
                "sample {} holds {} elements, shape needs {}",
                sample.id(),
                sample.buffer().len(),
                dims.element_count()
            )));
        }

        let buffer = match (element_type, sample.buffer()) {
            (ElementType::Float32, SampleBuffer::F32(b)) => {
                SampleBuffer::F32(SharedBuffer::from_vec(transpose_hwc_to_chw(b.as_slice(), dims)))
            }
            (ElementType::Float64, SampleBuffer::F64(b)) => {
                SampleBuffer::F64(SharedBuffer::from_vec(transpose_hwc_to_chw(b.as_slice(), dims)))
            }
            (expected, actual) => {
                return Err(TransformError::sample(format!(
                    "transpose negotiated {:?}, sample {} holds {:?}",
                    expected,
                    sample.id(),
                    actual.element_type()
                )))
            }
        };

        tracing::trace!(id = sample.id(), ?dims, "transpose");
        Ok(Arc::new(Sample::from_buffer(
            sample.id(),
            dims,
            Layout::Chw,
            sample.num_samples(),
            buffer,
        )))
    }
}
