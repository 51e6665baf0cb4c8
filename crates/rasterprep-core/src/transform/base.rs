//! Negotiation bookkeeping and sample wrapping shared by all transforms.

use std::sync::Arc;

use crate::error::{Result, TransformError};
use crate::sample::Sample;
use crate::stream::{ElementType, Layout, StorageKind, StreamDescriptor};

use super::RasterOp;

/// Negotiated stream state of one transform.
#[derive(Debug, Clone)]
pub struct TransformBase {
    name: &'static str,
    input: Option<StreamDescriptor>,
    output: Option<StreamDescriptor>,
}

impl TransformBase {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            input: None,
            output: None,
        }
    }

    /// Validate the input stream and record it.
    ///
    /// The returned descriptor equals the input; callers that change the
    /// shape or layout store their version with [`TransformBase::set_output`].
    ///
    /// # Errors
    ///
    /// - `UnsupportedStorage` if the stream is not dense
    /// - `UnsupportedElementType` if the elements are not 32/64-bit floats
    pub fn negotiate(&mut self, input: &StreamDescriptor) -> Result<StreamDescriptor> {
        if input.storage != StorageKind::Dense {
            return Err(TransformError::UnsupportedStorage(format!(
                "{} transform",
                self.name
            )));
        }
        if !input.element_type.is_supported() {
            return Err(TransformError::UnsupportedElementType(input.element_type));
        }

        tracing::debug!(
            transform = self.name,
            stream = %input.name,
            element_type = ?input.element_type,
            "negotiated input stream"
        );

        self.input = Some(input.clone());
        self.output = Some(input.clone());
        Ok(input.clone())
    }

    pub fn set_output(&mut self, output: StreamDescriptor) {
        self.output = Some(output);
    }

    pub fn input(&self) -> Option<&StreamDescriptor> {
        self.input.as_ref()
    }

    pub fn output(&self) -> Option<&StreamDescriptor> {
        self.output.as_ref()
    }

    /// Negotiated element type.
    ///
    /// # Errors
    ///
    /// Returns `NotNegotiated` before [`TransformBase::negotiate`] succeeded.
    pub fn element_type(&self) -> Result<ElementType> {
        self.input
            .as_ref()
            .map(|s| s.element_type)
            .ok_or(TransformError::NotNegotiated(self.name))
    }

    /// Run `op` on the sample's raster and wrap the result into a new sample.
    ///
    /// - Non-contiguous results are copied into a new contiguous buffer.
    /// - Contiguous results that still point into the input buffer keep the
    ///   input sample alive as `original`.
    /// - Contiguous results in new memory are handed forward as is.
    pub fn apply_sample<O: RasterOp + ?Sized>(
        &self,
        op: &O,
        sample: Arc<Sample>,
    ) -> Result<Arc<Sample>> {
        self.element_type()?;
        if sample.layout() != Layout::Hwc {
            return Err(TransformError::sample(format!(
                "{} transform expects HWC samples, got {:?}",
                self.name,
                sample.layout()
            )));
        }

        let raster = sample.raster()?;
        let result = op.apply_raster(sample.id(), raster)?;

        let original = if result.is_contiguous() && sample.shares_buffer_with(&result) {
            Some(Arc::clone(&sample))
        } else {
            None
        };

        Ok(Arc::new(Sample::with_buffer(
            sample.id(),
            result,
            Layout::Hwc,
            sample.num_samples(),
            original,
        )))
    }
}
