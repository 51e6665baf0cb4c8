//! Sample records flowing through a transform chain.
//!
//! A [`Sample`] carries one raster's worth of flat, contiguous data plus
//! its id and dimensions. When a transform's output is a view into the
//! memory of its input, the output keeps an `original` back-reference to
//! the input sample. That reference only extends the input's lifetime and
//! is never read for data.

use std::sync::Arc;

use image::DynamicImage;

use crate::error::{Result, TransformError};
use crate::raster::{AnyRaster, Element, Raster};
use crate::stream::{ElementType, ImageDimensions, Layout};

/// A contiguous element range inside a shared buffer.
#[derive(Debug, Clone)]
pub struct SharedBuffer<T> {
    data: Arc<Vec<T>>,
    offset: usize,
    len: usize,
}

impl<T: Element> SharedBuffer<T> {
    fn from_raster(raster: Raster<T>) -> Self {
        let raster = if raster.is_contiguous() {
            raster
        } else {
            raster.to_contiguous()
        };
        let len = raster.element_count();
        let (data, offset) = raster.into_contiguous_parts();
        Self { data, offset, len }
    }

    pub(crate) fn from_vec(data: Vec<T>) -> Self {
        let len = data.len();
        Self {
            data: Arc::new(data),
            offset: 0,
            len,
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data[self.offset..self.offset + self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn view(&self, dims: ImageDimensions) -> Result<Raster<T>> {
        if self.len != dims.element_count() {
            return Err(TransformError::sample(format!(
                "buffer holds {} elements but shape {}x{}x{} needs {}",
                self.len,
                dims.width,
                dims.height,
                dims.channels,
                dims.element_count()
            )));
        }
        Raster::from_shared(Arc::clone(&self.data), self.offset, dims)
    }
}

/// Element-type-tagged flat sample buffer.
#[derive(Debug, Clone)]
pub enum SampleBuffer {
    F32(SharedBuffer<f32>),
    F64(SharedBuffer<f64>),
}

impl SampleBuffer {
    pub fn element_type(&self) -> ElementType {
        match self {
            SampleBuffer::F32(_) => ElementType::Float32,
            SampleBuffer::F64(_) => ElementType::Float64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SampleBuffer::F32(b) => b.len(),
            SampleBuffer::F64(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One image sample.
#[derive(Debug)]
pub struct Sample {
    id: u64,
    dims: ImageDimensions,
    layout: Layout,
    num_samples: usize,
    buffer: SampleBuffer,
    original: Option<Arc<Sample>>,
}

impl Sample {
    /// Create an HWC sample that owns `data`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSample` if `data.len()` doesn't match `dims`.
    pub fn new<T: Element>(id: u64, dims: ImageDimensions, data: Vec<T>) -> Result<Self> {
        let raster = Raster::new(dims.width, dims.height, dims.channels, data)?;
        Ok(Self::from_raster(id, T::into_any(raster)))
    }

    /// Create an HWC sample from a raster, compacting it if needed.
    pub fn from_raster(id: u64, raster: AnyRaster) -> Self {
        Self::with_buffer(id, raster, Layout::Hwc, 1, None)
    }

    /// Create an `f32` HWC sample from a decoded image.
    pub fn from_dynamic_image(id: u64, image: &DynamicImage) -> Self {
        Self::from_raster(id, Raster::from_dynamic_image(image).into())
    }

    pub(crate) fn with_buffer(
        id: u64,
        raster: AnyRaster,
        layout: Layout,
        num_samples: usize,
        original: Option<Arc<Sample>>,
    ) -> Self {
        let dims = raster.dims();
        let buffer = match raster {
            AnyRaster::F32(r) => SampleBuffer::F32(SharedBuffer::from_raster(r)),
            AnyRaster::F64(r) => SampleBuffer::F64(SharedBuffer::from_raster(r)),
        };
        Self {
            id,
            dims,
            layout,
            num_samples,
            buffer,
            original,
        }
    }

    pub(crate) fn from_buffer(
        id: u64,
        dims: ImageDimensions,
        layout: Layout,
        num_samples: usize,
        buffer: SampleBuffer,
    ) -> Self {
        debug_assert_eq!(buffer.len(), dims.element_count());
        Self {
            id,
            dims,
            layout,
            num_samples,
            buffer,
            original: None,
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn dims(&self) -> ImageDimensions {
        self.dims
    }

    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Number of samples in the record (always 1 for image samples).
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn element_type(&self) -> ElementType {
        self.buffer.element_type()
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// Upstream sample whose memory this sample shares, if any.
    pub fn original(&self) -> Option<&Arc<Sample>> {
        self.original.as_ref()
    }

    pub fn as_f32(&self) -> Option<&[f32]> {
        match &self.buffer {
            SampleBuffer::F32(b) => Some(b.as_slice()),
            SampleBuffer::F64(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<&[f64]> {
        match &self.buffer {
            SampleBuffer::F64(b) => Some(b.as_slice()),
            SampleBuffer::F32(_) => None,
        }
    }

    /// Raster view over this sample's buffer. No pixels are copied.
    pub fn raster(&self) -> Result<AnyRaster> {
        Ok(match &self.buffer {
            SampleBuffer::F32(b) => AnyRaster::F32(b.view(self.dims)?),
            SampleBuffer::F64(b) => AnyRaster::F64(b.view(self.dims)?),
        })
    }

    /// Returns true when `raster` is a view into this sample's buffer.
    pub fn shares_buffer_with(&self, raster: &AnyRaster) -> bool {
        match (&self.buffer, raster) {
            (SampleBuffer::F32(b), AnyRaster::F32(r)) => r.shares_buffer(&b.data),
            (SampleBuffer::F64(b), AnyRaster::F64(r)) => r.shares_buffer(&b.data),
            _ => false,
        }
    }
}
