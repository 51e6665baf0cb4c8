//! Raster views over shared multi-channel pixel buffers.
//!
//! A [`Raster`] describes a 2-D, channel-interleaved grid of float elements
//! inside a reference-counted buffer. Several rasters can view the same
//! buffer: cropping produces a sub-view with an offset and the parent's row
//! stride, without copying any pixels.
//!
//! # Memory Layout
//!
//! ```text
//! buffer:  [ .. offset | row 0 (width*channels) | pad | row 1 | pad | .. ]
//!                        <------------- row_stride ------------>
//! ```
//!
//! A view is contiguous when its rows are adjacent in memory, which is
//! what downstream consumers need.

mod image_io;
pub mod resample;

use std::fmt::Debug;
use std::ops::Sub;
use std::sync::Arc;

use crate::error::{Result, TransformError};
use crate::stream::{ElementType, ImageDimensions};

pub use resample::{resize, Interpolation};

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Float element types a raster can hold.
pub trait Element:
    sealed::Sealed + Copy + Default + PartialEq + Debug + Send + Sync + Sub<Output = Self> + 'static
{
    /// Stream element type tag for this width.
    const ELEMENT_TYPE: ElementType;

    /// Lossy numeric cast from `f64`.
    fn from_f64(value: f64) -> Self;

    fn to_f64(self) -> f64;

    /// Tag a typed raster.
    fn into_any(raster: Raster<Self>) -> AnyRaster;
}

impl Element for f32 {
    const ELEMENT_TYPE: ElementType = ElementType::Float32;

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    fn into_any(raster: Raster<Self>) -> AnyRaster {
        AnyRaster::F32(raster)
    }
}

impl Element for f64 {
    const ELEMENT_TYPE: ElementType = ElementType::Float64;

    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    fn into_any(raster: Raster<Self>) -> AnyRaster {
        AnyRaster::F64(raster)
    }
}

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A view of a channel-interleaved raster inside a shared buffer.
#[derive(Debug, Clone)]
pub struct Raster<T> {
    data: Arc<Vec<T>>,
    offset: usize,
    row_stride: usize,
    width: usize,
    height: usize,
    channels: usize,
}

impl<T: Element> Raster<T> {
    /// Create a contiguous raster that owns `data`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSample` if `data.len() != width * height * channels`.
    pub fn new(width: usize, height: usize, channels: usize, data: Vec<T>) -> Result<Self> {
        let dims = ImageDimensions::new(width, height, channels);
        if data.len() != dims.element_count() {
            return Err(TransformError::sample(format!(
                "{} elements do not form a {}x{}x{} raster",
                data.len(),
                width,
                height,
                channels
            )));
        }
        Self::from_shared(Arc::new(data), 0, dims)
    }

    /// Create a zero-filled contiguous raster.
    pub fn zeros(width: usize, height: usize, channels: usize) -> Self {
        Self::owned(vec![T::default(); width * height * channels], width, height, channels)
    }

    /// Create a contiguous view of `dims` starting at `offset` in a shared buffer.
    pub(crate) fn from_shared(
        data: Arc<Vec<T>>,
        offset: usize,
        dims: ImageDimensions,
    ) -> Result<Self> {
        let count = dims.element_count();
        if offset + count > data.len() {
            return Err(TransformError::sample(format!(
                "buffer of {} elements cannot hold a {}x{}x{} raster at offset {}",
                data.len(),
                dims.width,
                dims.height,
                dims.channels,
                offset
            )));
        }
        Ok(Self {
            data,
            offset,
            row_stride: dims.width * dims.channels,
            width: dims.width,
            height: dims.height,
            channels: dims.channels,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn dims(&self) -> ImageDimensions {
        ImageDimensions::new(self.width, self.height, self.channels)
    }

    /// Total number of elements in the view.
    pub fn element_count(&self) -> usize {
        self.width * self.height * self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.element_count() == 0
    }

    /// Returns true when all rows of the view are adjacent in memory.
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.height <= 1 || self.row_stride == self.width * self.channels
    }

    /// Returns true when this view points into `buffer`.
    pub fn shares_buffer(&self, buffer: &Arc<Vec<T>>) -> bool {
        Arc::ptr_eq(&self.data, buffer)
    }

    /// Elements of row `y` (`width * channels` values).
    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        let start = self.offset + y * self.row_stride;
        &self.data[start..start + self.width * self.channels]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.height).map(move |y| self.row(y))
    }

    /// Channel values of the pixel at (`x`, `y`).
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[T] {
        let start = x * self.channels;
        &self.row(y)[start..start + self.channels]
    }

    /// Flat element slice, only available for contiguous views.
    pub fn as_slice(&self) -> Option<&[T]> {
        if self.is_contiguous() {
            Some(&self.data[self.offset..self.offset + self.element_count()])
        } else {
            None
        }
    }

    /// Copy the view's elements into a new vector in row-major order.
    pub fn to_vec(&self) -> Vec<T> {
        if let Some(slice) = self.as_slice() {
            return slice.to_vec();
        }
        let mut out = Vec::with_capacity(self.element_count());
        for row in self.rows() {
            out.extend_from_slice(row);
        }
        out
    }

    /// Sub-view of `rect`. No pixels are copied.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSample` if the rectangle is not inside the raster.
    pub fn crop(&self, rect: Rect) -> Result<Self> {
        if rect.x + rect.width > self.width || rect.y + rect.height > self.height {
            return Err(TransformError::sample(format!(
                "crop {:?} exceeds raster bounds {}x{}",
                rect, self.width, self.height
            )));
        }
        Ok(Self {
            data: Arc::clone(&self.data),
            offset: self.offset + rect.y * self.row_stride + rect.x * self.channels,
            row_stride: self.row_stride,
            width: rect.width,
            height: rect.height,
            channels: self.channels,
        })
    }

    /// Mirror the raster around its vertical axis into a new buffer.
    pub fn flip_horizontal(&self) -> Self {
        if self.is_empty() {
            return self.to_contiguous();
        }
        let c = self.channels;
        let mut out = Vec::with_capacity(self.element_count());
        for row in self.rows() {
            // Walk pixels right to left, keeping channel order within each pixel
            for pixel in row.chunks_exact(c).rev() {
                out.extend_from_slice(pixel);
            }
        }
        self.with_data(out)
    }

    /// Contiguous copy of the view.
    pub fn to_contiguous(&self) -> Self {
        self.with_data(self.to_vec())
    }

    /// Apply `f` to every element, producing a new raster of type `U`.
    pub fn map<U: Element>(&self, mut f: impl FnMut(T) -> U) -> Raster<U> {
        let mut out = Vec::with_capacity(self.element_count());
        for row in self.rows() {
            out.extend(row.iter().map(|&v| f(v)));
        }
        Raster::owned(out, self.width, self.height, self.channels)
    }

    /// Combine with an equally shaped raster element by element.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSample` if the shapes differ.
    pub fn zip_with<U: Element>(
        &self,
        other: &Raster<U>,
        mut f: impl FnMut(T, U) -> T,
    ) -> Result<Self> {
        if self.dims() != other.dims() {
            return Err(TransformError::sample(format!(
                "shape mismatch: {:?} vs {:?}",
                self.dims(),
                other.dims()
            )));
        }
        let mut out = Vec::with_capacity(self.element_count());
        for (a, b) in self.rows().zip(other.rows()) {
            out.extend(a.iter().zip(b).map(|(&x, &y)| f(x, y)));
        }
        Ok(self.with_data(out))
    }

    /// Reinterpret the elements as `channels` channels and `rows` rows.
    ///
    /// The column count is derived from the total element count, the same
    /// way a flat buffer is reshaped.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSample` if the element count is not divisible.
    pub fn reshape(&self, channels: usize, rows: usize) -> Result<Self> {
        let total = self.element_count();
        if channels == 0 || rows == 0 || total % (channels * rows) != 0 {
            return Err(TransformError::sample(format!(
                "cannot reshape {} elements into {} channels x {} rows",
                total, channels, rows
            )));
        }
        let cols = total / (channels * rows);
        let contiguous = if self.is_contiguous() {
            self.clone()
        } else {
            self.to_contiguous()
        };
        Raster::from_shared(
            contiguous.data,
            contiguous.offset,
            ImageDimensions::new(cols, rows, channels),
        )
    }

    /// Split into the shared buffer and the element offset of a contiguous view.
    pub(crate) fn into_contiguous_parts(self) -> (Arc<Vec<T>>, usize) {
        debug_assert!(self.is_contiguous(), "raster view is not contiguous");
        (self.data, self.offset)
    }

    fn with_data(&self, data: Vec<T>) -> Self {
        Self::owned(data, self.width, self.height, self.channels)
    }

    fn owned(data: Vec<T>, width: usize, height: usize, channels: usize) -> Self {
        debug_assert_eq!(data.len(), width * height * channels);
        Self {
            data: Arc::new(data),
            offset: 0,
            row_stride: width * channels,
            width,
            height,
            channels,
        }
    }
}

/// A raster tagged with its element type.
#[derive(Debug, Clone)]
pub enum AnyRaster {
    F32(Raster<f32>),
    F64(Raster<f64>),
}

impl AnyRaster {
    pub fn element_type(&self) -> ElementType {
        match self {
            AnyRaster::F32(_) => ElementType::Float32,
            AnyRaster::F64(_) => ElementType::Float64,
        }
    }

    pub fn dims(&self) -> ImageDimensions {
        match self {
            AnyRaster::F32(r) => r.dims(),
            AnyRaster::F64(r) => r.dims(),
        }
    }

    pub fn is_contiguous(&self) -> bool {
        match self {
            AnyRaster::F32(r) => r.is_contiguous(),
            AnyRaster::F64(r) => r.is_contiguous(),
        }
    }

    pub fn to_contiguous(&self) -> Self {
        match self {
            AnyRaster::F32(r) => AnyRaster::F32(r.to_contiguous()),
            AnyRaster::F64(r) => AnyRaster::F64(r.to_contiguous()),
        }
    }

    /// Convert to `target` with a lossy numeric cast. A raster that already
    /// has the target type is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedElementType` for non-float targets.
    pub fn convert_to(self, target: ElementType) -> Result<Self> {
        match (self, target) {
            (r @ AnyRaster::F32(_), ElementType::Float32) => Ok(r),
            (r @ AnyRaster::F64(_), ElementType::Float64) => Ok(r),
            (AnyRaster::F32(r), ElementType::Float64) => Ok(AnyRaster::F64(r.map(f64::from))),
            (AnyRaster::F64(r), ElementType::Float32) => Ok(AnyRaster::F32(r.map(|v| v as f32))),
            (_, other) => Err(TransformError::UnsupportedElementType(other)),
        }
    }
}

impl From<Raster<f32>> for AnyRaster {
    fn from(raster: Raster<f32>) -> Self {
        AnyRaster::F32(raster)
    }
}

impl From<Raster<f64>> for AnyRaster {
    fn from(raster: Raster<f64>) -> Self {
        AnyRaster::F64(raster)
    }
}
