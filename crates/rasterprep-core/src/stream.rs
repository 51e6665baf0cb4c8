//! Stream descriptor types negotiated once per stream.

use serde::{Deserialize, Serialize};

/// Storage kind of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StorageKind {
    /// Every sample is a fully populated fixed-shape buffer.
    #[default]
    Dense,
    /// Variable-length samples. Rejected by every image transform.
    Sparse,
}

/// Element type of a stream.
///
/// Only [`ElementType::Float32`] and [`ElementType::Float64`] can be
/// processed; the others exist so negotiation can reject them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ElementType {
    #[default]
    Float32,
    Float64,
    Float16,
    UInt8,
}

impl ElementType {
    /// Size of one element in bytes.
    pub fn size_in_bytes(self) -> usize {
        match self {
            ElementType::Float32 => 4,
            ElementType::Float64 => 8,
            ElementType::Float16 => 2,
            ElementType::UInt8 => 1,
        }
    }

    /// Returns true for the two float widths the transforms operate on.
    #[inline]
    pub fn is_supported(self) -> bool {
        matches!(self, ElementType::Float32 | ElementType::Float64)
    }
}

/// Memory layout of a multi-channel raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Layout {
    /// Channel-interleaved (height, width, channel).
    #[default]
    Hwc,
    /// Channel-planar (channel, height, width).
    Chw,
}

/// Width, height and channel count of an image sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl ImageDimensions {
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }

    /// Number of pixel positions (width * height).
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Total number of elements (width * height * channels).
    pub fn element_count(&self) -> usize {
        self.width * self.height * self.channels
    }

    /// Dimension order as laid out in memory, outermost first.
    pub fn shape(&self, layout: Layout) -> [usize; 3] {
        match layout {
            Layout::Hwc => [self.height, self.width, self.channels],
            Layout::Chw => [self.channels, self.height, self.width],
        }
    }
}

/// Stream metadata exchanged during negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub name: String,
    pub storage: StorageKind,
    pub element_type: ElementType,
    pub dims: ImageDimensions,
    pub layout: Layout,
}

impl StreamDescriptor {
    /// Create a dense HWC stream descriptor.
    pub fn dense(
        name: impl Into<String>,
        element_type: ElementType,
        dims: ImageDimensions,
    ) -> Self {
        Self {
            name: name.into(),
            storage: StorageKind::Dense,
            element_type,
            dims,
            layout: Layout::Hwc,
        }
    }

    /// Size of one sample buffer in bytes.
    pub fn sample_size_in_bytes(&self) -> usize {
        self.dims.element_count() * self.element_type.size_in_bytes()
    }
}
