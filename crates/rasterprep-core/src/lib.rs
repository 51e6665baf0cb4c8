//! Rasterprep Core - Per-sample image transforms for training pipelines
//!
//! This crate provides the image augmentation stages a data reader runs
//! between decoding and batching: square cropping with jitter and flips,
//! resizing, mean subtraction and HWC to CHW relayout. Transforms negotiate
//! stream metadata once and are then applied to samples from many worker
//! threads concurrently.

pub mod config;
pub mod error;
pub mod raster;
pub mod rng;
pub mod sample;
pub mod stream;
pub mod transform;

pub use config::{CropConfig, CropRatio, MeanConfig, ScaleConfig, TransformConfig, TransposeConfig};
pub use error::{ErrorKind, Result, TransformError};
pub use raster::{AnyRaster, Element, Interpolation, Raster, Rect};
pub use sample::{Sample, SampleBuffer};
pub use stream::{ElementType, ImageDimensions, Layout, StorageKind, StreamDescriptor};
pub use transform::{
    CropTransform, CropType, ImageTransform, JitterType, MeanImage, MeanTransform, ScaleTransform,
    Transform, TransformChain, TransposeTransform,
};
