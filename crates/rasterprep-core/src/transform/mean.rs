//! Per-pixel mean image subtraction.
//!
//! The mean image is stored as a JSON document:
//!
//! ```text
//! {
//!   "Channel": 3, "Row": 24, "Col": 24,
//!   "MeanImg": { "rows": 24, "cols": 72, "channels": 1, "data": [ ... ] }
//! }
//! ```
//!
//! `MeanImg` may be stored in any shape with the right element count; it is
//! reshaped to `Channel` channels by `Row` rows after loading.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::MeanConfig;
use crate::error::{Result, TransformError};
use crate::raster::{AnyRaster, Element, Raster};
use crate::sample::Sample;
use crate::stream::{ImageDimensions, StreamDescriptor};

use super::{RasterOp, Transform, TransformBase};

fn one() -> usize {
    1
}

/// A stored matrix: `rows` x `cols` pixels of `channels` interleaved values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixData {
    pub rows: usize,
    pub cols: usize,
    #[serde(default = "one")]
    pub channels: usize,
    pub data: Vec<f64>,
}

/// On-disk mean image document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeanImageFile {
    pub channel: usize,
    pub row: usize,
    pub col: usize,
    pub mean_img: MatrixData,
}

/// Mean image to subtract, or nothing.
#[derive(Debug, Clone, Default)]
pub struct MeanImage {
    raster: Option<Raster<f64>>,
}

impl MeanImage {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_raster(raster: Raster<f64>) -> Self {
        Self {
            raster: Some(raster),
        }
    }

    /// Load a mean image document from `path`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file cannot be opened or parsed, or if
    /// its declared and stored element counts disagree.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            TransformError::config(format!("Could not open file {}: {}", path.display(), e))
        })?;
        let doc: MeanImageFile = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            TransformError::config(format!("Invalid data in file {}: {}", path.display(), e))
        })?;
        Self::from_document(doc, &path.display().to_string())
    }

    /// Validate a parsed document and reshape it into a mean raster.
    pub fn from_document(doc: MeanImageFile, source: &str) -> Result<Self> {
        let img = &doc.mean_img;
        let stored = img
            .rows
            .checked_mul(img.cols)
            .and_then(|n| n.checked_mul(img.channels));
        let declared = doc
            .channel
            .checked_mul(doc.row)
            .and_then(|n| n.checked_mul(doc.col));

        if stored.is_none() || stored != declared {
            return Err(TransformError::config(format!(
                "Invalid data in file {}: {}x{}x{} declared, {}x{}x{} stored",
                source, doc.channel, doc.row, doc.col, img.rows, img.cols, img.channels
            )));
        }
        if Some(img.data.len()) != stored {
            return Err(TransformError::config(format!(
                "Invalid data in file {}: MeanImg holds {} values",
                source,
                img.data.len()
            )));
        }

        let MeanImageFile {
            channel,
            row,
            mean_img,
            ..
        } = doc;
        let raster = Raster::new(mean_img.cols, mean_img.rows, mean_img.channels, mean_img.data)
            .and_then(|r| r.reshape(channel, row))
            .map_err(|e| TransformError::config(format!("Invalid data in file {}: {}", source, e)))?;

        Ok(Self::from_raster(raster))
    }

    pub fn is_empty(&self) -> bool {
        self.raster.is_none()
    }

    pub fn dims(&self) -> Option<ImageDimensions> {
        self.raster.as_ref().map(Raster::dims)
    }

    /// Subtract the mean if the shapes match. Returns `None` otherwise.
    fn subtract_from<T: Element>(&self, raster: &Raster<T>) -> Option<Result<Raster<T>>> {
        let mean = self.raster.as_ref()?;
        if mean.dims() != raster.dims() {
            return None;
        }
        Some(raster.zip_with(mean, |v, m| v - T::from_f64(m)))
    }
}

/// Mean subtraction transform.
#[derive(Debug)]
pub struct MeanTransform {
    base: TransformBase,
    mean: MeanImage,
}

impl MeanTransform {
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `mean_file` is set but cannot be loaded.
    pub fn new(config: &MeanConfig) -> Result<Self> {
        let mean = if config.mean_file.is_empty() {
            MeanImage::empty()
        } else {
            MeanImage::load(&config.mean_file)?
        };
        tracing::debug!(
            mean_file = %config.mean_file,
            dims = ?mean.dims(),
            "mean transform configured"
        );
        Ok(Self::with_mean(mean))
    }

    pub fn with_mean(mean: MeanImage) -> Self {
        Self {
            base: TransformBase::new("mean"),
            mean,
        }
    }

    pub fn mean(&self) -> &MeanImage {
        &self.mean
    }
}

impl RasterOp for MeanTransform {
    fn apply_raster(&self, id: u64, raster: AnyRaster) -> Result<AnyRaster> {
        let result = match &raster {
            AnyRaster::F32(r) => self.mean.subtract_from(r).map(|r| r.map(AnyRaster::F32)),
            AnyRaster::F64(r) => self.mean.subtract_from(r).map(|r| r.map(AnyRaster::F64)),
        };
        match result {
            Some(subtracted) => subtracted,
            None => {
                tracing::trace!(
                    id,
                    sample = ?raster.dims(),
                    mean = ?self.mean.dims(),
                    "mean skipped"
                );
                Ok(raster)
            }
        }
    }
}

impl Transform for MeanTransform {
    fn name(&self) -> &'static str {
        "mean"
    }

    fn negotiate(&mut self, input: &StreamDescriptor) -> Result<StreamDescriptor> {
        self.base.negotiate(input)
    }

    fn apply(&self, sample: Arc<Sample>) -> Result<Arc<Sample>> {
        self.base.apply_sample(self, sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::ElementType;
    use std::path::PathBuf;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "rasterprep-mean-{}-{}.json",
            std::process::id(),
            name
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn negotiated(mean: MeanImage, element_type: ElementType) -> MeanTransform {
        let mut transform = MeanTransform::with_mean(mean);
        transform
            .negotiate(&StreamDescriptor::dense(
                "features",
                element_type,
                ImageDimensions::new(2, 2, 1),
            ))
            .unwrap();
        transform
    }

    #[test]
    fn test_load_reshapes() {
        // Stored as 1 row of 12 single-channel values, used as 2x2x3
        let path = temp_file(
            "reshape",
            r#"{ "Channel": 3, "Row": 2, "Col": 2,
                 "MeanImg": { "rows": 1, "cols": 12, "data": [0,1,2,3,4,5,6,7,8,9,10,11] } }"#,
        );
        let mean = MeanImage::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(mean.dims(), Some(ImageDimensions::new(2, 2, 3)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = MeanImage::load("/nonexistent/rasterprep/mean.json").unwrap_err();
        assert!(matches!(err, TransformError::InvalidConfig(ref m) if m.contains("Could not open file")));
    }

    #[test]
    fn test_load_count_mismatch() {
        let path = temp_file(
            "mismatch",
            r#"{ "Channel": 3, "Row": 2, "Col": 2,
                 "MeanImg": { "rows": 2, "cols": 2, "channels": 1, "data": [0,0,0,0] } }"#,
        );
        let err = MeanImage::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, TransformError::InvalidConfig(ref m) if m.contains("Invalid data in file")));
    }

    #[test]
    fn test_load_short_data() {
        let path = temp_file(
            "short",
            r#"{ "Channel": 1, "Row": 2, "Col": 2,
                 "MeanImg": { "rows": 2, "cols": 2, "data": [0,0,0] } }"#,
        );
        let err = MeanImage::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, TransformError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_garbage() {
        let path = temp_file("garbage", "not json");
        let err = MeanImage::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, TransformError::InvalidConfig(_)));
    }

    #[test]
    fn test_empty_mean_file_disables() {
        let transform = MeanTransform::new(&MeanConfig::default()).unwrap();
        assert!(transform.mean().is_empty());
    }

    #[test]
    fn test_subtracts_matching_mean() {
        let mean = Raster::new(2, 2, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let transform = negotiated(MeanImage::from_raster(mean), ElementType::Float32);

        let sample = Sample::new(0, ImageDimensions::new(2, 2, 1), vec![10.0f32, 10.0, 10.0, 10.0]).unwrap();
        let out = transform.apply(Arc::new(sample)).unwrap();

        assert_eq!(out.as_f32().unwrap(), &[9.0, 8.0, 7.0, 6.0]);
        assert!(out.original().is_none());
    }

    #[test]
    fn test_subtracts_in_f64() {
        let mean = Raster::new(2, 2, 1, vec![0.25; 4]).unwrap();
        let transform = negotiated(MeanImage::from_raster(mean), ElementType::Float64);

        let sample = Sample::new(0, ImageDimensions::new(2, 2, 1), vec![1.0f64; 4]).unwrap();
        let out = transform.apply(Arc::new(sample)).unwrap();
        assert_eq!(out.as_f64().unwrap(), &[0.75; 4]);
    }

    #[test]
    fn test_mismatched_shape_passes_through() {
        let mean = Raster::new(2, 2, 1, vec![1.0; 4]).unwrap();
        let transform = negotiated(MeanImage::from_raster(mean), ElementType::Float32);

        let input = Arc::new(Sample::new(0, ImageDimensions::new(3, 1, 1), vec![5.0f32; 3]).unwrap());
        let out = transform.apply(Arc::clone(&input)).unwrap();

        assert_eq!(out.as_f32().unwrap(), &[5.0; 3]);
        assert!(Arc::ptr_eq(out.original().unwrap(), &input));
    }

    #[test]
    fn test_empty_mean_passes_through() {
        let transform = negotiated(MeanImage::empty(), ElementType::Float32);
        let input = Arc::new(Sample::new(0, ImageDimensions::new(2, 2, 1), vec![5.0f32; 4]).unwrap());
        let out = transform.apply(input).unwrap();
        assert_eq!(out.as_f32().unwrap(), &[5.0; 4]);
    }
}
