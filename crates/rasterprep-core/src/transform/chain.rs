//! Ordered transform pipelines.

use std::sync::Arc;

use crate::config::TransformConfig;
use crate::error::{Result, TransformError};
use crate::sample::Sample;
use crate::stream::StreamDescriptor;

use super::{CropTransform, MeanTransform, ScaleTransform, Transform, TransposeTransform};

/// One configured chain stage.
#[derive(Debug)]
pub enum ImageTransform {
    Crop(CropTransform),
    Scale(ScaleTransform),
    Mean(MeanTransform),
    Transpose(TransposeTransform),
}

impl ImageTransform {
    pub fn from_config(config: &TransformConfig) -> Result<Self> {
        Ok(match config {
            TransformConfig::Crop(c) => ImageTransform::Crop(CropTransform::new(c)?),
            TransformConfig::Scale(c) => ImageTransform::Scale(ScaleTransform::new(c)?),
            TransformConfig::Mean(c) => ImageTransform::Mean(MeanTransform::new(c)?),
            TransformConfig::Transpose(c) => ImageTransform::Transpose(TransposeTransform::new(c)),
        })
    }
}

impl Transform for ImageTransform {
    fn name(&self) -> &'static str {
        match self {
            ImageTransform::Crop(t) => t.name(),
            ImageTransform::Scale(t) => t.name(),
            ImageTransform::Mean(t) => t.name(),
            ImageTransform::Transpose(t) => t.name(),
        }
    }

    fn negotiate(&mut self, input: &StreamDescriptor) -> Result<StreamDescriptor> {
        match self {
            ImageTransform::Crop(t) => t.negotiate(input),
            ImageTransform::Scale(t) => t.negotiate(input),
            ImageTransform::Mean(t) => t.negotiate(input),
            ImageTransform::Transpose(t) => t.negotiate(input),
        }
    }

    fn apply(&self, sample: Arc<Sample>) -> Result<Arc<Sample>> {
        match self {
            ImageTransform::Crop(t) => t.apply(sample),
            ImageTransform::Scale(t) => t.apply(sample),
            ImageTransform::Mean(t) => t.apply(sample),
            ImageTransform::Transpose(t) => t.apply(sample),
        }
    }
}

impl From<CropTransform> for ImageTransform {
    fn from(t: CropTransform) -> Self {
        ImageTransform::Crop(t)
    }
}

impl From<ScaleTransform> for ImageTransform {
    fn from(t: ScaleTransform) -> Self {
        ImageTransform::Scale(t)
    }
}

impl From<MeanTransform> for ImageTransform {
    fn from(t: MeanTransform) -> Self {
        ImageTransform::Mean(t)
    }
}

impl From<TransposeTransform> for ImageTransform {
    fn from(t: TransposeTransform) -> Self {
        ImageTransform::Transpose(t)
    }
}

/// Transforms applied in order. Negotiation threads each stage's output
/// descriptor into the next stage; application threads samples the same way.
///
/// Errors from a stage are wrapped in [`TransformError::Stage`].
#[derive(Debug, Default)]
pub struct TransformChain {
    stages: Vec<ImageTransform>,
    output: Option<StreamDescriptor>,
}

impl TransformChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    pub fn with(mut self, stage: impl Into<ImageTransform>) -> Self {
        self.stages.push(stage.into());
        self.output = None;
        self
    }

    pub fn from_configs(configs: &[TransformConfig]) -> Result<Self> {
        let stages = configs
            .iter()
            .map(ImageTransform::from_config)
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(stages = stages.len(), "transform chain built");
        Ok(Self {
            stages,
            output: None,
        })
    }

    /// Build a chain from a JSON array of stage configurations.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_configs(&TransformConfig::list_from_json(json)?)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[ImageTransform] {
        &self.stages
    }

    /// Output descriptor of the last negotiation.
    pub fn output(&self) -> Option<&StreamDescriptor> {
        self.output.as_ref()
    }
}

fn stage_error(index: usize, name: &'static str, source: TransformError) -> TransformError {
    TransformError::Stage {
        index,
        name,
        source: Box::new(source),
    }
}

impl Transform for TransformChain {
    fn name(&self) -> &'static str {
        "chain"
    }

    #[tracing::instrument(skip(self, input), fields(stream = %input.name, stages = self.stages.len()))]
    fn negotiate(&mut self, input: &StreamDescriptor) -> Result<StreamDescriptor> {
        let mut current = input.clone();
        for (index, stage) in self.stages.iter_mut().enumerate() {
            current = stage
                .negotiate(&current)
                .map_err(|e| stage_error(index, stage.name(), e))?;
        }
        self.output = Some(current.clone());
        Ok(current)
    }

    #[tracing::instrument(level = "trace", skip(self, sample), fields(id = sample.id()))]
    fn apply(&self, sample: Arc<Sample>) -> Result<Arc<Sample>> {
        self.stages
            .iter()
            .enumerate()
            .try_fold(sample, |sample, (index, stage)| {
                stage
                    .apply(sample)
                    .map_err(|e| stage_error(index, stage.name(), e))
            })
    }
}
