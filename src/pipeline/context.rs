use crate::pipeline::encoding::{encode, EncodeError, SurveyAnswers};
use crate::pipeline::labels::StressLevel;
use crate::pipeline::mappings::MappingTable;
use crate::pipeline::model::TrainedStressModel;
use crate::pipeline::recommend::recommend;
use std::fmt;

/// Everything a prediction request needs, built once at startup and shared
/// read-only across requests. Nothing here is mutated after construction, so
/// concurrent handlers need no locking.
pub struct PredictionContext {
    mappings: MappingTable,
    model: TrainedStressModel,
}

/// One prediction outcome: the level, all eleven global importance weights in
/// model feature order, and at most two recommendations.
#[derive(Debug, Clone)]
pub struct StressPrediction {
    pub prediction: StressLevel,
    pub feature_importance: Vec<(String, f64)>,
    pub recommendations: Vec<String>,
}

impl PredictionContext {
    pub fn new(mappings: MappingTable, model: TrainedStressModel) -> Self {
        Self { mappings, model }
    }

    pub fn mappings(&self) -> &MappingTable {
        &self.mappings
    }

    pub fn feature_order(&self) -> &[String] {
        &self.model.feature_order
    }

    /// encode -> classify -> importance -> recommend.
    pub fn predict(&self, answers: &SurveyAnswers) -> Result<StressPrediction, PredictError> {
        let sample = encode(answers, &self.mappings)?;

        let prediction = self
            .model
            .predict(&sample)
            .ok_or_else(|| PredictError::Classifier("classifier returned no class".to_string()))?;

        Ok(StressPrediction {
            prediction,
            feature_importance: self.model.importance_pairs(),
            recommendations: recommend(answers, prediction),
        })
    }
}

#[derive(Debug)]
pub enum PredictError {
    /// A raw answer has no mapping entry; reported back to the caller.
    UnmappedValue(EncodeError),
    /// Anything unexpected in the classification step; logged server-side and
    /// reported generically.
    Classifier(String),
}

impl fmt::Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictError::UnmappedValue(err) => write!(f, "{err}"),
            PredictError::Classifier(message) => write!(f, "prediction failed: {message}"),
        }
    }
}

impl std::error::Error for PredictError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PredictError::UnmappedValue(err) => Some(err),
            PredictError::Classifier(_) => None,
        }
    }
}

impl From<EncodeError> for PredictError {
    fn from(err: EncodeError) -> Self {
        Self::UnmappedValue(err)
    }
}
