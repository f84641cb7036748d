//! Holdout accuracy of a surrogate.

use agri_types::ModelError;
use serde::{Deserialize, Serialize};

use crate::corpus::TrainingExample;
use crate::SurrogateModel;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub samples: usize,
    pub rmse: f64,
    pub mae: f64,
    /// Coefficient of determination; 0 when the holdout target is constant.
    pub r_squared: f64,
}

pub fn evaluate(
    model: &dyn SurrogateModel,
    holdout: &[TrainingExample],
) -> Result<ModelReport, ModelError> {
    if holdout.is_empty() {
        return Err(ModelError::EmptyCorpus);
    }
    let n = holdout.len() as f64;
    let mean = holdout.iter().map(|ex| ex.yield_kg_per_ha).sum::<f64>() / n;

    let mut sse = 0.0;
    let mut sae = 0.0;
    let mut sst = 0.0;
    for ex in holdout {
        let err = model.predict(&ex.features) - ex.yield_kg_per_ha;
        sse += err * err;
        sae += err.abs();
        sst += (ex.yield_kg_per_ha - mean).powi(2);
    }

    Ok(ModelReport {
        samples: holdout.len(),
        rmse: (sse / n).sqrt(),
        mae: sae / n,
        r_squared: if sst > 0.0 { 1.0 - sse / sst } else { 0.0 },
    })
}
