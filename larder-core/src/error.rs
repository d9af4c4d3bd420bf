use thiserror::Error;

use crate::catalog::CatalogError;
use crate::composer::TemplateRejection;
use crate::dietary::DietaryConstraintSet;

/// Errors surfaced by the synthesis pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    /// Rejected before entering the pipeline.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Every candidate template failed role assignment under the constraints.
    #[error("No feasible recipe for cuisine {cuisine:?}")]
    NoFeasibleTemplate {
        cuisine: String,
        constraints: DietaryConstraintSet,
        rejections: Vec<TemplateRejection>,
    },

    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),
}

impl From<CatalogError> for SynthesisError {
    fn from(e: CatalogError) -> Self {
        SynthesisError::CatalogUnavailable(e.to_string())
    }
}
