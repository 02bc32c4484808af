//! Dataset preparation: cleaning decisions, adjustments and the pipeline
//! that turns raw rows into an analysis-ready dataset.

mod decisions;
mod pipeline;

pub use decisions::{
    Adjustments, Justification, MissingStrategy, OutlierMode, PrepDecisions, Transform,
    OUTLIER_IQR_MULTIPLIER, OUTLIER_RULE,
};
pub use pipeline::{build_final_dataset, fingerprint, DatasetMeta, FinalDataset, ORIGINAL_SUFFIX};
