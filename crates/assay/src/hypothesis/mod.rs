//! Classical hypothesis tests.

mod contingency;
mod correlation;
mod means;

pub use contingency::{chi_square_test, ChiSquareResult, ContingencyTable, MIN_EXPECTED_COUNT};
pub use correlation::{pearson_correlation, CorrelationResult};
pub use means::{
    group_values, one_way_anova, summarize_groups, t_test_2_sample, AnovaResult, GroupSummary,
    TTestResult,
};
