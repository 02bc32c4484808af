//! Linear regression: design matrices and the OLS engine.

mod design;
mod ols;

pub use design::{encode_predictors, DesignMatrix, INTERCEPT};
pub use ols::{
    ols_regression, Coefficient, ModelStats, QqPoint, RegressionResult, REGULARIZED_WARNING,
};
