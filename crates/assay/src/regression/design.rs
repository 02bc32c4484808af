//! Design-matrix construction with dummy encoding.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::assay::AssayConfig;
use crate::error::{AssayError, Result};
use crate::input::{Row, Value};
use crate::math::Matrix;
use crate::schema::{find_column, ColumnInfo};

/// Name of the constant term.
pub const INTERCEPT: &str = "Intercept";

/// A design matrix and the term labelling each of its columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignMatrix {
    /// One row per retained observation; column 0 is the intercept.
    pub design: Matrix,
    /// Term names, `terms[0] == "Intercept"`.
    pub terms: Vec<String>,
    /// Indices of the input rows that made it into `design`.
    pub rows: Vec<usize>,
}

impl DesignMatrix {
    /// Number of columns including the intercept.
    pub fn width(&self) -> usize {
        self.terms.len()
    }
}

enum Encoding {
    Numeric,
    Dummies(Vec<String>),
}

/// Encode predictors into a design matrix with an intercept column.
///
/// Numeric predictors pass through. Every other detected type is expanded
/// to one dummy per level except the lexicographically smallest, which is
/// the reference. Predictors without metadata are treated as numeric. Rows
/// with a non-finite numeric predictor are left out and do not appear in
/// [`DesignMatrix::rows`].
pub fn encode_predictors(
    data: &[Row],
    predictors: &[String],
    columns: &[ColumnInfo],
    config: &AssayConfig,
) -> Result<DesignMatrix> {
    let mut terms = vec![INTERCEPT.to_string()];
    let mut encodings = Vec::with_capacity(predictors.len());

    for name in predictors {
        if !data.iter().any(|row| row.contains_key(name)) {
            return Err(AssayError::UnknownColumn(name.clone()));
        }
        let numeric = find_column(columns, name).map_or(true, ColumnInfo::is_numeric);
        if numeric {
            terms.push(name.clone());
            encodings.push(Encoding::Numeric);
            continue;
        }

        let levels: BTreeSet<String> = data
            .iter()
            .map(|row| row.get(name).map_or_else(|| Value::Missing.label(), Value::label))
            .collect();
        if levels.len() > config.max_levels_per_factor {
            return Err(AssayError::TooManyLevels {
                column: name.clone(),
                levels: levels.len(),
                limit: config.max_levels_per_factor,
            });
        }
        let dummies: Vec<String> = levels.into_iter().skip(1).collect();
        terms.extend(dummies.iter().map(|level| format!("{}[{}]", name, level)));
        encodings.push(Encoding::Dummies(dummies));
    }

    if terms.len() > config.max_design_columns {
        return Err(AssayError::DesignTooWide {
            columns: terms.len(),
            limit: config.max_design_columns,
        });
    }

    let mut design = Vec::with_capacity(data.len());
    let mut kept = Vec::with_capacity(data.len());
    'rows: for (index, row) in data.iter().enumerate() {
        let mut vector = Vec::with_capacity(terms.len());
        vector.push(1.0);
        for (name, encoding) in predictors.iter().zip(&encodings) {
            let value = row.get(name);
            match encoding {
                Encoding::Numeric => match value.and_then(Value::as_f64) {
                    Some(v) => vector.push(v),
                    None => continue 'rows,
                },
                Encoding::Dummies(levels) => {
                    let label = value.map_or_else(|| Value::Missing.label(), Value::label);
                    vector.extend(levels.iter().map(|l| if *l == label { 1.0 } else { 0.0 }));
                }
            }
        }
        design.push(vector);
        kept.push(index);
    }

    Ok(DesignMatrix {
        design,
        terms,
        rows: kept,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::row;

    fn data() -> Vec<Row> {
        vec![
            row([("x", Value::from(1.0)), ("g", Value::from("b"))]),
            row([("x", Value::from(2.0)), ("g", Value::from("a"))]),
            row([("x", Value::from("oops")), ("g", Value::from("c"))]),
            row([("x", Value::from(4.0)), ("g", Value::from("c"))]),
        ]
    }

    fn columns() -> Vec<ColumnInfo> {
        vec![ColumnInfo::numeric("x"), ColumnInfo::categorical("g")]
    }

    #[test]
    fn test_dummy_terms_drop_reference_level() {
        let encoded = encode_predictors(
            &data(),
            &["x".to_string(), "g".to_string()],
            &columns(),
            &AssayConfig::default(),
        )
        .unwrap();

        assert_eq!(encoded.terms, vec!["Intercept", "x", "g[b]", "g[c]"]);
        assert_eq!(encoded.design[0], vec![1.0, 1.0, 1.0, 0.0]);
        assert_eq!(encoded.design[1], vec![1.0, 2.0, 0.0, 0.0]);
        assert_eq!(encoded.design[2], vec![1.0, 4.0, 0.0, 1.0]);
        assert_eq!(encoded.rows, vec![0, 1, 3]);
    }

    #[test]
    fn test_encoding_follows_detected_type() {
        // Numeric-looking labels are still dummy-encoded when declared categorical.
        let rows = vec![row([("k", 1)]), row([("k", 2)]), row([("k", 1)])];
        let encoded = encode_predictors(
            &rows,
            &["k".to_string()],
            &[ColumnInfo::categorical("k")],
            &AssayConfig::default(),
        )
        .unwrap();
        assert_eq!(encoded.terms, vec!["Intercept", "k[2]"]);
        assert_eq!(encoded.design[1], vec![1.0, 1.0]);
    }

    #[test]
    fn test_unknown_predictor() {
        let err = encode_predictors(&data(), &["z".to_string()], &columns(), &AssayConfig::default())
            .unwrap_err();
        assert!(matches!(err, AssayError::UnknownColumn(name) if name == "z"));
    }

    #[test]
    fn test_width_and_level_limits() {
        let config = AssayConfig::builder().max_levels_per_factor(2).build();
        let err = encode_predictors(&data(), &["g".to_string()], &columns(), &config).unwrap_err();
        assert!(matches!(err, AssayError::TooManyLevels { levels: 3, .. }));

        let config = AssayConfig::builder().max_design_columns(2).build();
        let err = encode_predictors(&data(), &["g".to_string()], &columns(), &config).unwrap_err();
        assert!(matches!(err, AssayError::DesignTooWide { columns: 3, limit: 2 }));
    }
}
