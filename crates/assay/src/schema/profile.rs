//! Column profiling for raw tables.
//!
//! Produces the metadata the rest of the engine trusts as given. Callers may
//! override any field before preparing the dataset.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::input::{DataTable, Value};

use super::column::ColumnInfo;
use super::types::{ColumnRole, DetectedType};

// Splits camelCase boundaries before tokenizing a column name.
static CAMEL_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());
static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]+").unwrap());

/// Unique ratio at or above which a non-numeric column is free text.
const TEXT_UNIQUE_RATIO: f64 = 0.5;

/// Infer metadata for every column of a table.
pub fn profile_columns(table: &DataTable) -> Vec<ColumnInfo> {
    table
        .headers
        .iter()
        .map(|name| profile_column(table, name))
        .collect()
}

/// Infer metadata for a single column.
pub fn profile_column(table: &DataTable, name: &str) -> ColumnInfo {
    let rows = table.row_count();
    let mut missing = 0usize;
    let mut all_numeric = true;
    let mut distinct: HashSet<String> = HashSet::new();

    for value in table.column_values(name) {
        match value {
            Value::Missing => missing += 1,
            Value::Numeric(_) => {
                distinct.insert(value.label());
            }
            Value::Categorical(_) => {
                all_numeric = false;
                distinct.insert(value.label());
            }
        }
    }

    let present = rows - missing;
    let unique_ratio = if rows == 0 {
        0.0
    } else {
        distinct.len() as f64 / rows as f64
    };
    let missing_pct = if rows == 0 {
        0.0
    } else {
        missing as f64 / rows as f64 * 100.0
    };

    let detected_type = if all_numeric && present > 0 {
        DetectedType::Numeric
    } else if unique_ratio >= TEXT_UNIQUE_RATIO {
        DetectedType::Text
    } else {
        DetectedType::Categorical
    };

    let role = if is_id_like_name(name) && present > 0 && distinct.len() == present {
        ColumnRole::Identifier
    } else {
        ColumnRole::Predictor
    };

    ColumnInfo {
        name: name.to_string(),
        detected_type,
        role,
        unique_ratio,
        missing_pct,
        levels_count: (detected_type == DetectedType::Categorical).then_some(distinct.len()),
    }
}

/// Check whether a column name looks like an identifier.
pub fn is_id_like_name(name: &str) -> bool {
    let spaced = CAMEL_BOUNDARY.replace_all(name, "$1 $2");
    let normalized = NON_ALNUM.replace_all(&spaced, " ").to_lowercase();
    normalized
        .split_whitespace()
        .any(|token| matches!(token, "id" | "uuid" | "guid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataTable {
        DataTable::from_records(
            vec!["studentId".into(), "score".into(), "group".into(), "note".into()],
            vec![
                vec!["1".into(), "80".into(), "A".into(), "alpha".into()],
                vec!["2".into(), "".into(), "B".into(), "beta".into()],
                vec!["3".into(), "75".into(), "A".into(), "gamma".into()],
                vec!["4".into(), "90".into(), "A".into(), "delta".into()],
                vec!["5".into(), "85".into(), "B".into(), "epsilon".into()],
            ],
        )
    }

    #[test]
    fn test_id_like_names() {
        assert!(is_id_like_name("sample_id"));
        assert!(is_id_like_name("studentId"));
        assert!(is_id_like_name("UUID"));
        assert!(!is_id_like_name("width"));
        assert!(!is_id_like_name("paid"));
    }

    #[test]
    fn test_profile_types_and_roles() {
        let columns = profile_columns(&table());

        assert_eq!(columns[0].role, ColumnRole::Identifier);
        assert_eq!(columns[1].detected_type, DetectedType::Numeric);
        assert!((columns[1].missing_pct - 20.0).abs() < 1e-12);
        assert_eq!(columns[2].detected_type, DetectedType::Categorical);
        assert_eq!(columns[2].levels_count, Some(2));
        assert_eq!(columns[3].detected_type, DetectedType::Text);
    }
}
