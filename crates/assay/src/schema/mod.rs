//! Column metadata: types, roles and profiling.

mod column;
mod profile;
mod types;

pub use column::{find_column, ColumnInfo};
pub use profile::{is_id_like_name, profile_column, profile_columns};
pub use types::{ColumnRole, DetectedType};
