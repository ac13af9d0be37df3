use serde::{Deserialize, Serialize};

/// What the lifecycle table puts in a cell that has no value yet (an en dash).
pub const PLACEHOLDER: &str = "\u{2013}";

/// One row of the deprecation table. Every field is the cell text as shown on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDeprecationRecord {
	#[serde(rename = "foundation_model_name")]
	pub name: String,
	pub availability_date: String,
	pub deprecation_date: String,
	pub withdrawal_date: String,
	pub recommended_alternative: String,
}

impl ModelDeprecationRecord {
	#[must_use]
	pub fn has_alternative(&self) -> bool {
		is_set(&self.recommended_alternative)
	}
}

/// True when a cell carries a value, i.e. it is neither empty nor the placeholder.
#[must_use]
pub fn is_set(cell: &str) -> bool {
	!cell.is_empty() && cell != PLACEHOLDER
}
