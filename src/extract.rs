//! Locates the deprecation table in the lifecycle page and turns its rows into records.
//!
//! Two passes run over the page. The primary pass keeps every table whose text
//! mentions both deprecation and foundation models, and takes rows with at least
//! five cells. If that yields nothing, a looser pass accepts any table whose header
//! names a model and a date, and takes rows with at least three cells.

use html_parser::Element;
use tracing::{debug, info, warn};

use crate::{
	document::{self, Document, DocumentError},
	record::ModelDeprecationRecord,
};

const PRIMARY_KEYWORDS: [&str; 2] = ["deprecated", "foundation model"];
const PRIMARY_MIN_CELLS: usize = 5;
const FALLBACK_MIN_CELLS: usize = 3;

/// Which column holds which field. Extraction is purely positional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
	pub name: usize,
	pub availability_date: usize,
	pub deprecation_date: usize,
	pub withdrawal_date: usize,
	pub recommended_alternative: usize,
}

impl Default for ColumnLayout {
	fn default() -> Self {
		Self {
			name: 0,
			availability_date: 1,
			deprecation_date: 2,
			withdrawal_date: 3,
			recommended_alternative: 4,
		}
	}
}

impl ColumnLayout {
	/// Maps one row of cell texts. Rows shorter than `min_cells` are dropped,
	/// columns past the end of a row become empty strings.
	#[must_use]
	pub fn map_row(&self, cells: &[String], min_cells: usize) -> Option<ModelDeprecationRecord> {
		if cells.len() < min_cells {
			return None;
		}
		let cell = |index: usize| cells.get(index).cloned().unwrap_or_default();
		Some(ModelDeprecationRecord {
			name: cell(self.name),
			availability_date: cell(self.availability_date),
			deprecation_date: cell(self.deprecation_date),
			withdrawal_date: cell(self.withdrawal_date),
			recommended_alternative: cell(self.recommended_alternative),
		})
	}
}

#[derive(Debug, Clone, Default)]
pub struct TableExtractor {
	layout: ColumnLayout,
}

impl TableExtractor {
	#[must_use]
	pub fn new(layout: ColumnLayout) -> Self {
		Self { layout }
	}

	/// Extracts records, logging and returning nothing if the page can't be parsed.
	#[must_use]
	pub fn extract(&self, html: &str) -> Vec<ModelDeprecationRecord> {
		match self.try_extract(html) {
			Ok(records) => records,
			Err(e) => {
				warn!(error = %e, "Error parsing the webpage");
				Vec::new()
			}
		}
	}

	pub fn try_extract(&self, html: &str) -> Result<Vec<ModelDeprecationRecord>, DocumentError> {
		let document = Document::parse(html)?;
		let tables = document.tables();
		debug!(tables = tables.len(), "Scanning tables");

		let records = self.primary_pass(&tables);
		if !records.is_empty() {
			return Ok(records);
		}
		info!("No deprecated models table found, trying header-based fallback");
		Ok(self.fallback_pass(&tables))
	}

	fn primary_pass(&self, tables: &[&Element]) -> Vec<ModelDeprecationRecord> {
		let mut records = Vec::new();
		for table in tables {
			let text = document::text(table).to_lowercase();
			if !PRIMARY_KEYWORDS.iter().all(|keyword| text.contains(keyword)) {
				continue;
			}
			info!(id = ?table.id, "Found deprecated models table");
			let rows = self.body_rows(table, PRIMARY_MIN_CELLS);
			if rows.is_empty() {
				debug!(
					id = ?table.id,
					min_cells = PRIMARY_MIN_CELLS,
					"Matching table has no rows with enough cells"
				);
			}
			records.extend(rows);
		}
		records
	}

	fn fallback_pass(&self, tables: &[&Element]) -> Vec<ModelDeprecationRecord> {
		let mut records = Vec::new();
		for table in tables {
			let rows = document::find_all(&table.children, &["tr"]);
			if rows.len() <= 1 {
				continue;
			}
			let headers = cell_texts(rows[0])
				.into_iter()
				.map(|header| header.to_lowercase())
				.collect::<Vec<_>>();
			let names_model = headers.iter().any(|header| header.contains("model"));
			let names_date = headers.iter().any(|header| header.contains("date"));
			if !(names_model && names_date) {
				continue;
			}
			info!(?headers, "Found potential table");
			records.extend(self.body_rows(table, FALLBACK_MIN_CELLS));
		}
		records
	}

	fn body_rows(&self, table: &Element, min_cells: usize) -> Vec<ModelDeprecationRecord> {
		document::find_all(&table.children, &["tr"])
			.into_iter()
			.skip(1)
			.filter_map(|row| self.layout.map_row(&cell_texts(row), min_cells))
			.collect()
	}
}

fn cell_texts(row: &Element) -> Vec<String> {
	document::find_all(&row.children, &["td", "th"])
		.into_iter()
		.map(document::stripped_text)
		.collect()
}

/// Runs the default extractor over `html`.
#[must_use]
pub fn extract_records(html: &str) -> Vec<ModelDeprecationRecord> {
	TableExtractor::default().extract(html)
}
