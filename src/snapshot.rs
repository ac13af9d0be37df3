//! Timestamped snapshot files written by the batch tool, and the loader the
//! server falls back on when the page can't be scraped at startup.

use std::{
	fs,
	path::{Path, PathBuf},
	time::SystemTime,
};

use chrono::Local;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::record::ModelDeprecationRecord;

pub const DEFAULT_PREFIX: &str = "ibm_deprecated_models";

lazy_static::lazy_static! {
	static ref JSON_SUFFIX: Regex = Regex::new(r"^_\d{8}_\d{6}\.json$").expect("Bad snapshot regex");
}

#[derive(Debug, Error)]
pub enum SnapshotError {
	#[error("No existing data files found")]
	NotFound,
	#[error("No data in existing file")]
	EmptyFile,
	#[error("{0}")]
	Io(#[from] std::io::Error),
	#[error("{0}")]
	Json(#[from] serde_json::Error),
	#[error("{0}")]
	Csv(#[from] csv::Error),
}

/// Files written by one [`SnapshotStore::save`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedSnapshot {
	pub csv: PathBuf,
	pub json: PathBuf,
	pub xlsx: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
	dir: PathBuf,
	prefix: String,
}

impl SnapshotStore {
	pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
		Self {
			dir: dir.into(),
			prefix: prefix.into(),
		}
	}

	fn path_for(&self, stamp: &str, extension: &str) -> PathBuf {
		self.dir.join(format!("{}_{stamp}.{extension}", self.prefix))
	}

	fn stamp() -> String {
		Local::now().format("%Y%m%d_%H%M%S").to_string()
	}

	/// Writes CSV, JSON and (with the `xlsx` feature) spreadsheet copies of a batch.
	/// An empty batch writes nothing.
	pub fn save(&self, records: &[ModelDeprecationRecord]) -> Result<Option<SavedSnapshot>, SnapshotError> {
		if records.is_empty() {
			info!("No data to save");
			return Ok(None);
		}
		fs::create_dir_all(&self.dir)?;
		let stamp = Self::stamp();

		let csv = self.path_for(&stamp, "csv");
		let mut writer = csv::Writer::from_path(&csv)?;
		for record in records {
			writer.serialize(record)?;
		}
		writer.flush()?;
		info!(path = %csv.display(), "Data saved to CSV");

		let json = self.path_for(&stamp, "json");
		fs::write(&json, serde_json::to_string_pretty(records)?)?;
		info!(path = %json.display(), "Data saved to JSON");

		let xlsx = self.path_for(&stamp, "xlsx");
		let xlsx = match write_xlsx(&xlsx, records) {
			Ok(true) => {
				info!(path = %xlsx.display(), "Data saved to Excel");
				Some(xlsx)
			}
			Ok(false) => {
				info!("Excel export not available (built without the xlsx feature)");
				None
			}
			Err(e) => {
				warn!(error = %e, "Excel export failed");
				None
			}
		};

		Ok(Some(SavedSnapshot { csv, json, xlsx }))
	}

	/// Writes an RSS document next to the data snapshots.
	pub fn save_feed(&self, rss: &str) -> Result<PathBuf, SnapshotError> {
		fs::create_dir_all(&self.dir)?;
		let path = self.path_for(&Self::stamp(), "xml");
		fs::write(&path, rss)?;
		info!(path = %path.display(), "RSS feed saved");
		Ok(path)
	}

	/// The most recently modified `{prefix}_YYYYMMDD_HHMMSS.json` in the directory.
	pub fn latest_json(&self) -> Result<PathBuf, SnapshotError> {
		let entries = match fs::read_dir(&self.dir) {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(SnapshotError::NotFound),
			Err(e) => return Err(e.into()),
		};
		let mut newest: Option<(SystemTime, PathBuf)> = None;
		for entry in entries.flatten() {
			let name = entry.file_name();
			let Some(name) = name.to_str() else {
				continue;
			};
			let Some(suffix) = name.strip_prefix(self.prefix.as_str()) else {
				continue;
			};
			if !JSON_SUFFIX.is_match(suffix) {
				continue;
			}
			let Ok(modified) = fs::metadata(entry.path()).and_then(|m| m.modified()) else {
				warn!(path = %entry.path().display(), "Skipping unreadable snapshot");
				continue;
			};
			if newest.as_ref().map_or(true, |(time, _)| modified >= *time) {
				newest = Some((modified, entry.path()));
			}
		}
		newest.map(|(_, path)| path).ok_or(SnapshotError::NotFound)
	}

	/// Loads the newest JSON snapshot. An empty array counts as a failure.
	pub fn load_latest(&self) -> Result<Vec<ModelDeprecationRecord>, SnapshotError> {
		let path = self.latest_json()?;
		info!(path = %path.display(), "Loading data from existing file");
		let records = load_json(&path)?;
		if records.is_empty() {
			return Err(SnapshotError::EmptyFile);
		}
		debug!(count = records.len(), "Loaded snapshot");
		Ok(records)
	}
}

impl Default for SnapshotStore {
	fn default() -> Self {
		Self::new(".", DEFAULT_PREFIX)
	}
}

pub fn load_json(path: &Path) -> Result<Vec<ModelDeprecationRecord>, SnapshotError> {
	let text = fs::read_to_string(path)?;
	Ok(serde_json::from_str(&text)?)
}

#[cfg(feature = "xlsx")]
fn write_xlsx(path: &Path, records: &[ModelDeprecationRecord]) -> Result<bool, rust_xlsxwriter::XlsxError> {
	let mut workbook = rust_xlsxwriter::Workbook::new();
	let sheet = workbook.add_worksheet();
	let header = [
		"foundation_model_name",
		"availability_date",
		"deprecation_date",
		"withdrawal_date",
		"recommended_alternative",
	];
	for (col, title) in (0u16..).zip(header) {
		sheet.write_string(0, col, title)?;
	}
	for (row, record) in (1u32..).zip(records) {
		let cells = [
			&record.name,
			&record.availability_date,
			&record.deprecation_date,
			&record.withdrawal_date,
			&record.recommended_alternative,
		];
		for (col, cell) in (0u16..).zip(cells) {
			sheet.write_string(row, col, cell.as_str())?;
		}
	}
	workbook.save(path)?;
	Ok(true)
}

#[cfg(not(feature = "xlsx"))]
#[allow(clippy::unnecessary_wraps)]
fn write_xlsx(_path: &Path, _records: &[ModelDeprecationRecord]) -> Result<bool, std::convert::Infallible> {
	Ok(false)
}
