//! Renders a batch of records as an RSS 2.0 channel.

use chrono::{DateTime, Utc};
use rss::{CategoryBuilder, ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::record::{is_set, ModelDeprecationRecord};

pub const DEFAULT_SOURCE_URL: &str = "https://www.ibm.com/docs/en/watsonx/saas?topic=model-foundation-lifecycle#foundation-model-deprecation";
pub const RSS_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";
pub const CATEGORY: &str = "AI/ML Models";
pub const GUID_PREFIX: &str = "ibm-model-";

const FALLBACK_YEAR: &str = "2025";
const MONTHS: [(&str, &str); 12] = [
	("January", "01"),
	("February", "02"),
	("March", "03"),
	("April", "04"),
	("May", "05"),
	("June", "06"),
	("July", "07"),
	("August", "08"),
	("September", "09"),
	("October", "10"),
	("November", "11"),
	("December", "12"),
];

#[derive(Debug, Error)]
pub enum FeedError {
	#[error("could not write RSS: {0}")]
	Write(#[from] rss::Error),
	#[error("RSS output is not UTF-8: {0}")]
	Encoding(#[from] std::string::FromUtf8Error),
}

/// Channel-level text. Identical for every build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedMeta {
	pub title: String,
	pub link: String,
	pub description: String,
}

impl Default for FeedMeta {
	fn default() -> Self {
		Self {
			title: "IBM Watson Deprecated Foundation Models".to_string(),
			link: DEFAULT_SOURCE_URL.to_string(),
			description: "List of deprecated foundation models from IBM WatsonX documentation with deprecation dates and recommended alternatives.".to_string(),
		}
	}
}

#[derive(Debug, Clone, Default)]
pub struct FeedBuilder {
	meta: FeedMeta,
}

impl FeedBuilder {
	#[must_use]
	pub fn new(meta: FeedMeta) -> Self {
		Self { meta }
	}

	pub fn build(&self, records: &[ModelDeprecationRecord]) -> Result<String, FeedError> {
		self.build_at(records, Utc::now())
	}

	/// Builds the document as of `now`, which stands in for every "current time" field.
	pub fn build_at(
		&self,
		records: &[ModelDeprecationRecord],
		now: DateTime<Utc>,
	) -> Result<String, FeedError> {
		let now = now.format(RSS_DATE_FORMAT).to_string();
		let channel = ChannelBuilder::default()
			.title(self.meta.title.clone())
			.link(self.meta.link.clone())
			.description(self.meta.description.clone())
			.language(Some("en-us".to_string()))
			.last_build_date(Some(now.clone()))
			.items(records.iter().map(|record| item(record, &now)).collect::<Vec<_>>())
			.build();
		let written = channel.pretty_write_to(Vec::new(), b' ', 2)?;
		Ok(String::from_utf8(written)?)
	}
}

fn item(record: &ModelDeprecationRecord, now: &str) -> Item {
	let pub_date = withdrawal_pub_date(&record.withdrawal_date).unwrap_or_else(|| now.to_string());
	ItemBuilder::default()
		.title(Some(record.name.clone()))
		.description(Some(describe(record)))
		.pub_date(Some(pub_date))
		.guid(Some(
			GuidBuilder::default()
				.value(guid(&record.name))
				.permalink(false)
				.build(),
		))
		.categories(vec![CategoryBuilder::default().name(CATEGORY).build()])
		.build()
}

fn describe(record: &ModelDeprecationRecord) -> String {
	[
		format!("<strong>Model:</strong> {}<br/>", record.name),
		format!("<strong>Availability Date:</strong> {}<br/>", record.availability_date),
		format!("<strong>Deprecation Date:</strong> {}<br/>", record.deprecation_date),
		format!("<strong>Withdrawal Date:</strong> {}<br/>", record.withdrawal_date),
		format!("<strong>Recommended Alternative:</strong> {}", record.recommended_alternative),
	]
	.join("\n")
}

/// Stable item id: a SHA-256 of the model name, so readers can dedupe across restarts.
#[must_use]
pub fn guid(name: &str) -> String {
	let digest = Sha256::digest(name.as_bytes());
	let hex = format!("{digest:x}");
	format!("{GUID_PREFIX}{}", &hex[..16])
}

/// Reads a `pubDate` out of a free-text withdrawal date such as "15 March 2024".
///
/// The month is the first full English month name found (case-sensitive), day
/// and year are the first and last whitespace tokens when they are numeric.
/// Missing parts fall back to `01` and the fixed year. Returns `None` when the
/// date is unset or has no tokens at all, in which case callers use the build time.
#[must_use]
pub fn withdrawal_pub_date(withdrawal_date: &str) -> Option<String> {
	if !is_set(withdrawal_date) {
		return None;
	}
	let month = MONTHS
		.iter()
		.find(|(name, _)| withdrawal_date.contains(*name))
		.map_or("01", |&(_, number)| number);
	let parts: Vec<&str> = withdrawal_date.split_whitespace().collect();
	let first = *parts.first()?;
	let last = *parts.last()?;
	let day = if is_numeric(first) { first } else { "01" };
	let year = if is_numeric(last) { last } else { FALLBACK_YEAR };
	Some(format!("{day} {month} {year} 00:00:00 GMT"))
}

fn is_numeric(token: &str) -> bool {
	!token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::record::PLACEHOLDER;
	use chrono::TimeZone;

	fn record(name: &str, withdrawal: &str) -> ModelDeprecationRecord {
		ModelDeprecationRecord {
			name: name.to_string(),
			availability_date: "21 December 2023".to_string(),
			deprecation_date: "6 January 2025".to_string(),
			withdrawal_date: withdrawal.to_string(),
			recommended_alternative: "granite-3-8b-instruct".to_string(),
		}
	}

	fn fixed_now() -> DateTime<Utc> {
		Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap()
	}

	fn parse(xml: &str) -> rss::Channel {
		rss::Channel::read_from(xml.as_bytes()).unwrap()
	}

	#[test]
	fn pub_date_from_withdrawal_date() {
		assert_eq!(
			withdrawal_pub_date("15 March 2024").as_deref(),
			Some("15 03 2024 00:00:00 GMT")
		);
		assert_eq!(
			withdrawal_pub_date("March 2024").as_deref(),
			Some("01 03 2024 00:00:00 GMT")
		);
		assert_eq!(
			withdrawal_pub_date("Not announced").as_deref(),
			Some("01 01 2025 00:00:00 GMT")
		);
		assert_eq!(
			withdrawal_pub_date("3 march 2026").as_deref(),
			Some("3 01 2026 00:00:00 GMT")
		);
	}

	#[test]
	fn unset_withdrawal_has_no_pub_date() {
		assert_eq!(withdrawal_pub_date(PLACEHOLDER), None);
		assert_eq!(withdrawal_pub_date(""), None);
		assert_eq!(withdrawal_pub_date("   "), None);
	}

	#[test]
	fn builds_channel_and_items() {
		let xml = FeedBuilder::default()
			.build_at(
				&[record("granite-13b-chat-v2", "15 March 2024"), record("llama-2-13b-chat", PLACEHOLDER)],
				fixed_now(),
			)
			.unwrap();
		assert!(xml.starts_with("<?xml"));
		assert!(xml.contains("\n  <channel>"));

		let channel = parse(&xml);
		assert_eq!(channel.title(), "IBM Watson Deprecated Foundation Models");
		assert_eq!(channel.link(), DEFAULT_SOURCE_URL);
		assert_eq!(channel.language(), Some("en-us"));
		assert_eq!(channel.last_build_date(), Some("Sat, 01 Jun 2024 12:30:00 GMT"));
		assert_eq!(channel.items().len(), 2);

		let first = &channel.items()[0];
		assert_eq!(first.title(), Some("granite-13b-chat-v2"));
		assert_eq!(first.pub_date(), Some("15 03 2024 00:00:00 GMT"));
		assert_eq!(first.categories()[0].name(), CATEGORY);
		assert_eq!(first.guid().map(|g| g.value()), Some(guid("granite-13b-chat-v2").as_str()));
		assert!(!first.guid().unwrap().is_permalink());
		let description = first.description().unwrap();
		assert!(description.starts_with("<strong>Model:</strong> granite-13b-chat-v2<br/>"));
		assert!(description.ends_with("<strong>Recommended Alternative:</strong> granite-3-8b-instruct"));

		let second = &channel.items()[1];
		assert_eq!(second.pub_date(), Some("Sat, 01 Jun 2024 12:30:00 GMT"));
	}

	#[test]
	fn same_input_and_clock_give_identical_documents() {
		let builder = FeedBuilder::default();
		let records = [record("a", "1 May 2025"), record("b", PLACEHOLDER)];
		let first = builder.build_at(&records, fixed_now()).unwrap();
		let second = builder.build_at(&records, fixed_now()).unwrap();
		assert_eq!(first, second);
	}

	#[test]
	fn guid_is_stable_and_distinct() {
		assert_eq!(guid("granite-13b-chat-v2"), guid("granite-13b-chat-v2"));
		assert_ne!(guid("granite-13b-chat-v2"), guid("granite-20b-code"));
		assert!(guid("x").starts_with(GUID_PREFIX));
		assert_eq!(guid("x").len(), GUID_PREFIX.len() + 16);
	}

	#[test]
	fn empty_batch_still_builds_a_channel() {
		let channel = parse(&FeedBuilder::default().build_at(&[], fixed_now()).unwrap());
		assert!(channel.items().is_empty());
	}
}
