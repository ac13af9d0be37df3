//! Thin layer over `html_parser` that gives the table extractor what it needs:
//! element lookup in document order and the visible text of a subtree.

use html_parser::{Dom, DomVariant, Element, Node};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
	#[error("could not parse HTML: {0}")]
	Parse(#[from] html_parser::Error),
	#[error("HTML document has no content")]
	Empty,
}

/// A parsed HTML page.
pub struct Document {
	dom: Dom,
}

impl Document {
	pub fn parse(html: &str) -> Result<Self, DocumentError> {
		let dom = Dom::parse(html)?;
		if matches!(dom.tree_type, DomVariant::Empty) || dom.children.is_empty() {
			return Err(DocumentError::Empty);
		}
		Ok(Self { dom })
	}

	/// Every `<table>` in the page, nested tables included, in document order.
	#[must_use]
	pub fn tables(&self) -> Vec<&Element> {
		find_all(&self.dom.children, &["table"])
	}
}

/// Pre-order search for elements whose tag is one of `names` (case-insensitive).
#[must_use]
pub fn find_all<'a>(nodes: &'a [Node], names: &[&str]) -> Vec<&'a Element> {
	let mut found = Vec::new();
	collect(nodes, names, &mut found);
	found
}

fn collect<'a>(nodes: &'a [Node], names: &[&str], found: &mut Vec<&'a Element>) {
	for node in nodes {
		if let Node::Element(element) = node {
			if names.iter().any(|name| element.name.eq_ignore_ascii_case(name)) {
				found.push(element);
			}
			collect(&element.children, names, found);
		}
	}
}

/// All text below `element`, entity-decoded and concatenated as-is.
#[must_use]
pub fn text(element: &Element) -> String {
	fragments(element).concat()
}

/// Like [`text`], but each fragment is trimmed before joining and blank ones are dropped.
#[must_use]
pub fn stripped_text(element: &Element) -> String {
	fragments(element)
		.iter()
		.map(|fragment| fragment.trim())
		.filter(|fragment| !fragment.is_empty())
		.collect()
}

fn fragments(element: &Element) -> Vec<String> {
	let mut out = Vec::new();
	push_fragments(&element.children, &mut out);
	out
}

fn push_fragments(nodes: &[Node], out: &mut Vec<String>) {
	for node in nodes {
		match node {
			Node::Text(text) => out.push(html_escape::decode_html_entities(text).into_owned()),
			Node::Element(element) => push_fragments(&element.children, out),
			Node::Comment(_) => {}
		}
	}
}
