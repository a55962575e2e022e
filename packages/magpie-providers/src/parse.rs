use std::collections::BTreeMap;

use color_eyre::{Result, eyre};
use lopdf::{Document, Object};

/// Page texts and raw document-info metadata from a parsed PDF.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
	pub page_count: u32,
	/// Extracted text per page, in page order.
	pub pages: Vec<String>,
	/// Raw info-dictionary entries, e.g. `Title`, `Author`, `CreationDate`.
	pub info: BTreeMap<String, String>,
}
impl ParsedDocument {
	/// Text of a 1-based page number; empty for out-of-range pages.
	pub fn page_text(&self, page: u32) -> &str {
		page.checked_sub(1)
			.and_then(|index| self.pages.get(index as usize))
			.map(String::as_str)
			.unwrap_or_default()
	}
}

pub fn parse(bytes: &[u8]) -> Result<ParsedDocument> {
	let doc =
		Document::load_mem(bytes).map_err(|err| eyre::eyre!("Failed to parse document: {err}."))?;
	let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();

	if page_numbers.is_empty() {
		return Err(eyre::eyre!("Document contains no pages."));
	}

	let mut pages = Vec::with_capacity(page_numbers.len());

	for number in page_numbers {
		// Pages that fail text extraction still count toward pagination.
		pages.push(doc.extract_text(&[number]).unwrap_or_default());
	}

	Ok(ParsedDocument { page_count: pages.len() as u32, pages, info: document_info(&doc) })
}

fn document_info(doc: &Document) -> BTreeMap<String, String> {
	let mut out = BTreeMap::new();
	let Ok(object) = doc.trailer.get(b"Info") else {
		return out;
	};
	let dict = match object {
		Object::Reference(id) => match doc.get_object(*id).and_then(|obj| obj.as_dict()) {
			Ok(dict) => dict,
			Err(_) => return out,
		},
		Object::Dictionary(dict) => dict,
		_ => return out,
	};

	for (key, value) in dict.iter() {
		let Ok(raw) = value.as_str() else {
			continue;
		};
		let text = String::from_utf8_lossy(raw).trim().to_string();

		if text.is_empty() {
			continue;
		}

		out.insert(String::from_utf8_lossy(key).to_string(), text);
	}

	out
}
