use std::time::Duration;

use color_eyre::{Result, eyre};
use quick_xml::{Reader, events::Event};
use regex::Regex;
use reqwest::{Client, header::USER_AGENT};

/// One entry from the bibliographic Atom feed.
#[derive(Debug, Clone)]
pub struct SearchHit {
	pub id: String,
	pub url: String,
	pub title: String,
	pub abstract_text: String,
	pub authors: Vec<String>,
	pub published: String,
}

/// Runs a single field-qualified query against the Atom search API.
pub async fn query(
	cfg: &magpie_config::Search,
	query: &str,
	max_results: u32,
) -> Result<Vec<SearchHit>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let agent = cfg.user_agent.as_deref().unwrap_or(crate::USER_AGENT_VALUE);
	let body = client
		.get(&cfg.api_base)
		.header(USER_AGENT, agent)
		.query(&[
			("search_query", query),
			("start", "0"),
			("max_results", &max_results.to_string()),
			("sortBy", "relevance"),
			("sortOrder", "descending"),
		])
		.send()
		.await?
		.error_for_status()?
		.text()
		.await?;

	parse_feed(&body)
}

/// Extracts the short document id from an abstract or PDF URL.
pub fn canonical_id(url: &str) -> Option<String> {
	let start = ["/abs/", "/pdf/"]
		.iter()
		.find_map(|marker| url.find(marker).map(|index| index + marker.len()))?;
	let id = url[start..].trim_end_matches(".pdf").trim_matches('/');

	if id.is_empty() { None } else { Some(id.to_string()) }
}

/// Rewrites abstract-page links to their direct PDF form.
pub fn normalize_url(url: &str) -> String {
	if url.contains("arxiv.org") && url.contains("/abs/") {
		url.replace("/abs/", "/pdf/")
	} else {
		url.to_string()
	}
}

pub fn pdf_url(id: &str) -> String {
	format!("https://arxiv.org/pdf/{id}")
}

/// Collapses whitespace and drops LaTeX-style commands from abstract text.
pub fn clean_abstract(text: &str) -> String {
	let stripped = match Regex::new(r"\\[a-zA-Z]+(\{.*?\})?") {
		Ok(re) => re.replace_all(text, "").to_string(),
		Err(_) => text.to_string(),
	};

	stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Default)]
struct EntryBuilder {
	id: String,
	title: String,
	summary: String,
	authors: Vec<String>,
	published: String,
}
impl EntryBuilder {
	fn finish(self) -> Option<SearchHit> {
		let id = canonical_id(&self.id)?;

		Some(SearchHit {
			url: pdf_url(&id),
			id,
			title: self.title.split_whitespace().collect::<Vec<_>>().join(" "),
			abstract_text: clean_abstract(&self.summary),
			authors: self.authors,
			published: self.published.trim().to_string(),
		})
	}
}

fn parse_feed(xml: &str) -> Result<Vec<SearchHit>> {
	let mut reader = Reader::from_str(xml);

	reader.config_mut().trim_text(true);

	let mut hits = Vec::new();
	let mut entry: Option<EntryBuilder> = None;
	let mut path: Vec<String> = Vec::new();

	loop {
		match reader.read_event() {
			Ok(Event::Start(element)) => {
				let name = String::from_utf8_lossy(element.local_name().as_ref()).to_string();

				if name == "entry" {
					entry = Some(EntryBuilder::default());
				}

				path.push(name);
			},
			Ok(Event::Text(text)) => {
				let Some(builder) = entry.as_mut() else {
					continue;
				};
				let Ok(value) = text.unescape() else {
					continue;
				};

				match path.last().map(String::as_str) {
					Some("id") => builder.id.push_str(&value),
					Some("title") => builder.title.push_str(&value),
					Some("summary") => builder.summary.push_str(&value),
					Some("published") => builder.published.push_str(&value),
					Some("name") if path.iter().any(|tag| tag == "author") => {
						builder.authors.push(value.trim().to_string());
					},
					_ => {},
				}
			},
			Ok(Event::End(element)) => {
				let name = String::from_utf8_lossy(element.local_name().as_ref()).to_string();

				path.pop();

				if name == "entry"
					&& let Some(builder) = entry.take()
					&& let Some(hit) = builder.finish()
				{
					hits.push(hit);
				}
			},
			Ok(Event::Eof) => break,
			Err(err) => return Err(eyre::eyre!("Failed to parse search feed: {err}.")),
			_ => {},
		}
	}

	Ok(hits)
}
