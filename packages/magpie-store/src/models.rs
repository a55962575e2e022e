use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use magpie_domain::{
	note::NoteCategory,
	status::{DocumentStatus, SessionStatus},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
	pub session_id: Uuid,
	pub status: SessionStatus,
	pub topics: Vec<String>,
	pub queries: Vec<String>,
	pub direct_urls: Vec<String>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperRecord {
	pub paper_id: Uuid,
	pub session_id: Uuid,
	pub url: String,
	pub status: DocumentStatus,
	pub title: String,
	pub authors: Vec<String>,
	pub year: String,
	pub summary: String,
	pub reference: String,
	pub page_count: u32,
	pub error_message: Option<String>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRecord {
	pub note_id: Uuid,
	pub paper_id: Uuid,
	pub content: String,
	pub page_number: u32,
	pub category: NoteCategory,
	pub matched_query: String,
	pub justification: String,
	pub inline_citations: Vec<String>,
	pub reference_map: BTreeMap<String, String>,
	/// Final-validation similarity, clamped to `[0, 1]`. Absent when the
	/// validator degraded and accepted the note without scoring it.
	pub relevance_score: Option<f32>,
	pub accepted: bool,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}
