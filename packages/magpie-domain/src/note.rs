use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteCategory {
	Quote,
	Statistic,
	Methodology,
}

const STATISTIC_MARKERS: [&str; 8] = [
	"%",
	"percent",
	"survey",
	"study found",
	"data shows",
	"according to",
	"results indicate",
	"analysis revealed",
];

const METHODOLOGY_MARKERS: [&str; 13] = [
	"method",
	"approach",
	"technique",
	"procedure",
	"process",
	"framework",
	"implementation",
	"algorithm",
	"steps",
	"experiment",
	"model",
	"design",
	"protocol",
];

/// Classifies extracted content by keyword heuristics. Statistics are checked
/// before methodology; everything else is a quote.
pub fn categorize(content: &str, topic: &str) -> NoteCategory {
	let content = content.to_lowercase();
	let topic = topic.to_lowercase();

	if STATISTIC_MARKERS.iter().any(|marker| content.contains(marker)) {
		return NoteCategory::Statistic;
	}
	if METHODOLOGY_MARKERS.iter().any(|marker| content.contains(marker) || topic.contains(marker)) {
		return NoteCategory::Methodology;
	}

	NoteCategory::Quote
}
