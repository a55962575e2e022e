//! Processing-order assembly: ranked candidates behind the user's direct
//! URLs, capped to the document budget, then interleaved across worker lanes
//! so neighbouring ranks land on different workers.

use std::cmp::Ordering;

use magpie_domain::interleave;

use crate::filter::ScoredCandidate;

pub fn schedule(
	direct_urls: &[String],
	mut candidates: Vec<ScoredCandidate>,
	budget: usize,
	lanes: usize,
) -> Vec<String> {
	// Stable sort keeps discovery order among equal or unscored candidates.
	candidates.sort_by(|a, b| {
		b.score
			.unwrap_or(0.0)
			.partial_cmp(&a.score.unwrap_or(0.0))
			.unwrap_or(Ordering::Equal)
	});

	let mut ordered: Vec<String> = Vec::new();

	for url in direct_urls {
		if !url.trim().is_empty() && !ordered.contains(url) {
			ordered.push(url.clone());
		}
	}
	for candidate in candidates {
		if ordered.len() >= budget {
			break;
		}
		if !ordered.contains(&candidate.url) {
			ordered.push(candidate.url);
		}
	}

	ordered.truncate(budget);

	interleave::interleave(ordered, lanes)
}
