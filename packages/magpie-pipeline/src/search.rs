//! Sequential candidate search across the planned queries, with rate-limit
//! pacing, deduplication, and an overall result cap.

use std::{collections::HashMap, time::Duration};

use magpie_providers::search::SearchHit;

use crate::SearchProvider;

#[derive(Debug, Default)]
pub struct SearchOutcome {
	/// Unique candidate URLs in discovery order.
	pub urls: Vec<String>,
	/// Feed metadata keyed by candidate URL; absent for entries the feed
	/// omitted.
	pub metadata: HashMap<String, SearchHit>,
}

pub async fn run_queries(
	search: &dyn SearchProvider,
	cfg: &magpie_config::Search,
	queries: &[String],
) -> SearchOutcome {
	let mut outcome = SearchOutcome::default();

	if queries.is_empty() {
		return outcome;
	}

	let max_results = cfg.max_results as usize;
	// Each query gets a fair share, padded by one to absorb duplicates.
	let per_query = cfg.page_size_cap.min(cfg.max_results / queries.len() as u32 + 1);

	for (index, query) in queries.iter().enumerate() {
		if outcome.urls.len() >= max_results {
			break;
		}
		if index > 0 {
			tokio::time::sleep(Duration::from_millis(cfg.query_delay_ms)).await;
		}

		match search.query(cfg, query, per_query).await {
			Ok(hits) => {
				tracing::debug!(query, hits = hits.len(), "Search query returned.");

				for hit in hits {
					if outcome.metadata.contains_key(&hit.url) {
						continue;
					}

					outcome.urls.push(hit.url.clone());
					outcome.metadata.insert(hit.url.clone(), hit);

					if outcome.urls.len() >= max_results {
						break;
					}
				}
			},
			// One failed query never sinks the search pass.
			Err(err) => tracing::warn!(query, error = %err, "Search query failed."),
		}
	}

	outcome
}
