//! Metadata relevance filter: scores candidates by embedding similarity of
//! their title and abstract against the research intent, before any document
//! is downloaded.

use magpie_domain::similarity;
use magpie_providers::search::SearchHit;

use crate::EmbeddingProvider;

#[derive(Debug, Clone)]
pub struct Candidate {
	pub url: String,
	pub hit: Option<SearchHit>,
}

#[derive(Debug, Clone)]
pub struct ScoredCandidate {
	pub url: String,
	/// Absent when the candidate had no metadata or scoring degraded.
	pub score: Option<f32>,
}

/// Keeps candidates whose metadata clears the similarity threshold.
///
/// Candidates without metadata pass unscored. A failed embedding batch also
/// passes whole: a degraded filter must widen the funnel, not empty it.
pub async fn metadata_filter(
	embedding: &dyn EmbeddingProvider,
	cfg: &magpie_config::Config,
	candidates: Vec<Candidate>,
	intent_embedding: &[f32],
) -> Vec<ScoredCandidate> {
	let mut accepted = Vec::new();
	let mut scored = Vec::new();

	for candidate in candidates {
		match candidate.hit {
			Some(hit) => scored.push((candidate.url, hit)),
			None => accepted.push(ScoredCandidate { url: candidate.url, score: None }),
		}
	}

	let total = scored.len();
	let batch_size = (cfg.funnel.embed_batch_size as usize).max(1);

	for batch in scored.chunks(batch_size) {
		let texts: Vec<String> = batch
			.iter()
			.map(|(_, hit)| format!("{}. {}", hit.title, hit.abstract_text))
			.collect();

		match embedding.embed(&cfg.providers.embedding, &texts).await {
			Ok(vectors) => {
				for ((url, _), vector) in batch.iter().zip(vectors) {
					let score = similarity::clamp_score(similarity::cosine(
						&vector,
						intent_embedding,
					));

					if score >= cfg.funnel.metadata_threshold {
						accepted.push(ScoredCandidate { url: url.clone(), score: Some(score) });
					} else {
						tracing::debug!(url, score, "Candidate filtered out by metadata.");
					}
				}
			},
			Err(err) => {
				tracing::warn!(error = %err, "Metadata scoring failed, passing batch through.");

				accepted.extend(
					batch.iter().map(|(url, _)| ScoredCandidate { url: url.clone(), score: None }),
				);
			},
		}
	}

	tracing::info!(total, accepted = accepted.len(), "Metadata filter complete.");

	accepted
}
