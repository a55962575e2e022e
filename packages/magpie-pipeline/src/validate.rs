//! Final note validation against the user's research intent.

use magpie_domain::similarity;

use crate::{EmbeddingProvider, extract::ExtractedNote};

/// Scores every note against the intent text and marks those below the
/// threshold as rejected. Notes are never dropped here; rejected ones are
/// persisted with their score for audit.
///
/// When embedding degrades, all notes stay accepted without a score: a dead
/// scorer must not erase extraction work.
pub async fn validate_notes(
	embedding: &dyn EmbeddingProvider,
	cfg: &magpie_config::Config,
	notes: &mut [ExtractedNote],
	questions: &[String],
	explanation: &str,
) {
	if notes.is_empty() || explanation.is_empty() {
		return;
	}

	let intent = intent_text(questions, explanation);
	let mut texts = vec![intent];

	texts.extend(notes.iter().map(|note| note.content.clone()));

	let vectors = match embedding.embed(&cfg.providers.embedding, &texts).await {
		Ok(vectors) if vectors.len() == texts.len() => vectors,
		Ok(_) | Err(_) => {
			tracing::warn!("Note validation degraded, accepting all notes unscored.");

			return;
		},
	};
	let (intent_vector, note_vectors) = vectors.split_at(1);
	let mut rejected = 0;

	for (note, vector) in notes.iter_mut().zip(note_vectors) {
		let score = similarity::clamp_score(similarity::cosine(&intent_vector[0], vector));

		note.relevance_score = Some(score);
		note.accepted = score >= cfg.funnel.validation_threshold;

		if !note.accepted {
			rejected += 1;
		}
	}

	tracing::debug!(total = notes.len(), rejected, "Note validation complete.");
}

fn intent_text(questions: &[String], explanation: &str) -> String {
	format!("{} / {explanation}", questions.join(" "))
}
