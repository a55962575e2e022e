/// Cosine similarity. Returns 0.0 for empty, mismatched, or zero-norm inputs
/// so a degraded embedding never passes a relevance gate by accident.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
	if a.is_empty() || a.len() != b.len() {
		return 0.0;
	}

	let mut dot = 0.0_f32;
	let mut norm_a = 0.0_f32;
	let mut norm_b = 0.0_f32;

	for (x, y) in a.iter().zip(b.iter()) {
		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Clamps a raw similarity into the `[0, 1]` range surfaced as a score.
pub fn clamp_score(value: f32) -> f32 {
	if !value.is_finite() {
		return 0.0;
	}

	value.clamp(0.0, 1.0)
}
