//! Query planning: turns user topics and questions into field-qualified
//! search queries and an expanded question set for relevance scoring.

use std::collections::HashSet;

use serde_json::Value;

use crate::LlmProvider;

const PLAN_SYSTEM_PROMPT: &str = "You are an academic search expert generating search terms for a \
scholarly preprint archive. Position the core domain keywords at the BEGINNING of every phrase: \
the archive weighs leading terms highest, so domain-first phrasing keeps results on topic. Keep \
the user's exact terminology, limit each phrase to 5-6 words, and include at least one keyword \
from the original topics or questions in every phrase. Return a JSON object with keys \
exact_phrases (2-3 phrases), title_terms (2-3 terms), abstract_terms (2-3 single-concept \
keywords), and general_terms (1-2 terms).";

const QUESTION_SYSTEM_PROMPT: &str = "You are a research assistant. Generate 3-5 specific \
research questions based on the user's topics and queries, plus a concise explanation (30 words \
max) of what the user wants to learn. Return a JSON object with keys questions and explanation.";

#[derive(Debug, Clone, Default)]
pub struct QueryPlan {
	pub exact_phrases: Vec<String>,
	pub title_terms: Vec<String>,
	pub abstract_terms: Vec<String>,
	pub general_terms: Vec<String>,
}
impl QueryPlan {
	/// Terms fed to extraction as additional context alongside the topics.
	pub fn supplemental_terms(&self) -> Vec<String> {
		self.title_terms.iter().chain(&self.abstract_terms).cloned().collect()
	}
}

#[derive(Debug, Clone, Default)]
pub struct QuestionSet {
	/// Original user queries followed by the generated questions.
	pub questions: Vec<String>,
	pub explanation: String,
}

pub async fn plan_terms(
	llm: &dyn LlmProvider,
	cfg: &magpie_config::LlmProviderConfig,
	topics: &[String],
	queries: &[String],
) -> QueryPlan {
	if topics.is_empty() && queries.is_empty() {
		return QueryPlan::default();
	}

	let prompt = format!(
		"RESEARCH TOPICS: {}\n\nSPECIFIC RESEARCH QUESTIONS:\n{}\n\nGenerate optimized search \
		 terms for finding academic papers on these subjects. Every term must contain at least \
		 one keyword from the original topics or questions, with the main domain keywords first.",
		topics.join(", "),
		queries.iter().map(|q| format!("- {q}")).collect::<Vec<_>>().join("\n"),
	);
	let schema = serde_json::json!({
		"type": "object",
		"properties": {
			"exact_phrases": { "type": "array", "items": { "type": "string" } },
			"title_terms": { "type": "array", "items": { "type": "string" } },
			"abstract_terms": { "type": "array", "items": { "type": "string" } },
			"general_terms": { "type": "array", "items": { "type": "string" } }
		}
	});

	match llm.structured(cfg, Some(PLAN_SYSTEM_PROMPT), &prompt, &schema).await {
		Ok(value) => validate_terms(parse_plan(&value), topics, queries),
		Err(err) => {
			tracing::warn!(error = %err, "Query planning failed, using fallback terms.");

			fallback_plan(topics, queries)
		},
	}
}

/// Expands the user's input into concrete research questions plus a short
/// intent explanation used for final note validation.
pub async fn expand_questions(
	llm: &dyn LlmProvider,
	cfg: &magpie_config::LlmProviderConfig,
	topics: &[String],
	queries: &[String],
) -> QuestionSet {
	if topics.is_empty() && queries.is_empty() {
		return QuestionSet::default();
	}

	let prompt = format!(
		"Research Topics: {}\nUser Questions: {}\n\nGenerate 3-5 research questions that would \
		 help find relevant academic papers about these topics. Also explain in 30 words what \
		 the user is looking for.",
		topics.join(", "),
		if queries.is_empty() { "None provided".to_string() } else { queries.join(", ") },
	);
	let schema = serde_json::json!({
		"type": "object",
		"properties": {
			"questions": {
				"type": "array",
				"items": { "type": "string" },
				"minItems": 3,
				"maxItems": 5
			},
			"explanation": { "type": "string", "minLength": 20, "maxLength": 60 }
		},
		"required": ["questions", "explanation"]
	});

	if let Ok(value) = llm.structured(cfg, Some(QUESTION_SYSTEM_PROMPT), &prompt, &schema).await {
		let generated: Vec<String> = string_array(&value, "questions")
			.into_iter()
			// Schema keys echoed back as content are a known failure mode.
			.filter(|q| q.len() > 10 && q != "questions" && q != "explanation")
			.collect();
		let explanation =
			value.get("explanation").and_then(Value::as_str).unwrap_or_default().to_string();

		if !generated.is_empty() && explanation.len() > 10 {
			let mut questions = queries.to_vec();

			questions.extend(generated);

			return QuestionSet { questions, explanation };
		}
	}

	tracing::warn!("Question expansion failed, using original inputs.");

	QuestionSet {
		questions: if queries.is_empty() { topics.to_vec() } else { queries.to_vec() },
		explanation: fallback_explanation(topics, queries),
	}
}

/// Composes the text embedded as the research intent: topics, user
/// questions, the planner's supplemental terms, and the expanded-intent
/// explanation, in that order.
pub fn intent_text(
	topics: &[String],
	queries: &[String],
	plan: &QueryPlan,
	explanation: &str,
) -> String {
	let mut parts: Vec<String> = Vec::new();

	parts.extend(topics.iter().cloned());
	parts.extend(queries.iter().cloned());
	parts.extend(plan.supplemental_terms());

	if !explanation.trim().is_empty() {
		parts.push(explanation.trim().to_string());
	}

	parts.join(" ")
}

/// Builds the ordered query list, most specific first, ending with the
/// original topics and questions as exact all-field searches.
pub fn build_queries(plan: &QueryPlan, topics: &[String], queries: &[String]) -> Vec<String> {
	let mut out = Vec::new();

	for phrase in trimmed(&plan.exact_phrases) {
		out.push(format!("all:\"{phrase}\""));
	}
	for term in trimmed(&plan.title_terms) {
		if term.contains(' ') {
			out.push(format!("ti:\"{term}\""));
		} else {
			out.push(format!("ti:{term}"));
		}
	}

	let abstract_terms = trimmed(&plan.abstract_terms);

	if !abstract_terms.is_empty() {
		let joined =
			abstract_terms.iter().map(|t| format!("abs:{t}")).collect::<Vec<_>>().join(" AND ");

		out.push(format!("({joined})"));
	}

	let general_terms = trimmed(&plan.general_terms);

	if !general_terms.is_empty() {
		let joined =
			general_terms.iter().map(|t| format!("all:{t}")).collect::<Vec<_>>().join(" OR ");

		out.push(format!("({joined})"));
	}

	// The user's own words always run as queries of their own.
	for topic in topics.iter().filter(|t| !t.trim().is_empty()) {
		out.push(format!("all:\"{topic}\""));
	}
	for query in queries.iter().filter(|q| !q.trim().is_empty()) {
		out.push(format!("all:\"{query}\""));
	}

	out
}

fn trimmed(terms: &[String]) -> Vec<&str> {
	terms.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).collect()
}

fn parse_plan(value: &Value) -> QueryPlan {
	QueryPlan {
		exact_phrases: string_array(value, "exact_phrases"),
		title_terms: string_array(value, "title_terms"),
		abstract_terms: string_array(value, "abstract_terms"),
		general_terms: string_array(value, "general_terms"),
	}
}

fn string_array(value: &Value, key: &str) -> Vec<String> {
	value
		.get(key)
		.and_then(Value::as_array)
		.map(|items| {
			items.iter().filter_map(Value::as_str).map(str::to_string).collect::<Vec<_>>()
		})
		.unwrap_or_default()
}

fn keyword_set(topics: &[String], queries: &[String]) -> HashSet<String> {
	topics
		.iter()
		.chain(queries)
		.flat_map(|text| text.split_whitespace())
		.filter(|word| word.len() > 3)
		.map(str::to_lowercase)
		.collect()
}

/// Drops generated terms that share no keyword with the user's input, then
/// backfills any bucket the filter emptied from the input itself.
fn validate_terms(plan: QueryPlan, topics: &[String], queries: &[String]) -> QueryPlan {
	let keywords = keyword_set(topics, queries);
	let keep = |term: &String| {
		keywords.is_empty()
			|| term.split_whitespace().any(|word| keywords.contains(&word.to_lowercase()))
	};
	let mut exact_phrases: Vec<String> = plan.exact_phrases.into_iter().filter(keep).collect();
	let mut title_terms: Vec<String> = plan.title_terms.into_iter().filter(keep).collect();
	let mut abstract_terms: Vec<String> = plan.abstract_terms.into_iter().filter(keep).collect();
	let mut general_terms: Vec<String> = plan.general_terms.into_iter().filter(keep).collect();

	if exact_phrases.is_empty() {
		exact_phrases = queries.iter().filter(|q| q.contains(' ')).cloned().collect();
	}
	if title_terms.is_empty() {
		title_terms = topics.iter().filter(|t| t.contains(' ')).cloned().collect();
	}
	if abstract_terms.is_empty() {
		abstract_terms = queries.iter().filter(|q| !exact_phrases.contains(q)).cloned().collect();
	}
	if general_terms.is_empty() {
		general_terms = topics.iter().chain(queries).cloned().collect();
	}

	QueryPlan { exact_phrases, title_terms, abstract_terms, general_terms }
}

fn fallback_plan(topics: &[String], queries: &[String]) -> QueryPlan {
	QueryPlan {
		exact_phrases: queries.iter().filter(|q| q.contains(' ')).cloned().collect(),
		title_terms: topics.iter().filter(|t| t.contains(' ')).cloned().collect(),
		abstract_terms: queries.to_vec(),
		general_terms: topics.iter().chain(queries).cloned().collect(),
	}
}

fn fallback_explanation(topics: &[String], queries: &[String]) -> String {
	let mut explanation = format!("Research about {}", topics.join(", "));

	if !queries.is_empty() {
		explanation.push_str(&format!(" focusing on {}", queries.join(", ")));
	}

	explanation
}
