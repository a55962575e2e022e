//! Session orchestration: plan, search, filter, schedule, and fan document
//! processing out across the worker pool.

use std::sync::Arc;

use color_eyre::{Result, eyre};
use time::OffsetDateTime;
use tokio::{sync::Semaphore, task::JoinSet};
use uuid::Uuid;

use magpie_domain::status::{DocumentStatus, SessionStatus};
use magpie_providers::embedding;
use magpie_store::models::{NoteRecord, PaperRecord};

use crate::{
	Pipeline, document,
	extract::ExtractionContext,
	filter::{self, Candidate, ScoredCandidate},
	planner, schedule, search,
};

impl Pipeline {
	pub(crate) async fn run_session(
		&self,
		session_id: Uuid,
		max_documents: Option<u32>,
	) -> Result<()> {
		let session = self
			.store
			.fetch_session(session_id)
			.await?
			.ok_or_else(|| eyre::eyre!("Session {session_id} not found."))?;

		self.store.set_session_status(session_id, SessionStatus::Searching).await?;

		let topics = session.topics;
		let queries = session.queries;
		let direct_urls = session.direct_urls;
		// No topics plus user-supplied URLs means the user already knows the
		// documents; skip discovery and go straight to processing.
		let url_only = topics.is_empty() && !direct_urls.is_empty();

		if url_only {
			self.notify(
				session_id,
				"searching",
				&format!("Processing {} user-provided documents directly.", direct_urls.len()),
			)
			.await;
		} else {
			self.notify(session_id, "searching", "Searching for candidate documents.").await;
		}

		let llm = self.providers.llm.as_ref();
		let plan = planner::plan_terms(llm, &self.cfg.providers.llm, &topics, &queries).await;
		let question_set =
			planner::expand_questions(llm, &self.cfg.providers.llm, &topics, &queries).await;
		let intent =
			planner::intent_text(&topics, &queries, &plan, &question_set.explanation);
		let intent_embedding = self.intent_embedding(&intent).await;
		let accepted: Vec<ScoredCandidate> = if url_only {
			Vec::new()
		} else {
			let query_list = planner::build_queries(&plan, &topics, &queries);
			let outcome =
				search::run_queries(self.providers.search.as_ref(), &self.cfg.search, &query_list)
					.await;
			let mut metadata = outcome.metadata;
			let candidates: Vec<Candidate> = outcome
				.urls
				.into_iter()
				.filter(|url| !direct_urls.contains(url))
				.map(|url| {
					let hit = metadata.remove(&url);

					Candidate { url, hit }
				})
				.collect();

			filter::metadata_filter(
				self.providers.embedding.as_ref(),
				&self.cfg,
				candidates,
				&intent_embedding,
			)
			.await
		};
		let budget = max_documents.unwrap_or(self.cfg.processing.max_documents) as usize;
		let lanes = self.cfg.processing.worker_pool.max(1) as usize;
		let ordered = schedule::schedule(&direct_urls, accepted, budget, lanes);

		if ordered.is_empty() {
			self.store.set_session_status(session_id, SessionStatus::Completed).await?;
			self.notify(session_id, "completed", "No candidate documents found.").await;

			return Ok(());
		}

		let mut papers = Vec::with_capacity(ordered.len());
		let now = OffsetDateTime::now_utc();

		for url in ordered {
			let paper_id = Uuid::new_v4();

			self.store
				.insert_paper(PaperRecord {
					paper_id,
					session_id,
					url: url.clone(),
					status: DocumentStatus::Pending,
					title: String::new(),
					authors: Vec::new(),
					year: String::new(),
					summary: String::new(),
					reference: String::new(),
					page_count: 0,
					error_message: None,
					created_at: now,
					updated_at: now,
				})
				.await?;
			papers.push((paper_id, url));
		}

		self.store.set_session_status(session_id, SessionStatus::Processing).await?;
		self.notify(session_id, "processing", &format!("Processing {} documents.", papers.len()))
			.await;

		let ctx = Arc::new(ExtractionContext {
			search_terms: topics.iter().cloned().chain(plan.supplemental_terms()).collect(),
			// Extraction needs concrete questions; fall back to the expanded
			// set when the user gave topics only.
			queries: if queries.is_empty() { question_set.questions.clone() } else { queries },
			questions: question_set.questions,
			explanation: question_set.explanation,
			intent_embedding,
		});
		let semaphore = Arc::new(Semaphore::new(lanes));
		let mut tasks = JoinSet::new();

		for (paper_id, url) in papers {
			let pipeline = self.clone();
			let ctx = ctx.clone();
			let semaphore = semaphore.clone();

			tasks.spawn(async move {
				let Ok(_permit) = semaphore.acquire_owned().await else {
					return;
				};

				pipeline.process_paper(paper_id, &url, &ctx).await;
			});
		}
		while tasks.join_next().await.is_some() {}

		self.finish(session_id).await
	}

	async fn intent_embedding(&self, intent: &str) -> Vec<f32> {
		let text = vec![intent.to_string()];

		match self.providers.embedding.embed(&self.cfg.providers.embedding, &text).await {
			Ok(mut vectors) if !vectors.is_empty() => vectors.swap_remove(0),
			Ok(_) | Err(_) => {
				tracing::warn!("Intent embedding unavailable, relevance scores degrade to zero.");

				embedding::zero_vector(self.cfg.providers.embedding.dimensions)
			},
		}
	}

	/// One document worker. Failures settle the paper as errored; they never
	/// propagate into the session task.
	async fn process_paper(&self, paper_id: Uuid, url: &str, ctx: &ExtractionContext) {
		let mut paper = match self.store.fetch_paper(paper_id).await {
			Ok(Some(paper)) => paper,
			Ok(None) => {
				tracing::error!(paper = %paper_id, "Paper disappeared before processing.");

				return;
			},
			Err(err) => {
				tracing::error!(paper = %paper_id, error = %err, "Failed to load paper.");

				return;
			},
		};

		let session_id = paper.session_id;

		paper.status = DocumentStatus::Processing;

		if let Err(err) = self.store.update_paper(paper.clone()).await {
			tracing::error!(paper = %paper_id, error = %err, "Failed to mark paper processing.");

			return;
		}

		match document::process(&self.cfg, &self.providers, url, ctx).await {
			Ok(outcome) => {
				paper.status = outcome.status;
				paper.title = outcome.title;
				paper.authors = outcome.authors;
				paper.year = outcome.year;
				paper.summary = outcome.summary;
				paper.reference = outcome.reference;
				paper.page_count = outcome.page_count;
				paper.error_message = outcome.error_message;

				if let Err(err) = self.store.update_paper(paper).await {
					tracing::error!(paper = %paper_id, error = %err, "Failed to settle paper.");

					return;
				}

				let now = OffsetDateTime::now_utc();
				let notes: Vec<NoteRecord> = outcome
					.notes
					.into_iter()
					.map(|note| NoteRecord {
						note_id: Uuid::new_v4(),
						paper_id,
						content: note.content,
						page_number: note.page_number,
						category: note.category,
						matched_query: note.matched_query,
						justification: note.justification,
						inline_citations: note.inline_citations,
						reference_map: note.reference_map,
						relevance_score: note.relevance_score,
						accepted: note.accepted,
						created_at: now,
					})
					.collect();

				let accepted = notes.iter().filter(|note| note.accepted).count();

				if !notes.is_empty()
					&& let Err(err) = self.store.insert_notes(notes).await
				{
					tracing::error!(paper = %paper_id, error = %err, "Failed to persist notes.");
				}

				self.notify(
					session_id,
					"processing",
					&format!("Processed document {url} with {accepted} notes."),
				)
				.await;
			},
			Err(err) => {
				tracing::warn!(paper = %paper_id, url, error = %err, "Document failed.");

				paper.status = DocumentStatus::Error;
				paper.error_message = Some(err.to_string());

				if let Err(err) = self.store.update_paper(paper).await {
					tracing::error!(paper = %paper_id, error = %err, "Failed to settle paper.");
				}

				self.notify(session_id, "processing", &format!("Document {url} failed.")).await;
			},
		}
	}

	/// Recounts paper states from the store before declaring the session
	/// complete; worker tasks are not trusted to report their own totals.
	async fn finish(&self, session_id: Uuid) -> Result<()> {
		let papers = self.store.session_papers(session_id).await?;
		let total = papers.len();
		let settled = papers.iter().filter(|paper| paper.status.is_terminal()).count();

		if settled < total {
			tracing::warn!(
				session = %session_id,
				settled,
				total,
				"Session left with unsettled papers."
			);

			return Ok(());
		}

		self.store.set_session_status(session_id, SessionStatus::Completed).await?;

		let mut total_notes = 0_usize;
		let mut papers_with_notes = 0_usize;

		for paper in &papers {
			let accepted =
				self.store.paper_notes(paper.paper_id).await?.iter().filter(|n| n.accepted).count();

			total_notes += accepted;

			if accepted > 0 {
				papers_with_notes += 1;
			}
		}

		self.notify(
			session_id,
			"completed",
			&format!(
				"Research completed. Found {total_notes} notes from {papers_with_notes} papers."
			),
		)
		.await;

		Ok(())
	}

	async fn notify(&self, session_id: Uuid, stage: &str, message: &str) {
		self.providers.notifier.session_status(session_id, stage, message).await;
	}
}
