use std::collections::HashMap;

use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
	BoxFuture, Error, Result, Store,
	models::{NoteRecord, PaperRecord, SessionRecord},
};
use magpie_domain::status::SessionStatus;

#[derive(Debug, Default)]
struct Inner {
	sessions: HashMap<Uuid, SessionRecord>,
	papers: HashMap<Uuid, PaperRecord>,
	notes: HashMap<Uuid, Vec<NoteRecord>>,
}

/// Process-local [`Store`] backed by hash maps behind a single mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
	inner: Mutex<Inner>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}
impl Store for MemoryStore {
	fn upsert_session<'a>(&'a self, record: SessionRecord) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut inner = self.inner.lock().await;

			match inner.sessions.get_mut(&record.session_id) {
				Some(existing) => {
					existing.topics = record.topics;
					existing.queries = record.queries;
					existing.direct_urls = record.direct_urls;
					existing.updated_at = OffsetDateTime::now_utc();
				},
				None => {
					inner.sessions.insert(record.session_id, record);
				},
			}

			Ok(())
		})
	}

	fn fetch_session<'a>(
		&'a self,
		session_id: Uuid,
	) -> BoxFuture<'a, Result<Option<SessionRecord>>> {
		Box::pin(async move { Ok(self.inner.lock().await.sessions.get(&session_id).cloned()) })
	}

	fn set_session_status<'a>(
		&'a self,
		session_id: Uuid,
		status: SessionStatus,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut inner = self.inner.lock().await;
			let session = inner
				.sessions
				.get_mut(&session_id)
				.ok_or_else(|| Error::NotFound(format!("session {session_id}")))?;

			if !session.status.can_advance_to(status) {
				return Err(Error::Conflict(format!(
					"session {session_id} cannot move from {:?} to {status:?}",
					session.status
				)));
			}

			session.status = status;
			session.updated_at = OffsetDateTime::now_utc();

			Ok(())
		})
	}

	fn insert_paper<'a>(&'a self, record: PaperRecord) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut inner = self.inner.lock().await;

			if !inner.sessions.contains_key(&record.session_id) {
				return Err(Error::NotFound(format!("session {}", record.session_id)));
			}

			inner.papers.insert(record.paper_id, record);

			Ok(())
		})
	}

	fn fetch_paper<'a>(&'a self, paper_id: Uuid) -> BoxFuture<'a, Result<Option<PaperRecord>>> {
		Box::pin(async move { Ok(self.inner.lock().await.papers.get(&paper_id).cloned()) })
	}

	fn update_paper<'a>(&'a self, record: PaperRecord) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut inner = self.inner.lock().await;
			let existing = inner
				.papers
				.get_mut(&record.paper_id)
				.ok_or_else(|| Error::NotFound(format!("paper {}", record.paper_id)))?;

			// A paper settles exactly once.
			if existing.status.is_terminal() && existing.status != record.status {
				return Err(Error::Conflict(format!(
					"paper {} already settled as {:?}",
					record.paper_id, existing.status
				)));
			}

			let created_at = existing.created_at;
			*existing = record;
			existing.created_at = created_at;
			existing.updated_at = OffsetDateTime::now_utc();

			Ok(())
		})
	}

	fn session_papers<'a>(&'a self, session_id: Uuid) -> BoxFuture<'a, Result<Vec<PaperRecord>>> {
		Box::pin(async move {
			let inner = self.inner.lock().await;
			let mut papers: Vec<_> = inner
				.papers
				.values()
				.filter(|paper| paper.session_id == session_id)
				.cloned()
				.collect();

			papers.sort_by_key(|paper| paper.created_at);

			Ok(papers)
		})
	}

	fn insert_notes<'a>(&'a self, records: Vec<NoteRecord>) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut inner = self.inner.lock().await;

			for record in records {
				if !inner.papers.contains_key(&record.paper_id) {
					return Err(Error::NotFound(format!("paper {}", record.paper_id)));
				}

				inner.notes.entry(record.paper_id).or_default().push(record);
			}

			Ok(())
		})
	}

	fn paper_notes<'a>(&'a self, paper_id: Uuid) -> BoxFuture<'a, Result<Vec<NoteRecord>>> {
		Box::pin(async move {
			Ok(self.inner.lock().await.notes.get(&paper_id).cloned().unwrap_or_default())
		})
	}
}
