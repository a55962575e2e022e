mod error;
pub mod memory;
pub mod models;

pub use error::{Error, Result};
pub use memory::MemoryStore;

use std::{future::Future, pin::Pin};

use uuid::Uuid;

use magpie_domain::status::SessionStatus;
use models::{NoteRecord, PaperRecord, SessionRecord};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistence seam for sessions, papers, and notes.
///
/// Implementations must keep session transitions monotonic, let papers become
/// terminal exactly once, and reject notes for unknown papers.
pub trait Store
where
	Self: Send + Sync,
{
	/// Idempotent by id: resubmitting an existing session updates its inputs
	/// in place instead of spawning a sibling record.
	fn upsert_session<'a>(&'a self, record: SessionRecord) -> BoxFuture<'a, Result<()>>;

	fn fetch_session<'a>(&'a self, session_id: Uuid)
	-> BoxFuture<'a, Result<Option<SessionRecord>>>;

	fn set_session_status<'a>(
		&'a self,
		session_id: Uuid,
		status: SessionStatus,
	) -> BoxFuture<'a, Result<()>>;

	fn insert_paper<'a>(&'a self, record: PaperRecord) -> BoxFuture<'a, Result<()>>;

	fn fetch_paper<'a>(&'a self, paper_id: Uuid) -> BoxFuture<'a, Result<Option<PaperRecord>>>;

	fn update_paper<'a>(&'a self, record: PaperRecord) -> BoxFuture<'a, Result<()>>;

	fn session_papers<'a>(&'a self, session_id: Uuid) -> BoxFuture<'a, Result<Vec<PaperRecord>>>;

	fn insert_notes<'a>(&'a self, records: Vec<NoteRecord>) -> BoxFuture<'a, Result<()>>;

	fn paper_notes<'a>(&'a self, paper_id: Uuid) -> BoxFuture<'a, Result<Vec<NoteRecord>>>;
}
