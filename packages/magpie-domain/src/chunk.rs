/// An inclusive run of 1-based page numbers extracted together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChunk {
	pub start: u32,
	pub end: u32,
}
impl PageChunk {
	pub fn pages(&self) -> impl Iterator<Item = u32> {
		self.start..=self.end
	}

	pub fn span(&self) -> u32 {
		self.end - self.start + 1
	}
}

/// Groups relevant page numbers into extraction chunks. Pages within two of
/// the chunk tail merge; a chunk never spans more than three pages.
pub fn chunk_pages(pages: &[u32]) -> Vec<PageChunk> {
	let mut sorted = pages.to_vec();

	sorted.sort_unstable();
	sorted.dedup();

	let Some((&first, rest)) = sorted.split_first() else {
		return Vec::new();
	};
	let mut chunks = Vec::new();
	let mut start = first;
	let mut end = first;

	for &page in rest {
		let gap = page - end;
		let span = page - start + 1;

		if gap <= 2 && span <= 3 {
			end = page;
		} else {
			chunks.push(PageChunk { start, end });
			start = page;
			end = page;
		}
	}

	chunks.push(PageChunk { start, end });

	chunks
}
