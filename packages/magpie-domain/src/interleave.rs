/// Reorders a ranked batch across `lanes` round-robin lanes: the item at rank
/// `k` lands in lane `k % lanes`, and lanes are drained in order. Workers
/// pulling from the front then start on well-separated ranks instead of all
/// hitting the top of the list at once.
pub fn interleave<T>(items: Vec<T>, lanes: usize) -> Vec<T> {
	if lanes <= 1 || items.len() <= lanes {
		return items;
	}

	let mut buckets: Vec<Vec<T>> = (0..lanes).map(|_| Vec::new()).collect();

	for (rank, item) in items.into_iter().enumerate() {
		buckets[rank % lanes].push(item);
	}

	buckets.into_iter().flatten().collect()
}
