use soundproof_core::Match;

use crate::index::CorpusIndex;

pub use soundproof_core::config::DEFAULT_TOP_K;

/// Ranks the corpus against `query` and returns at most `top_k` matches.
///
/// Scores are cosine similarities between unit TF-IDF vectors. Documents that
/// share no weighted term with the query are not matches. Equal scores keep
/// corpus order. An empty query, a query made only of unknown terms, or
/// `top_k == 0` all yield an empty result.
pub fn search<'a>(index: &'a CorpusIndex, query: &str, top_k: usize) -> Vec<Match<'a>> {
	if query.is_empty() || top_k == 0 { return Vec::new(); }

	let query_vec = index.vectorize(query);
	if query_vec.is_empty() {
		tracing::debug!(query_len = query.len(), "query shares no term with the vocabulary");
		return Vec::new();
	}

	let mut matches: Vec<Match<'a>> = index
		.vectors()
		.iter()
		.zip(index.documents())
		.enumerate()
		.filter_map(|(position, (row, document))| {
			let score = row.dot(&query_vec);
			(score > 0.0).then(|| Match { document, position, score: score.min(1.0) })
		})
		.collect();

	// sort_by is stable, so ties stay in corpus order
	matches.sort_by(|a, b| b.score.total_cmp(&a.score));
	let candidates = matches.len();
	matches.truncate(top_k);
	tracing::debug!(terms = query_vec.len(), candidates, returned = matches.len(), "search complete");
	matches
}

impl CorpusIndex {
	pub fn search(&self, query: &str, top_k: usize) -> Vec<Match<'_>> { search(self, query, top_k) }
}
