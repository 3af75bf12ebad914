use std::collections::{BTreeMap, HashMap};

use soundproof_core::{Document, Error, Result};

use crate::tokenizer::Analyzer;

/// Sparse weighted-term vector: `(dimension, weight)` pairs sorted by dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
	entries: Vec<(u32, f32)>,
}

impl SparseVector {
	/// Builds a vector from unsorted entries; duplicate dimensions are not expected.
	pub(crate) fn from_entries(mut entries: Vec<(u32, f32)>) -> Self {
		entries.sort_unstable_by_key(|&(dim, _)| dim);
		Self { entries }
	}

	pub fn entries(&self) -> &[(u32, f32)] { &self.entries }

	pub fn len(&self) -> usize { self.entries.len() }

	pub fn is_empty(&self) -> bool { self.entries.is_empty() }

	pub fn norm(&self) -> f32 {
		self.entries.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt()
	}

	/// Scales to unit L2 length. The zero vector is left as is.
	pub(crate) fn normalize(&mut self) {
		let norm = self.norm();
		if norm > 0.0 {
			for (_, w) in &mut self.entries { *w /= norm; }
		}
	}

	/// Dot product by merging the two dimension-sorted entry lists.
	pub fn dot(&self, other: &SparseVector) -> f32 {
		let (a, b) = (&self.entries, &other.entries);
		let (mut i, mut j) = (0, 0);
		let mut sum = 0.0f32;
		while i < a.len() && j < b.len() {
			match a[i].0.cmp(&b[j].0) {
				std::cmp::Ordering::Less => i += 1,
				std::cmp::Ordering::Greater => j += 1,
				std::cmp::Ordering::Equal => { sum += a[i].1 * b[j].1; i += 1; j += 1; }
			}
		}
		sum
	}
}

/// Frozen term dictionary: each term owns a dimension and a smoothed IDF weight.
///
/// Dimensions follow lexicographic term order, so they do not depend on the
/// order documents were fed in.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
	dims: HashMap<String, u32>,
	terms: Vec<String>,
	idf: Vec<f32>,
}

impl Vocabulary {
	/// `idf = ln((n + 1) / (df + 1)) + 1`, always >= 1 for observed terms.
	fn from_document_frequencies(doc_freq: BTreeMap<String, u32>, n_docs: usize) -> Self {
		let n = n_docs as f32;
		let mut vocab = Self { dims: HashMap::with_capacity(doc_freq.len()), terms: Vec::with_capacity(doc_freq.len()), idf: Vec::with_capacity(doc_freq.len()) };
		for (dim, (term, df)) in doc_freq.into_iter().enumerate() {
			vocab.idf.push(((n + 1.0) / (df as f32 + 1.0)).ln() + 1.0);
			vocab.dims.insert(term.clone(), dim as u32);
			vocab.terms.push(term);
		}
		vocab
	}

	pub fn len(&self) -> usize { self.terms.len() }

	pub fn is_empty(&self) -> bool { self.terms.is_empty() }

	pub fn dimension(&self, term: &str) -> Option<u32> { self.dims.get(term).copied() }

	pub fn idf(&self, term: &str) -> Option<f32> {
		self.dimension(term).map(|dim| self.idf[dim as usize])
	}

	pub fn term(&self, dim: u32) -> Option<&str> { self.terms.get(dim as usize).map(String::as_str) }

	pub fn terms(&self) -> impl Iterator<Item = &str> + '_ { self.terms.iter().map(String::as_str) }

	/// `tf * idf` entries for every known term; unknown terms are dropped.
	pub(crate) fn weigh(&self, counts: &HashMap<String, u32>) -> SparseVector {
		let entries = counts
			.iter()
			.filter_map(|(term, &tf)| self.dims.get(term).map(|&dim| (dim, tf as f32 * self.idf[dim as usize])))
			.collect();
		SparseVector::from_entries(entries)
	}
}

/// Immutable TF-IDF representation of a document corpus.
///
/// Built once with [`CorpusIndex::build`], then shared read-only by any number
/// of concurrent searches.
pub struct CorpusIndex {
	documents: Vec<Document>,
	text_field: String,
	vocabulary: Vocabulary,
	vectors: Vec<SparseVector>,
	analyzer: Analyzer,
}

impl CorpusIndex {
	/// Tokenizes the `text_field` of every document, derives the vocabulary and
	/// stores one unit-length TF-IDF row per document, parallel to the corpus.
	///
	/// Fails with [`Error::EmptyCorpus`] when `documents` is empty and with
	/// [`Error::MissingField`] when a document has no string under `text_field`.
	pub fn build(documents: Vec<Document>, text_field: &str) -> Result<Self> {
		if documents.is_empty() { return Err(Error::EmptyCorpus); }
		let analyzer = Analyzer::new();

		let mut counts = Vec::with_capacity(documents.len());
		for (position, doc) in documents.iter().enumerate() {
			let text = doc.text(text_field).ok_or_else(|| Error::MissingField { position, id: doc.id.clone(), field: text_field.to_string() })?;
			counts.push(analyzer.term_counts(text));
		}

		let mut doc_freq: BTreeMap<String, u32> = BTreeMap::new();
		for term in counts.iter().flat_map(|c| c.keys()) {
			*doc_freq.entry(term.clone()).or_default() += 1;
		}
		let vocabulary = Vocabulary::from_document_frequencies(doc_freq, documents.len());

		let vectors: Vec<SparseVector> = counts
			.iter()
			.map(|c| { let mut v = vocabulary.weigh(c); v.normalize(); v })
			.collect();

		tracing::debug!(documents = documents.len(), terms = vocabulary.len(), field = text_field, "built corpus index");
		Ok(Self { documents, text_field: text_field.to_string(), vocabulary, vectors, analyzer })
	}

	/// Projects free text into the index's vector space, unit-normalized unless
	/// it shares no term with the vocabulary.
	pub fn vectorize(&self, text: &str) -> SparseVector {
		let mut v = self.vocabulary.weigh(&self.analyzer.term_counts(text));
		v.normalize();
		v
	}

	pub fn documents(&self) -> &[Document] { &self.documents }

	pub fn document(&self, position: usize) -> Option<&Document> { self.documents.get(position) }

	pub fn vectors(&self) -> &[SparseVector] { &self.vectors }

	pub fn vocabulary(&self) -> &Vocabulary { &self.vocabulary }

	pub fn text_field(&self) -> &str { &self.text_field }

	pub fn len(&self) -> usize { self.documents.len() }

	/// Always false for a successfully built index.
	pub fn is_empty(&self) -> bool { self.documents.is_empty() }
}

impl std::fmt::Debug for CorpusIndex {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CorpusIndex")
			.field("documents", &self.documents.len())
			.field("terms", &self.vocabulary.len())
			.field("text_field", &self.text_field)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const FIELD: &str = "faiblesses";

	fn doc(id: &str, text: &str) -> Document { Document::with_text(id, FIELD, text) }

	#[test]
	fn empty_corpus_is_rejected() {
		assert!(matches!(CorpusIndex::build(Vec::new(), FIELD), Err(Error::EmptyCorpus)));
	}

	#[test]
	fn missing_text_field_names_the_document() {
		let docs = vec![doc("a", "mur"), Document::with_text("b", "autre", "plafond")];
		match CorpusIndex::build(docs, FIELD) {
			Err(Error::MissingField { position, id, field }) => {
				assert_eq!((position, id.as_str(), field.as_str()), (1, "b", FIELD));
			}
			other => panic!("expected MissingField, got {other:?}"),
		}
	}

	#[test]
	fn null_text_counts_as_missing() {
		let mut fields = soundproof_core::Payload::new();
		fields.insert(FIELD.to_string(), serde_json::Value::Null);
		let err = CorpusIndex::build(vec![Document::new("n", fields)], FIELD).unwrap_err();
		assert!(matches!(err, Error::MissingField { .. }));
	}

	#[test]
	fn idf_is_smoothed_and_positive() {
		let index = CorpusIndex::build(vec![doc("1", "bruit vitrage"), doc("2", "bruit mur"), doc("3", "plafond")], FIELD).unwrap();
		let vocab = index.vocabulary();
		// df(bruit) = 2, N = 3
		assert!((vocab.idf("bruit").unwrap() - ((4.0f32 / 3.0).ln() + 1.0)).abs() < 1e-6);
		assert!((vocab.idf("plafond").unwrap() - (2.0f32.ln() + 1.0)).abs() < 1e-6);
		assert!(vocab.terms().all(|t| vocab.idf(t).unwrap() >= 1.0));
		assert_eq!(vocab.idf("inconnu"), None);
	}

	#[test]
	fn dimensions_follow_term_order() {
		let index = CorpusIndex::build(vec![doc("1", "vitrage bruit"), doc("2", "mur")], FIELD).unwrap();
		let terms: Vec<&str> = index.vocabulary().terms().collect();
		assert_eq!(terms, ["bruit", "mur", "vitrage"]);
		assert_eq!(index.vocabulary().dimension("mur"), Some(1));
		assert_eq!(index.vocabulary().term(2), Some("vitrage"));
	}

	#[test]
	fn term_frequency_scales_weight() {
		let index = CorpusIndex::build(vec![doc("1", "bruit bruit vitrage"), doc("2", "mur")], FIELD).unwrap();
		let v = &index.vectors()[0];
		let bruit = index.vocabulary().dimension("bruit").unwrap();
		let vitrage = index.vocabulary().dimension("vitrage").unwrap();
		let w = |dim: u32| v.entries().iter().find(|e| e.0 == dim).unwrap().1;
		// same idf, so the ratio is the tf ratio
		assert!((w(bruit) / w(vitrage) - 2.0).abs() < 1e-5);
	}

	#[test]
	fn rows_are_unit_length_or_zero() {
		let docs = vec![doc("1", "fenêtre simple vitrage bruit"), doc("2", ""), doc("3", "mur mince, voisin parle fort fort"), doc("4", " ... ")];
		let index = CorpusIndex::build(docs, FIELD).unwrap();
		assert_eq!(index.vectors().len(), index.len());
		for (i, v) in index.vectors().iter().enumerate() {
			if i == 1 || i == 3 {
				assert!(v.is_empty(), "blank text gives the zero vector");
				assert_eq!(v.norm(), 0.0);
			} else {
				assert!((v.norm() - 1.0).abs() < 1e-5, "row {i} norm {}", v.norm());
			}
		}
	}

	#[test]
	fn dot_merges_sorted_entries() {
		let a = SparseVector::from_entries(vec![(3, 1.0), (0, 2.0), (5, 1.0)]);
		let b = SparseVector::from_entries(vec![(5, 4.0), (1, 7.0), (0, 0.5)]);
		assert_eq!(a.entries()[0], (0, 2.0));
		assert!((a.dot(&b) - 5.0).abs() < 1e-6);
		assert_eq!(a.dot(&SparseVector::default()), 0.0);
	}

	#[test]
	fn unknown_query_terms_vectorize_to_zero() {
		let index = CorpusIndex::build(vec![doc("1", "bruit")], FIELD).unwrap();
		assert!(index.vectorize("silence total").is_empty());
		assert!((index.vectorize("bruit silence").norm() - 1.0).abs() < 1e-6);
	}
}
