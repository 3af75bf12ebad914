use std::collections::HashMap;

use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, TextAnalyzer, TokenStream};

/// Splits text on every non-alphanumeric character and lower-cases the pieces.
///
/// The same analyzer must be used for documents and queries, otherwise query
/// terms would never line up with the vocabulary.
#[derive(Clone)]
pub struct Analyzer {
	inner: TextAnalyzer,
}

impl Default for Analyzer {
	fn default() -> Self {
		let inner = TextAnalyzer::builder(SimpleTokenizer::default()).filter(LowerCaser).build();
		Self { inner }
	}
}

impl Analyzer {
	pub fn new() -> Self { Self::default() }

	pub fn tokenize(&self, text: &str) -> Vec<String> {
		let mut tokens = Vec::new();
		self.for_each_token(text, |t| tokens.push(t.to_string()));
		tokens
	}

	/// Raw term frequencies of `text`.
	pub fn term_counts(&self, text: &str) -> HashMap<String, u32> {
		let mut counts: HashMap<String, u32> = HashMap::new();
		self.for_each_token(text, |t| {
			if let Some(c) = counts.get_mut(t) { *c += 1; } else { counts.insert(t.to_string(), 1); }
		});
		counts
	}

	fn for_each_token<F: FnMut(&str)>(&self, text: &str, mut f: F) {
		// token_stream needs &mut; a clone keeps the analyzer shareable across threads.
		let mut analyzer = self.inner.clone();
		let mut stream = analyzer.token_stream(text);
		while stream.advance() {
			f(&stream.token().text);
		}
	}
}

impl std::fmt::Debug for Analyzer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("Analyzer(simple+lowercase)")
	}
}
