use std::fmt;

use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer, TokenStream};

const STOP_WORDS: &[&str] = &[
    "a","about","above","after","again","against","all","am","an","and","any","are","as","at","be","because","been","before","being","below",
    "between","both","but","by","can","could","did","do","does","doing","down","during","each","few","for","from","further","had","has","have",
    "having","he","her","here","hers","herself","him","himself","his","how","i","if","in","into","is","it","its","itself","just","may","me",
    "might","more","most","must","my","myself","no","nor","not","now","of","off","on","once","only","or","other","our","ours","ourselves","out",
    "over","own","same","shall","she","should","so","some","such","than","that","the","their","theirs","them","themselves","then","there",
    "these","they","this","those","through","to","too","under","until","up","very","was","we","were","what","when","where","which","while",
    "who","whom","whose","why","will","with","would","you","your","yours","yourself","yourselves",
];

/// Tokenization rule shared by index build and query time.
///
/// The base pipeline yields lowercase alphanumeric runs; `with_stop_words`
/// adds English stop-word removal and a minimum token length.
#[derive(Clone)]
pub struct Analyzer {
    inner: TextAnalyzer,
    min_len: usize,
}

impl Analyzer {
    pub fn lexical() -> Self {
        let inner = TextAnalyzer::builder(SimpleTokenizer::default()).filter(LowerCaser).build();
        Self { inner, min_len: 1 }
    }

    pub fn with_stop_words() -> Self {
        let inner = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(LowerCaser)
            .filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| s.to_string())))
            .build();
        Self { inner, min_len: 2 }
    }

    pub fn tokens(&self, text: &str) -> Vec<String> {
        let mut analyzer = self.inner.clone();
        let mut stream = analyzer.token_stream(text);
        let mut out = Vec::new();
        while stream.advance() {
            let token = &stream.token().text;
            if token.chars().count() >= self.min_len { out.push(token.clone()); }
        }
        out
    }

    /// Tokens with duplicates removed, first occurrence order kept.
    pub fn distinct_tokens(&self, text: &str) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.tokens(text).into_iter().filter(|t| seen.insert(t.clone())).collect()
    }
}

impl Default for Analyzer {
    fn default() -> Self { Self::lexical() }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer").field("min_len", &self.min_len).finish_non_exhaustive()
    }
}
