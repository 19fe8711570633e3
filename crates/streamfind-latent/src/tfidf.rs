use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use streamfind_text::Analyzer;

/// One sparse row: `(column, value)` pairs sorted by column.
pub type SparseRow = Vec<(usize, f32)>;

/// Row-major sparse matrix with a fixed column count.
#[derive(Debug, Clone, Default)]
pub struct SparseMatrix {
    pub cols: usize,
    pub rows: Vec<SparseRow>,
}

impl SparseMatrix {
    pub fn nnz(&self) -> usize { self.rows.iter().map(Vec::len).sum() }
}

/// TF-IDF over unigrams and bigrams of stop-word-filtered tokens.
///
/// Weights are raw counts times smoothed idf `ln((1+n)/(1+df)) + 1`, each row
/// L2-normalized. Terms outside `[min_df, max_df * n]` document frequency are
/// dropped from the vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f32>,
    #[serde(skip, default = "Analyzer::with_stop_words")]
    analyzer: Analyzer,
}

impl TfidfVectorizer {
    /// Learn the vocabulary from `texts` and return the weighted matrix.
    pub fn fit_transform(texts: &[&str], min_df: usize, max_df: f32) -> (Self, SparseMatrix) {
        let analyzer = Analyzer::with_stop_words();
        let docs: Vec<Vec<String>> = texts.iter().map(|t| ngrams(&analyzer.tokens(t))).collect();
        let n = docs.len();

        let mut df: HashMap<&str, usize> = HashMap::new();
        for terms in &docs {
            let distinct: HashSet<&str> = terms.iter().map(String::as_str).collect();
            for term in distinct { *df.entry(term).or_default() += 1; }
        }
        let max_count = f64::from(max_df) * n as f64;
        let mut kept: Vec<(&str, usize)> = df.into_iter().filter(|&(_, d)| d >= min_df && d as f64 <= max_count).collect();
        kept.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let vocabulary: BTreeMap<String, usize> = kept.iter().enumerate().map(|(i, (t, _))| ((*t).to_string(), i)).collect();
        let idf = kept.iter().map(|&(_, d)| (((1 + n) as f32) / ((1 + d) as f32)).ln() + 1.0).collect();
        let vectorizer = Self { vocabulary, idf, analyzer };
        let rows = docs.iter().map(|terms| vectorizer.weigh(terms)).collect();
        let matrix = SparseMatrix { cols: vectorizer.idf.len(), rows };
        (vectorizer, matrix)
    }

    /// Vectorize unseen text; out-of-vocabulary terms contribute nothing.
    pub fn transform(&self, text: &str) -> SparseRow { self.weigh(&ngrams(&self.analyzer.tokens(text))) }

    pub fn vocabulary_len(&self) -> usize { self.idf.len() }

    /// Terms ordered by column.
    pub fn terms(&self) -> Vec<&str> {
        let mut terms = vec![""; self.idf.len()];
        for (term, &col) in &self.vocabulary {
            if let Some(slot) = terms.get_mut(col) { *slot = term.as_str(); }
        }
        terms
    }

    fn weigh(&self, terms: &[String]) -> SparseRow {
        let mut counts: BTreeMap<usize, f32> = BTreeMap::new();
        for term in terms {
            if let Some(&col) = self.vocabulary.get(term) { *counts.entry(col).or_default() += 1.0; }
        }
        let mut row: SparseRow = counts.into_iter().map(|(col, tf)| (col, tf * self.idf[col])).collect();
        let norm = row.iter().map(|(_, v)| v * v).sum::<f32>().sqrt();
        if norm > 0.0 { for (_, v) in &mut row { *v /= norm; } }
        row
    }
}

fn ngrams(tokens: &[String]) -> Vec<String> {
    let mut out = tokens.to_vec();
    out.extend(tokens.windows(2).map(|w| format!("{} {}", w[0], w[1])));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_frequency_cutoffs() {
        let texts = ["valorant ranked", "valorant tournament", "cooking stream", "cooking pasta", "chess openings"];
        let (v, m) = TfidfVectorizer::fit_transform(&texts, 2, 0.5);
        assert_eq!(v.terms(), vec!["cooking", "valorant"]);
        assert_eq!(m.rows.len(), 5);
        assert!(m.rows[4].is_empty());
    }

    #[test]
    fn rows_are_unit_length_and_bigrams_count() {
        let texts = ["kai cenat live", "kai cenat subathon", "chess", "cooking", "pasta"];
        let (v, m) = TfidfVectorizer::fit_transform(&texts, 2, 0.5);
        assert!(v.terms().contains(&"kai cenat"));
        let norm: f32 = m.rows[0].iter().map(|(_, x)| x * x).sum();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn transform_ignores_unknown_terms() {
        let texts = ["valorant ranked", "valorant tournament", "cooking stream", "cooking pasta", "chess"];
        let (v, _) = TfidfVectorizer::fit_transform(&texts, 2, 0.5);
        assert!(v.transform("minecraft speedrun").is_empty());
        assert_eq!(v.transform("the VALORANT").len(), 1);
    }
}
