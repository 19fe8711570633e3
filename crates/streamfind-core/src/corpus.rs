//! Corpus snapshot loading.
//!
//! A snapshot is one JSON object keyed by source (`reddit`, `twitter`, `wiki`,
//! `details`). Entries are validated into `Document` variants here; anything
//! with missing or non-text content is logged and skipped so it never reaches
//! an index.
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::hash::Hasher;
use std::path::Path;
use tracing::{info, warn};
use twox_hash::XxHash64;

use crate::error::{Error, Result};
use crate::types::{DocId, Document, SourceKind};

#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    pub fn from_documents(documents: Vec<Document>) -> Self { Self { documents } }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() { return Err(Error::CorpusMissing(path.to_path_buf())); }
        let raw = std::fs::read_to_string(path).map_err(|e| Error::CorpusUnreadable { path: path.display().to_string(), reason: e.to_string() })?;
        let value: Value = serde_json::from_str(&raw).map_err(|e| Error::CorpusUnreadable { path: path.display().to_string(), reason: e.to_string() })?;
        let corpus = Self::from_value(&value).map_err(|e| match e {
            Error::CorpusUnreadable { reason, .. } => Error::CorpusUnreadable { path: path.display().to_string(), reason },
            other => other,
        })?;
        info!(path = %path.display(), documents = corpus.len(), entities = corpus.entities().len(), "corpus loaded");
        Ok(corpus)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let root = value.as_object().ok_or_else(|| Error::CorpusUnreadable { path: "<memory>".to_string(), reason: "top-level value is not an object".to_string() })?;
        let mut loader = Loader::default();
        loader.titled_posts(root.get("reddit"));
        loader.short_posts(root.get("twitter"));
        loader.summaries(root.get("wiki"));
        loader.profiles(root.get("details"));
        if loader.skipped > 0 { warn!(skipped = loader.skipped, "malformed corpus entries were excluded"); }
        Ok(Self { documents: loader.documents })
    }

    pub fn len(&self) -> usize { self.documents.len() }

    pub fn is_empty(&self) -> bool { self.documents.is_empty() }

    pub fn get(&self, id: DocId) -> Option<&Document> { self.documents.get(id.index()) }

    pub fn documents(&self) -> &[Document] { &self.documents }

    pub fn iter(&self) -> impl Iterator<Item = (DocId, &Document)> {
        self.documents.iter().enumerate().map(|(i, d)| (DocId(i as u32), d))
    }

    /// Entities are implicit: every distinct `entity_name` that owns a document.
    pub fn entities(&self) -> BTreeSet<&str> { self.documents.iter().map(Document::entity).collect() }

    /// xxh64 over every document's key, text and source weight, in id order. Persisted
    /// artifacts record it so that any edit to the snapshot forces a rebuild.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        for doc in &self.documents {
            let key = doc.key();
            let stable_id = key.stable_id.to_string();
            for field in [key.kind.as_str(), key.entity.as_str(), stable_id.as_str(), doc.text()] {
                hasher.write(field.as_bytes());
                hasher.write_u8(0xff);
            }
            hasher.write_u32(doc.source_weight().to_bits());
        }
        hasher.finish()
    }

    /// `IndexMismatch` unless an artifact was built from exactly this corpus.
    pub fn check_fingerprint(&self, artifact: &str, fingerprint: u64) -> Result<()> {
        let expected = self.fingerprint();
        if fingerprint != expected {
            return Err(Error::IndexMismatch(format!("{artifact} was built from a different corpus (fingerprint {fingerprint:016x}, corpus {expected:016x})")));
        }
        Ok(())
    }
}

#[derive(Default)]
struct Loader {
    documents: Vec<Document>,
    skipped: usize,
}

impl Loader {
    fn reject(&mut self, kind: SourceKind, entity: &str, position: usize, reason: &str) {
        let err = Error::MalformedDocument { kind, entity: entity.to_string(), position, reason: reason.to_string() };
        warn!("{err}");
        self.skipped += 1;
    }

    fn source<'a>(&self, name: &str, value: Option<&'a Value>) -> Option<&'a Value> {
        if value.is_none() { warn!(source = name, "source missing from corpus snapshot; treating as empty"); }
        value
    }

    fn entity_lists<'a>(&mut self, kind: SourceKind, value: &'a Value) -> Vec<(&'a str, &'a Vec<Value>)> {
        let Some(map) = value.as_object() else { self.reject(kind, "*", 0, "source is not an object"); return Vec::new() };
        let mut out = Vec::with_capacity(map.len());
        for (entity, entries) in map {
            match entries.as_array() {
                Some(list) => out.push((entity.as_str(), list)),
                None => self.reject(kind, entity, 0, "entity entry is not a list"),
            }
        }
        out.sort_by_key(|(entity, _)| *entity);
        out
    }

    fn titled_posts(&mut self, value: Option<&Value>) {
        let Some(value) = self.source("reddit", value) else { return };
        for (entity, posts) in self.entity_lists(SourceKind::TitledPost, value) {
            for (position, post) in posts.iter().enumerate() {
                let Some(title) = post.get("Title").and_then(Value::as_str) else {
                    self.reject(SourceKind::TitledPost, entity, position, "missing or non-text Title");
                    continue;
                };
                if title.trim().is_empty() { self.reject(SourceKind::TitledPost, entity, position, "empty Title"); continue; }
                let upvotes = post.get("Score").and_then(|s| s.as_i64().or_else(|| s.as_f64().map(|f| f as i64))).unwrap_or(0);
                let post_id = post.get("ID").and_then(|id| match id {
                    Value::String(s) if !s.is_empty() => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                });
                self.documents.push(Document::TitledPost { entity: entity.to_string(), position, post_id, title: title.to_string(), upvotes });
            }
        }
    }

    fn short_posts(&mut self, value: Option<&Value>) {
        let Some(value) = self.source("twitter", value) else { return };
        for (entity, posts) in self.entity_lists(SourceKind::ShortPost, value) {
            for (position, post) in posts.iter().enumerate() {
                match post.as_str() {
                    Some(text) if !text.trim().is_empty() => {
                        self.documents.push(Document::ShortPost { entity: entity.to_string(), position, text: text.to_string() })
                    }
                    Some(_) => self.reject(SourceKind::ShortPost, entity, position, "empty text"),
                    None => self.reject(SourceKind::ShortPost, entity, position, "post is not text"),
                }
            }
        }
    }

    fn summaries(&mut self, value: Option<&Value>) {
        let Some(value) = self.source("wiki", value) else { return };
        match value {
            Value::Object(map) => {
                for (entity, entry) in sorted(map) { self.summary(entity, 0, entry); }
            }
            Value::Array(list) => {
                for (position, entry) in list.iter().enumerate() {
                    match entry.get("streamer").and_then(Value::as_str) {
                        Some(entity) => self.summary(entity, position, entry),
                        None => self.reject(SourceKind::Summary, "?", position, "missing entity name"),
                    }
                }
            }
            _ => self.reject(SourceKind::Summary, "*", 0, "source is neither an object nor a list"),
        }
    }

    fn summary(&mut self, entity: &str, position: usize, entry: &Value) {
        match entry.get("wikipedia_summary").and_then(Value::as_str) {
            Some(text) if !text.trim().is_empty() => {
                self.documents.push(Document::Summary { entity: entity.to_string(), position, text: text.to_string() })
            }
            Some(_) => self.reject(SourceKind::Summary, entity, position, "empty summary"),
            None => self.reject(SourceKind::Summary, entity, position, "missing or non-text summary"),
        }
    }

    fn profiles(&mut self, value: Option<&Value>) {
        let Some(value) = self.source("details", value) else { return };
        let Some(map) = value.as_object() else { self.reject(SourceKind::ProfileDescription, "*", 0, "source is not an object"); return };
        for (entity, details) in sorted(map) { self.profile(entity, details.as_object()); }
    }

    fn profile(&mut self, entity: &str, details: Option<&Map<String, Value>>) {
        match details.and_then(|d| d.get("Description")).and_then(Value::as_str) {
            Some(text) if !text.trim().is_empty() => {
                self.documents.push(Document::ProfileDescription { entity: entity.to_string(), position: 0, text: text.to_string() })
            }
            Some(_) => self.reject(SourceKind::ProfileDescription, entity, 0, "empty description"),
            None => self.reject(SourceKind::ProfileDescription, entity, 0, "missing or non-text Description"),
        }
    }
}

/// Entities in name order, independent of the JSON map implementation.
fn sorted(map: &Map<String, Value>) -> Vec<(&str, &Value)> {
    let mut entries: Vec<(&str, &Value)> = map.iter().map(|(k, v)| (k.as_str(), v)).collect();
    entries.sort_by_key(|(k, _)| *k);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wiki_list_shape_uses_list_position() {
        let corpus = Corpus::from_value(&json!({
            "wiki": [ { "streamer": "a", "wikipedia_summary": "first" }, { "streamer": "b", "wikipedia_summary": "second" } ]
        }))
        .unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.documents()[1].position(), 1);
        assert_eq!(corpus.documents()[1].entity(), "b");
    }

    #[test]
    fn fingerprint_tracks_text_not_just_size() {
        let a = Corpus::from_value(&json!({ "twitter": { "a": ["valorant ranked"], "b": ["cooking pasta"] } })).unwrap();
        let same = Corpus::from_value(&json!({ "twitter": { "b": ["cooking pasta"], "a": ["valorant ranked"] } })).unwrap();
        let edited = Corpus::from_value(&json!({ "twitter": { "a": ["minecraft speedrun"], "b": ["cooking pasta"] } })).unwrap();
        assert_eq!(a.fingerprint(), same.fingerprint());
        assert_ne!(a.fingerprint(), edited.fingerprint());
        assert!(a.check_fingerprint("lexical index", same.fingerprint()).is_ok());
        assert!(matches!(a.check_fingerprint("lexical index", edited.fingerprint()), Err(Error::IndexMismatch(_))));
    }

    #[test]
    fn non_object_root_is_unreadable() {
        let err = Corpus::from_value(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, Error::CorpusUnreadable { .. }));
    }
}
