//! On-disk layout for the vector index.
//!
//! `metadata.json` holds the model id, vector width, corpus fingerprint and
//! one entry per row; the vectors themselves live in a Lance table under
//! `vectors/`. Row `i` of the table must pair with entry `i` of the metadata.
use anyhow::{Context, Result};
use arrow_array::cast::AsArray;
use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator};
use futures::TryStreamExt;
use lancedb::connect;
use lancedb::query::ExecutableQuery;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use streamfind_core::Error;

use crate::index::{VectorEntry, VectorIndex};
use crate::schema::{build_arrow_schema, EMBEDDINGS_TABLE};

pub const METADATA_FILE: &str = "metadata.json";
pub const VECTORS_DIR: &str = "vectors";

#[derive(Serialize, Deserialize)]
struct Metadata {
    model_id: String,
    dim: usize,
    #[serde(default)]
    fingerprint: u64,
    entries: Vec<VectorEntry>,
}

impl VectorIndex {
    /// Replace whatever index lives in `dir`.
    pub async fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let vectors_dir = dir.join(VECTORS_DIR);
        if vectors_dir.exists() { fs::remove_dir_all(&vectors_dir)?; }

        let dim = i32::try_from(self.dim()).context("vector width does not fit the table schema")?;
        let schema = build_arrow_schema(dim);
        let db = connect(vectors_dir.to_string_lossy().as_ref()).execute().await?;
        let batches = if self.is_empty() {
            Vec::new()
        } else {
            let rows = Int32Array::from_iter_values(0..self.len() as i32);
            let vectors = (0..self.len()).map(|i| Some(self.row(i).iter().map(|&x| Some(x)).collect::<Vec<_>>()));
            let batch = RecordBatch::try_new(
                schema.clone(),
                vec![Arc::new(rows), Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, dim))],
            )?;
            vec![Ok(batch)]
        };
        let reader = Box::new(RecordBatchIterator::new(batches.into_iter(), schema));
        db.create_table(EMBEDDINGS_TABLE, reader).execute().await?;

        let meta = Metadata { model_id: self.model_id().to_string(), dim: self.dim(), fingerprint: self.fingerprint(), entries: self.entries().to_vec() };
        let file = fs::File::create(dir.join(METADATA_FILE))?;
        serde_json::to_writer(BufWriter::new(file), &meta)?;
        info!(dir = %dir.display(), rows = self.len(), dim = self.dim(), "vector index saved");
        Ok(())
    }

    /// Load and cross-check metadata against the stored vectors.
    ///
    /// Row count and width disagreements are reported as `IndexMismatch` /
    /// `IndexDimensionMismatch` so callers can tell the user to rebuild.
    pub async fn load(dir: &Path) -> Result<Self> {
        let meta_path = dir.join(METADATA_FILE);
        let file = fs::File::open(&meta_path).with_context(|| format!("opening {}", meta_path.display()))?;
        let meta: Metadata = serde_json::from_reader(BufReader::new(file)).map_err(Error::from)?;

        let vectors_dir = dir.join(VECTORS_DIR);
        if !vectors_dir.exists() {
            return Err(Error::IndexMismatch(format!("{} is missing", vectors_dir.display())).into());
        }
        let db = connect(vectors_dir.to_string_lossy().as_ref()).execute().await?;
        let table = db.open_table(EMBEDDINGS_TABLE).execute().await?;
        let mut stream = table.query().execute().await?;

        let mut rows: Vec<Option<Vec<f32>>> = vec![None; meta.entries.len()];
        let mut seen = 0usize;
        while let Some(batch) = stream.try_next().await? {
            let row_col = batch
                .column_by_name("row")
                .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
                .ok_or_else(|| Error::IndexMismatch("embeddings table has no row column".into()))?;
            let vec_col = batch
                .column_by_name("vector")
                .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
                .ok_or_else(|| Error::IndexMismatch("embeddings table has no vector column".into()))?;
            let width = vec_col.value_length() as usize;
            if width != meta.dim {
                return Err(Error::IndexDimensionMismatch { index: width, model: meta.dim }.into());
            }
            for i in 0..batch.num_rows() {
                seen += 1;
                let row = row_col.value(i);
                let slot = usize::try_from(row).ok().and_then(|r| rows.get_mut(r)).ok_or_else(|| {
                    Error::IndexMismatch(format!("vector row {row} has no metadata entry"))
                })?;
                let values = vec_col.value(i);
                *slot = Some(values.as_primitive::<Float32Type>().values().to_vec());
            }
        }
        debug!(rows = seen, "read stored vectors");
        if seen != meta.entries.len() {
            return Err(Error::IndexMismatch(format!("{} stored vectors for {} metadata entries", seen, meta.entries.len())).into());
        }

        let mut matrix = Vec::with_capacity(meta.entries.len() * meta.dim);
        for (i, row) in rows.into_iter().enumerate() {
            let row = row.ok_or_else(|| Error::IndexMismatch(format!("metadata entry {i} has no vector")))?;
            matrix.extend_from_slice(&row);
        }
        let index = VectorIndex::from_parts(meta.model_id, meta.dim, meta.fingerprint, meta.entries, matrix)?;
        info!(dir = %dir.display(), rows = index.len(), dim = index.dim(), model = index.model_id(), "vector index loaded");
        Ok(index)
    }
}
