/// Text → fixed-length vector model, treated as a black box by the engines.
///
/// Implementations must return L2-normalized vectors of exactly `dim()`
/// components, and the same vector for the same input.
pub trait Embedder: Send + Sync {
    /// Stable identifier of the model; persisted next to the vectors it produced.
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed_one(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}
