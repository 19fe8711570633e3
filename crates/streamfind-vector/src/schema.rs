use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const EMBEDDINGS_TABLE: &str = "embeddings";

/// `row` aligns each vector with the metadata array; the vector width is
/// fixed at build time and recorded in the list type.
pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("row", DataType::Int32, false),
        Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
    ]))
}
