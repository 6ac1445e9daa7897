use anyhow::{anyhow, Result};
use arrow_array::{FixedSizeListArray, Int64Array, RecordBatch};
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const TABLE_NAME: &str = "chunks";
pub const ID_COLUMN: &str = "id";
pub const VECTOR_COLUMN: &str = "vector";

/// `id` is the store position; `vector` the unit-normalized embedding of that chunk.
pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new(ID_COLUMN, DataType::Int64, false),
		Field::new(VECTOR_COLUMN, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}

/// Dimension of the `vector` column, if the schema has one.
pub fn vector_dim(schema: &Schema) -> Option<usize> {
	match schema.field_with_name(VECTOR_COLUMN).ok()?.data_type() {
		DataType::FixedSizeList(_, n) => usize::try_from(*n).ok(),
		_ => None,
	}
}

/// Rows `first_id..first_id + vectors.len()`.
pub fn vectors_to_record_batch(first_id: u64, vectors: &[Vec<f32>], dim: usize) -> Result<RecordBatch> {
	let dim_i32 = i32::try_from(dim).map_err(|_| anyhow!("embedding dimension {dim} too large"))?;
	let first = i64::try_from(first_id).map_err(|_| anyhow!("id {first_id} out of range"))?;
	let ids: Vec<i64> = (0..vectors.len() as i64).map(|i| first + i).collect();
	let rows = vectors.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect::<Vec<_>>()));
	let record_batch = RecordBatch::try_new(build_arrow_schema(dim_i32), vec![
		Arc::new(Int64Array::from(ids)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(rows, dim_i32)),
	])?;
	Ok(record_batch)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn batch_ids_continue_from_first_id() {
		let batch = vectors_to_record_batch(7, &[vec![1.0, 0.0], vec![0.0, 1.0]], 2).expect("batch");
		let ids = batch.column(0).as_any().downcast_ref::<Int64Array>().expect("ids");
		assert_eq!(ids.values().to_vec(), vec![7, 8]);
		assert_eq!(vector_dim(&batch.schema()), Some(2));
	}
}
