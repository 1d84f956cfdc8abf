/// Arrow schema definitions for the vector store tables.
pub mod store {
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    pub const ID: &str = "id";
    pub const TEXT: &str = "text";
    pub const METADATA: &str = "metadata";
    pub const VECTOR: &str = "vector";

    /// Schema for embedded documents: regulations, policies and controls.
    ///
    /// `metadata` holds the JSON-encoded string map.
    pub fn documents_schema(dim: i32) -> Schema {
        Schema::new(vec![
            Field::new(ID, DataType::Utf8, false),
            Field::new(TEXT, DataType::Utf8, false),
            Field::new(METADATA, DataType::Utf8, false),
            Field::new(
                VECTOR,
                DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
                true,
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::store;
    use arrow::datatypes::DataType;

    #[test]
    fn documents_schema_has_expected_fields() {
        let schema = store::documents_schema(384);
        assert_eq!(schema.fields().len(), 4);
        assert!(schema.field_with_name(store::ID).is_ok());
        assert!(schema.field_with_name(store::METADATA).is_ok());
    }

    #[test]
    fn vector_column_carries_dimension() {
        let schema = store::documents_schema(8);
        let field = schema.field_with_name(store::VECTOR).unwrap();
        match field.data_type() {
            DataType::FixedSizeList(_, dim) => assert_eq!(*dim, 8),
            other => panic!("unexpected vector type: {other:?}"),
        }
    }
}
