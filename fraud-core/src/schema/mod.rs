//! Schema Module - column contract shared by training and serving

pub mod layout;

pub use layout::{
    DatasetVariant, FieldKind, FieldSpec, LayoutInfo, NumericScaling, Schema, SCHEMA_VERSION,
    TIMESTAMP_COLUMN, UNKNOWN_CATEGORY,
};
