//! Feature Layout - Centralized Schema Definition
//!
//! **This file controls the column contract between training and serving.**
//!
//! ## Rules:
//! 1. Add a field → increment SCHEMA_VERSION
//! 2. Change order → increment SCHEMA_VERSION
//! 3. Remove a field or change its kind → increment SCHEMA_VERSION
//!
//! The version and the layout hash are stamped into every persisted
//! pipeline and checked again when the server loads it.

use std::fmt;
use std::str::FromStr;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::features::FieldValue;

// ============================================================================
// SCHEMA VERSION
// ============================================================================

/// Current schema version
/// MUST be incremented when any layout below changes
pub const SCHEMA_VERSION: u8 = 1;

/// Sentinel used for missing categorical and identifier values
pub const UNKNOWN_CATEGORY: &str = "unknown";

// ============================================================================
// FIELD TYPES
// ============================================================================

/// Dataset variant the schema describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetVariant {
    /// PaySim-style mobile money transfers
    Paysim,
    /// Synthetic fraud dataset with behavioral fields and a timestamp
    Synthetic,
}

impl DatasetVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetVariant::Paysim => "paysim",
            DatasetVariant::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for DatasetVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetVariant {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paysim" => Ok(DatasetVariant::Paysim),
            "synthetic" => Ok(DatasetVariant::Synthetic),
            other => Err(CoreError::InvalidConfig(format!(
                "unknown dataset variant '{}' (expected 'paysim' or 'synthetic')",
                other
            ))),
        }
    }
}

/// How a column is encoded by the column transformer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Continuous or 0/1 value
    Numeric,
    /// Low-cardinality label, one-hot encoded
    Categorical,
    /// High-cardinality identifier, replaced by its training-set count
    Frequency,
}

impl FieldKind {
    fn tag(&self) -> u8 {
        match self {
            FieldKind::Numeric => 1,
            FieldKind::Categorical => 2,
            FieldKind::Frequency => 3,
        }
    }

    /// Value a field takes when the serving payload does not carry it.
    /// Frequency fields stay missing, which encodes to a count of 0.
    pub fn default_value(&self) -> FieldValue {
        match self {
            FieldKind::Numeric => FieldValue::Number(0.0),
            FieldKind::Categorical => FieldValue::Text(UNKNOWN_CATEGORY.to_string()),
            FieldKind::Frequency => FieldValue::Missing,
        }
    }
}

/// Treatment of numeric columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericScaling {
    Passthrough,
    Standardize,
}

/// One column of the layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn num(name: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Numeric }
}

const fn cat(name: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Categorical }
}

const fn freq(name: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Frequency }
}

// ============================================================================
// LAYOUTS (Authoritative source)
// ============================================================================

/// PaySim columns in the exact order the pipeline is fitted on
pub const PAYSIM_LAYOUT: &[FieldSpec] = &[
    cat("type"),
    num("amount"),
    num("oldbalanceOrg"),
    num("newbalanceOrig"),
    num("oldbalanceDest"),
    num("newbalanceDest"),
    // derived
    num("delta_balance_org"),
    num("delta_balance_dest"),
    num("balance_ratio"),
    num("same_sender_receiver"),
];

pub const PAYSIM_DERIVED: &[&str] = &[
    "delta_balance_org",
    "delta_balance_dest",
    "balance_ratio",
    "same_sender_receiver",
];

/// Synthetic-fraud columns in the exact order the pipeline is fitted on
pub const SYNTHETIC_LAYOUT: &[FieldSpec] = &[
    num("Amount"),
    num("Transaction_Hour"),
    num("Transaction_Weekday"),
    num("Is_Weekend"),
    cat("Transaction_Type"),
    cat("Category"),
    cat("Payment_Method"),
    freq("Account_Number"),
    freq("Counterparty"),
    freq("User_ID"),
    num("IP_Region"),
    num("System_Latency"),
    num("Login_Frequency"),
    num("Failed_Attempts"),
    cat("Currency"),
    num("Created_Year"),
    num("Created_Month"),
    num("Created_Day"),
    num("Has_Description"),
    num("Has_Review"),
    num("Card_ThreeDSecure"),
    num("Installments_Used"),
];

pub const SYNTHETIC_DERIVED: &[&str] = &[
    "Transaction_Hour",
    "Transaction_Weekday",
    "Is_Weekend",
    "Created_Year",
    "Created_Month",
    "Created_Day",
];

/// Raw column the synthetic derivations read from
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

// ============================================================================
// SCHEMA
// ============================================================================

/// Ordered, typed column contract for one dataset variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    variant: DatasetVariant,
    fields: &'static [FieldSpec],
    derived: &'static [&'static str],
    sources: &'static [&'static str],
    label: &'static str,
    scaling: NumericScaling,
}

impl Schema {
    pub fn for_variant(variant: DatasetVariant) -> Self {
        match variant {
            DatasetVariant::Paysim => Self {
                variant,
                fields: PAYSIM_LAYOUT,
                derived: PAYSIM_DERIVED,
                sources: &[],
                label: "isFraud",
                scaling: NumericScaling::Passthrough,
            },
            DatasetVariant::Synthetic => Self {
                variant,
                fields: SYNTHETIC_LAYOUT,
                derived: SYNTHETIC_DERIVED,
                sources: &[TIMESTAMP_COLUMN],
                label: "Is_Fraud",
                scaling: NumericScaling::Standardize,
            },
        }
    }

    pub fn variant(&self) -> DatasetVariant {
        self.variant
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn scaling(&self) -> NumericScaling {
        self.scaling
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Get field index by name (O(n) but fields are few)
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_derived(&self, name: &str) -> bool {
        self.derived.contains(&name)
    }

    /// Columns a training CSV must provide: every non-derived field,
    /// the raw columns derivations read from, and the label.
    pub fn required_columns(&self) -> Vec<&'static str> {
        let mut columns: Vec<&'static str> = self
            .fields
            .iter()
            .map(|f| f.name)
            .filter(|name| !self.is_derived(name))
            .collect();
        columns.extend_from_slice(self.sources);
        columns.push(self.label);
        columns
    }

    /// Raw columns consumed only by derivations (not part of the layout)
    pub fn source_columns(&self) -> &'static [&'static str] {
        self.sources
    }

    /// CRC32 over version, variant and ordered (name, kind) pairs.
    /// Used to detect layout mismatches at load time.
    pub fn layout_hash(&self) -> u32 {
        let mut hasher = Hasher::new();
        hasher.update(&[SCHEMA_VERSION]);
        hasher.update(self.variant.as_str().as_bytes());
        hasher.update(&[0]);

        for field in self.fields {
            hasher.update(field.name.as_bytes());
            hasher.update(&[field.kind.tag(), 0]);
        }

        hasher.finalize()
    }

    /// Validate that a persisted layout stamp matches this schema
    pub fn validate(&self, version: u8, hash: u32) -> CoreResult<()> {
        let expected_hash = self.layout_hash();
        if version != SCHEMA_VERSION || hash != expected_hash {
            return Err(CoreError::SchemaMismatch {
                expected_version: SCHEMA_VERSION,
                expected_hash,
                actual_version: version,
                actual_hash: hash,
            });
        }
        Ok(())
    }

    pub fn info(&self) -> LayoutInfo {
        LayoutInfo {
            variant: self.variant,
            version: SCHEMA_VERSION,
            hash: self.layout_hash(),
            field_count: self.fields.len(),
            field_names: self.fields.iter().map(|f| f.name.to_string()).collect(),
        }
    }
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Layout stamp persisted alongside a fitted pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub variant: DatasetVariant,
    pub version: u8,
    pub hash: u32,
    pub field_count: usize,
    pub field_names: Vec<String>,
}

impl LayoutInfo {
    /// Resolve the compiled schema this stamp refers to, checking that it
    /// still matches field for field.
    pub fn resolve(&self) -> CoreResult<Schema> {
        let schema = Schema::for_variant(self.variant);
        schema.validate(self.version, self.hash)?;
        Ok(schema)
    }
}

// ============================================================================
// TESTS
// ============================================================================
