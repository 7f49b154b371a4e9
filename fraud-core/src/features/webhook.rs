//! Webhook Payload → Schema Row
//!
//! Serving-side feature preparation. A POST body is either a webhook
//! envelope (`{"data": {"object": {...}}}`) or the flat payment object
//! itself. The payment object becomes a `RawRecord`, goes through the same
//! derivations as training data, and is aligned to the schema.

use serde::Serialize;
use serde_json::Value;

use super::align::AlignedRow;
use super::derive::{derive, parse_timestamp};
use super::record::{FieldValue, RawRecord};
use crate::error::{CoreError, CoreResult};
use crate::schema::{DatasetVariant, Schema, TIMESTAMP_COLUMN};

/// ISO-8601 form used in responses, UTC without offset
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Fixed values for fields the payment provider never sends
const DEFAULT_TRANSACTION_TYPE: &str = "purchase";
const DEFAULT_CATEGORY: &str = "general";

/// Transaction metadata echoed back in the verdict
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionMeta {
    pub amount: Option<f64>,
    pub transaction_id: String,
    pub date: Option<String>,
}

/// Unwrap a webhook envelope; a flat body is returned as is
pub fn payment_object(body: &Value) -> &Value {
    match body.get("data").and_then(|d| d.get("object")) {
        Some(object) => object,
        None => body,
    }
}

/// Build the raw record for `payment` (derivations not yet applied)
pub fn record_from_payload(schema: &Schema, payment: &Value) -> CoreResult<RawRecord> {
    if !payment.is_object() {
        return Err(CoreError::malformed("body", "expected a JSON object"));
    }

    match schema.variant() {
        DatasetVariant::Synthetic => synthetic_record(payment),
        DatasetVariant::Paysim => flat_record(schema, payment),
    }
}

/// Full serving preparation: record → derivations → aligned row
pub fn prepare_payload(schema: &Schema, payment: &Value) -> CoreResult<AlignedRow> {
    let mut record = record_from_payload(schema, payment)?;
    derive(schema, &mut record)?;
    AlignedRow::from_record(schema, &record)
}

/// Extract amount / id / date for the response
pub fn transaction_meta(schema: &Schema, payment: &Value) -> CoreResult<TransactionMeta> {
    let transaction_id = payment
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    let date = match payment.get("created") {
        None | Some(Value::Null) => None,
        Some(created) => {
            let value = FieldValue::from_json("created", created)?;
            Some(parse_timestamp("created", &value)?.format(DATE_FORMAT).to_string())
        }
    };

    let amount = match schema.variant() {
        // Payment provider amounts are in minor units
        DatasetVariant::Synthetic => Some(minor_amount(payment)? / 100.0),
        DatasetVariant::Paysim => optional_number(payment, "amount")?,
    };

    Ok(TransactionMeta {
        amount,
        transaction_id,
        date,
    })
}

fn synthetic_record(payment: &Value) -> CoreResult<RawRecord> {
    let created = match payment.get("created") {
        None | Some(Value::Null) => {
            return Err(CoreError::malformed("created", "missing timestamp"));
        }
        Some(value) => FieldValue::from_json("created", value)?,
    };
    let created = parse_timestamp("created", &created)?;

    let mut record = RawRecord::new()
        .with("Amount", minor_amount(payment)? / 100.0)
        .with(TIMESTAMP_COLUMN, created.and_utc().timestamp() as f64)
        .with("Transaction_Type", DEFAULT_TRANSACTION_TYPE)
        .with("Category", DEFAULT_CATEGORY)
        .with("Payment_Method", first_payment_method(payment)?);

    if let Some(currency) = payment.get("currency").and_then(Value::as_str) {
        record.insert("Currency", currency);
    }

    // `customer` is an id string, or an object when the provider expands it
    let customer = match payment.get("customer") {
        Some(Value::String(id)) => Some(id.as_str()),
        Some(Value::Object(obj)) => obj.get("id").and_then(Value::as_str),
        _ => None,
    };
    if let Some(customer) = customer {
        record.insert("User_ID", customer);
    }

    let has_description = payment
        .get("description")
        .and_then(Value::as_str)
        .map_or(false, |d| !d.trim().is_empty());
    record.insert("Has_Description", if has_description { 1.0 } else { 0.0 });

    Ok(record)
}

fn flat_record(schema: &Schema, payment: &Value) -> CoreResult<RawRecord> {
    let mut record = RawRecord::new();

    for column in schema.required_columns() {
        if column == schema.label() {
            continue;
        }
        if let Some(value) = payment.get(column) {
            record.insert(column, FieldValue::from_json(column, value)?);
        }
    }

    Ok(record)
}

fn minor_amount(payment: &Value) -> CoreResult<f64> {
    Ok(optional_number(payment, "amount")?.unwrap_or(0.0))
}

fn optional_number(payment: &Value, key: &str) -> CoreResult<Option<f64>> {
    match payment.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| CoreError::malformed(key, "number out of range")),
        Some(_) => Err(CoreError::malformed(key, "expected a number")),
    }
}

fn first_payment_method(payment: &Value) -> CoreResult<String> {
    match payment.get("payment_method_types") {
        None | Some(Value::Null) => Ok("unknown".to_string()),
        Some(Value::Array(types)) => Ok(types
            .first()
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string()),
        Some(_) => Err(CoreError::malformed(
            "payment_method_types",
            "expected an array of strings",
        )),
    }
}
