//! Derived columns
//!
//! Pure, row-local derivations applied identically at training and serving
//! time. Nothing here looks at other rows or external state.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};

use super::record::{FieldValue, RawRecord};
use crate::error::{CoreError, CoreResult};
use crate::schema::{DatasetVariant, Schema, TIMESTAMP_COLUMN};

/// Add the variant's derived columns to `record`
pub fn derive(schema: &Schema, record: &mut RawRecord) -> CoreResult<()> {
    match schema.variant() {
        DatasetVariant::Paysim => derive_balances(record),
        DatasetVariant::Synthetic => derive_calendar(record),
    }
}

/// Balance deltas, balance ratio and same-sender-receiver flag
pub fn derive_balances(record: &mut RawRecord) -> CoreResult<()> {
    let amount = record.number_or("amount", 0.0)?;
    let old_org = record.number_or("oldbalanceOrg", 0.0)?;
    let new_org = record.number_or("newbalanceOrig", 0.0)?;
    let old_dest = record.number_or("oldbalanceDest", 0.0)?;
    let new_dest = record.number_or("newbalanceDest", 0.0)?;

    record.insert("delta_balance_org", old_org - new_org);
    record.insert("delta_balance_dest", new_dest - old_dest);
    record.insert("balance_ratio", balance_ratio(amount, old_org));
    record.insert(
        "same_sender_receiver",
        if old_org == old_dest { 1.0 } else { 0.0 },
    );

    Ok(())
}

/// `amount / (old_balance + 1)`; the denominator is at least 1 for any
/// non-negative balance.
pub fn balance_ratio(amount: f64, old_balance: f64) -> f64 {
    amount / (old_balance + 1.0)
}

/// Hour, weekday (Monday = 0), weekend flag and calendar date from `Timestamp`
pub fn derive_calendar(record: &mut RawRecord) -> CoreResult<()> {
    let value = record
        .get(TIMESTAMP_COLUMN)
        .cloned()
        .unwrap_or(FieldValue::Missing);
    let ts = parse_timestamp(TIMESTAMP_COLUMN, &value)?;

    let weekday = ts.weekday().num_days_from_monday();

    record.insert("Transaction_Hour", ts.hour() as f64);
    record.insert("Transaction_Weekday", weekday as f64);
    record.insert("Is_Weekend", if weekday >= 5 { 1.0 } else { 0.0 });
    record.insert("Created_Year", ts.year() as f64);
    record.insert("Created_Month", ts.month() as f64);
    record.insert("Created_Day", ts.day() as f64);

    Ok(())
}

/// Parse a timestamp cell as UTC.
///
/// Accepts Unix seconds (number or numeric string), RFC 3339,
/// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and bare dates.
pub fn parse_timestamp(column: &str, value: &FieldValue) -> CoreResult<NaiveDateTime> {
    match value {
        FieldValue::Number(secs) => from_unix(column, *secs),
        FieldValue::Text(raw) => {
            let raw = raw.trim();
            if let Ok(secs) = raw.parse::<f64>() {
                return from_unix(column, secs);
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
                return Ok(dt.naive_utc());
            }
            for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
                if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
                    return Ok(dt);
                }
            }
            if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                    return Ok(dt);
                }
            }
            Err(CoreError::malformed(
                column,
                format!("unparsable timestamp '{}'", raw),
            ))
        }
        FieldValue::Missing => Err(CoreError::malformed(column, "missing timestamp")),
    }
}

fn from_unix(column: &str, secs: f64) -> CoreResult<NaiveDateTime> {
    if !secs.is_finite() {
        return Err(CoreError::malformed(column, "non-finite timestamp"));
    }
    DateTime::from_timestamp(secs.trunc() as i64, 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| CoreError::malformed(column, format!("timestamp {} out of range", secs)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paysim_derivations() {
        let mut record = RawRecord::new()
            .with("amount", 100.0)
            .with("oldbalanceOrg", 500.0)
            .with("newbalanceOrig", 400.0)
            .with("oldbalanceDest", 50.0)
            .with("newbalanceDest", 150.0);

        derive_balances(&mut record).unwrap();

        assert_eq!(record.get("delta_balance_org"), Some(&FieldValue::Number(100.0)));
        assert_eq!(record.get("delta_balance_dest"), Some(&FieldValue::Number(100.0)));
        assert_eq!(record.get("balance_ratio"), Some(&FieldValue::Number(100.0 / 501.0)));
        assert_eq!(record.get("same_sender_receiver"), Some(&FieldValue::Number(0.0)));
    }

    #[test]
    fn test_same_sender_receiver_flag() {
        let mut record = RawRecord::new()
            .with("oldbalanceOrg", 0.0)
            .with("oldbalanceDest", 0.0);
        derive_balances(&mut record).unwrap();
        assert_eq!(record.get("same_sender_receiver"), Some(&FieldValue::Number(1.0)));
    }

    #[test]
    fn test_balance_ratio_finite_for_non_negative_balances() {
        for balance in [0.0, 1e-12, 0.5, 1.0, 1e9, f64::MAX / 4.0] {
            for amount in [0.0, 1.0, 1e6, 1e12] {
                let ratio = balance_ratio(amount, balance);
                assert!(ratio.is_finite(), "ratio({}, {}) = {}", amount, balance, ratio);
                assert!(ratio <= amount);
            }
        }
    }

    #[test]
    fn test_calendar_from_unix_seconds() {
        // 2023-11-14T22:13:20Z, a Tuesday
        let mut record = RawRecord::new().with(TIMESTAMP_COLUMN, 1_700_000_000.0);
        derive_calendar(&mut record).unwrap();

        assert_eq!(record.number_or("Transaction_Hour", -1.0).unwrap(), 22.0);
        assert_eq!(record.number_or("Transaction_Weekday", -1.0).unwrap(), 1.0);
        assert_eq!(record.number_or("Is_Weekend", -1.0).unwrap(), 0.0);
        assert_eq!(record.number_or("Created_Year", -1.0).unwrap(), 2023.0);
        assert_eq!(record.number_or("Created_Month", -1.0).unwrap(), 11.0);
        assert_eq!(record.number_or("Created_Day", -1.0).unwrap(), 14.0);
    }

    #[test]
    fn test_calendar_weekend_from_text() {
        // 2024-06-08 is a Saturday
        let mut record = RawRecord::new().with(TIMESTAMP_COLUMN, "2024-06-08 03:15:00");
        derive_calendar(&mut record).unwrap();
        assert_eq!(record.number_or("Transaction_Weekday", -1.0).unwrap(), 5.0);
        assert_eq!(record.number_or("Is_Weekend", -1.0).unwrap(), 1.0);
        assert_eq!(record.number_or("Transaction_Hour", -1.0).unwrap(), 3.0);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        for raw in ["2024-01-02 10:00:00", "2024-01-02T10:00:00", "2024-01-02T12:00:00+02:00"] {
            let parsed = parse_timestamp("ts", &FieldValue::Text(raw.into())).unwrap();
            assert_eq!(parsed, expected, "{}", raw);
        }
    }

    #[test]
    fn test_unparsable_timestamp_is_an_error() {
        let mut record = RawRecord::new().with(TIMESTAMP_COLUMN, "yesterday-ish");
        let err = derive_calendar(&mut record).unwrap_err();
        assert!(matches!(err, CoreError::MalformedField { .. }));

        let mut empty = RawRecord::new();
        assert!(derive_calendar(&mut empty).is_err());
    }
}
