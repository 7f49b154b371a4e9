use std::fs;
use std::io::Cursor;

use tempfile::tempdir;

use super::*;
use crate::error::CoreError;
use crate::features::FieldValue;
use crate::schema::{DatasetVariant, Schema};

const PAYSIM_CSV: &str = "\
step,type,amount,nameOrig,oldbalanceOrg,newbalanceOrig,nameDest,oldbalanceDest,newbalanceDest,isFraud,isFlaggedFraud
1,PAYMENT,9839.64,C1,170136.0,160296.36,M1,0.0,0.0,0,0
1,TRANSFER,181.0,C2,181.0,0.0,C3,0.0,0.0,1,0
1,CASH_OUT,181.0,C4,,0.0,C5,21182.0,0.0,1,0
1,DEBIT,5337.77,C6,41720.0,36382.23,C7,41898.0,40348.79,0,0
";

#[test]
fn test_load_paysim_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("paysim.csv");
    fs::write(&path, PAYSIM_CSV).unwrap();

    let schema = Schema::for_variant(DatasetVariant::Paysim);
    let dataset = load_csv(&path, &schema).unwrap();

    assert_eq!(dataset.len(), 4);
    assert_eq!(dataset.labels(), &[0, 1, 1, 0]);
    assert_eq!(dataset.positives(), 2);

    let first = &dataset.records()[0];
    assert_eq!(first.get("type"), Some(&FieldValue::Text("PAYMENT".into())));
    assert_eq!(first.get("amount"), Some(&FieldValue::Number(9839.64)));
    // unused columns are not carried
    assert!(!first.contains("nameOrig"));
    assert!(dataset.records()[2].get("oldbalanceOrg").unwrap().is_missing());
}

#[test]
fn test_prepare_imputes_median_and_derives() {
    let schema = Schema::for_variant(DatasetVariant::Paysim);
    let dataset = read_csv(Cursor::new(PAYSIM_CSV), &schema).unwrap();
    let prepared = dataset.prepare().unwrap();

    assert_eq!(prepared.rows.len(), 4);
    assert_eq!(prepared.imputed_cells, 1);

    // median of 170136, 181, 41720 → 41720
    let old_org = schema.index_of("oldbalanceOrg").unwrap();
    assert_eq!(prepared.rows[2].values()[old_org], FieldValue::Number(41720.0));

    let ratio = schema.index_of("balance_ratio").unwrap();
    assert_eq!(prepared.rows[1].values()[ratio], FieldValue::Number(181.0 / 182.0));
}

#[test]
fn test_missing_column_is_reported() {
    let schema = Schema::for_variant(DatasetVariant::Paysim);
    let csv = "type,amount,isFraud\nPAYMENT,1.0,0\n";
    let err = read_csv(Cursor::new(csv), &schema).unwrap_err();
    assert!(matches!(err, CoreError::MissingColumn(ref c) if c == "oldbalanceOrg"));
}

#[test]
fn test_non_numeric_value_reports_row_and_column() {
    let schema = Schema::for_variant(DatasetVariant::Paysim);
    let csv = PAYSIM_CSV.replace("5337.77", "lots");
    let err = read_csv(Cursor::new(csv), &schema).unwrap_err();
    match err {
        CoreError::MalformedField { column, row, .. } => {
            assert_eq!(column, "amount");
            assert_eq!(row, Some(4));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_synthetic_bad_timestamp_fails_prepare_with_row() {
    let schema = Schema::for_variant(DatasetVariant::Synthetic);
    let header = schema.required_columns().join(",");
    let good: Vec<String> = schema
        .required_columns()
        .iter()
        .map(|c| match *c {
            "Timestamp" => "2024-03-01 12:00:00".to_string(),
            "Is_Fraud" => "0".to_string(),
            "Transaction_Type" | "Category" | "Payment_Method" | "Currency" => "x".to_string(),
            "Account_Number" | "Counterparty" | "User_ID" => "id".to_string(),
            _ => "1".to_string(),
        })
        .collect();
    let bad = good.join(",").replace("2024-03-01 12:00:00", "yesterday");
    let csv = format!("{}\n{}\n{}\n", header, good.join(","), bad);

    let dataset = read_csv(Cursor::new(csv), &schema).unwrap();
    let err = dataset.prepare().unwrap_err();
    match err {
        CoreError::MalformedField { column, row, .. } => {
            assert_eq!(column, "Timestamp");
            assert_eq!(row, Some(2));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_select_allows_duplicates() {
    let schema = Schema::for_variant(DatasetVariant::Paysim);
    let prepared = read_csv(Cursor::new(PAYSIM_CSV), &schema)
        .unwrap()
        .prepare()
        .unwrap();
    let (rows, labels) = prepared.select(&[1, 1, 3]);
    assert_eq!(rows.len(), 3);
    assert_eq!(labels, vec![1, 1, 0]);
    assert_eq!(rows[0], rows[1]);
}
