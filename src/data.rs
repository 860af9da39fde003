//! Data loading and transaction grouping using Polars

use crate::error::ValidationError;
use anyhow::Context;
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::{debug, info};

/// One input row, read positionally as (transaction id, item, reference code)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub transaction_id: Option<String>,
    pub item: Option<String>,
    pub reference: Option<String>,
}

impl RawRecord {
    /// Build a fully populated record
    pub fn new(
        transaction_id: impl Into<String>,
        item: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id: Some(transaction_id.into()),
            item: Some(item.into()),
            reference: Some(reference.into()),
        }
    }
}

/// The items bought together under one transaction id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Transaction identifier as read from the source
    pub id: String,
    /// Distinct, trimmed item names in first-seen order
    pub items: Vec<String>,
}

/// All non-empty transactions, in first-seen order of their ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionSet {
    transactions: Vec<Transaction>,
}

impl TransactionSet {
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}

/// Item name to external reference code (e.g. an order number)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemReferenceMap {
    codes: HashMap<String, String>,
}

impl ItemReferenceMap {
    /// Reference code of an item, if one was seen
    pub fn get(&self, item: &str) -> Option<&str> {
        self.codes.get(item).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Keeps the first code recorded for an item
    fn record_first(&mut self, item: &str, code: &str) {
        if !self.codes.contains_key(item) {
            self.codes.insert(item.to_string(), code.to_string());
        }
    }
}

/// Cleaned transactions plus the item reference lookup for one run
#[derive(Debug, Clone)]
pub struct BasketData {
    pub transactions: TransactionSet,
    pub references: ItemReferenceMap,
    /// Number of input records that were dropped during cleaning
    pub dropped_records: usize,
}

/// Load a CSV file and group it into transactions
///
/// # Arguments
/// * `file_path` - Path to a CSV file with a header row; the first three columns
///   are read as transaction id, item and reference code
///
/// # Returns
/// * `BasketData` with the transactions and the item reference map
pub fn load_and_process_data(file_path: &str) -> crate::Result<BasketData> {
    let records = read_records(file_path)?;
    build_transactions(records)
}

/// Read the raw records of a CSV file, keeping row order
pub fn read_records(file_path: &str) -> crate::Result<Vec<RawRecord>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        // no type inference, every column is read as text
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(PathBuf::from(file_path)))
        .with_context(|| format!("failed to open transactions file {file_path}"))?
        .finish()
        .with_context(|| format!("failed to read transactions from {file_path}"))?;

    debug!(rows = df.height(), columns = df.width(), "loaded input table");
    records_from_frame(&df)
}

/// Convert the first three columns of a table into records.
///
/// Columns that are not already text are cast to it.
pub fn records_from_frame(df: &DataFrame) -> crate::Result<Vec<RawRecord>> {
    if df.width() < 3 {
        return Err(ValidationError::TooFewColumns { found: df.width() }.into());
    }

    let columns = df.get_columns();
    info!(
        transaction_id = columns[0].name(),
        item = columns[1].name(),
        reference = columns[2].name(),
        "identified input columns"
    );

    let ids = text_column(&columns[0])?;
    let items = text_column(&columns[1])?;
    let references = text_column(&columns[2])?;

    let records = ids
        .into_iter()
        .zip(items)
        .zip(references)
        .map(|((transaction_id, item), reference)| RawRecord {
            transaction_id,
            item,
            reference,
        })
        .collect();

    Ok(records)
}

fn text_column(series: &Series) -> crate::Result<Vec<Option<String>>> {
    let text = series.cast(&DataType::String)?;
    let values = text
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect();
    Ok(values)
}

/// Group records into transactions and build the item reference map
///
/// Records without an item (missing or blank after trimming) or without a
/// transaction id are dropped. Transactions keep the order in which their ids
/// first appear; an item repeated inside one transaction is kept once. The
/// reference map takes, per item, the first non-blank code in input order,
/// stored exactly as read.
pub fn build_transactions<I>(records: I) -> crate::Result<BasketData>
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut transactions: Vec<Transaction> = Vec::new();
    let mut seen_items: Vec<HashSet<String>> = Vec::new();
    let mut index_by_id: HashMap<String, usize> = HashMap::new();
    let mut references = ItemReferenceMap::default();
    let mut dropped_records = 0usize;

    for record in records {
        let item = match record.item.as_deref().map(str::trim) {
            Some(item) if !item.is_empty() => item.to_string(),
            _ => {
                dropped_records += 1;
                continue;
            }
        };
        let Some(transaction_id) = record.transaction_id else {
            dropped_records += 1;
            continue;
        };

        if let Some(code) = record.reference.as_deref() {
            if !code.trim().is_empty() {
                references.record_first(&item, code);
            }
        }

        let index = *index_by_id.entry(transaction_id.clone()).or_insert_with(|| {
            transactions.push(Transaction {
                id: transaction_id,
                items: Vec::new(),
            });
            seen_items.push(HashSet::new());
            transactions.len() - 1
        });

        if seen_items[index].insert(item.clone()) {
            transactions[index].items.push(item);
        }
    }

    if transactions.is_empty() {
        return Err(ValidationError::NoTransactions.into());
    }

    info!(
        transactions = transactions.len(),
        referenced_items = references.len(),
        dropped_records,
        "grouped records into transactions"
    );

    Ok(BasketData {
        transactions: TransactionSet { transactions },
        references,
        dropped_records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Beleg,Artikel,Bestellnummer").unwrap();
        writeln!(file, "1001,\"  Milk \",4711").unwrap();
        writeln!(file, "1001,Bread,4712").unwrap();
        writeln!(file, "1002,Milk,9999").unwrap();
        writeln!(file, "1002,,4713").unwrap();
        writeln!(file, "1003,Butter,4714").unwrap();
        file
    }

    #[test]
    fn test_load_and_process_data() {
        let test_file = create_test_csv();
        let file_path = test_file.path().to_str().unwrap();

        let result = load_and_process_data(file_path);
        assert!(result.is_ok());

        let data = result.unwrap();
        assert_eq!(data.transactions.len(), 3);
        assert_eq!(data.dropped_records, 1);
        assert_eq!(data.transactions.transactions()[0].id, "1001");
        assert_eq!(data.transactions.transactions()[0].items, vec!["Milk", "Bread"]);
        // numeric reference column read as text, first occurrence wins
        assert_eq!(data.references.get("Milk"), Some("4711"));
    }

    #[test]
    fn test_two_column_file_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Beleg,Artikel").unwrap();
        writeln!(file, "1,Milk").unwrap();

        let err = load_and_process_data(file.path().to_str().unwrap()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::TooFewColumns { found: 2 })
        );
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let records = vec![
            RawRecord::new("b", "x", "1"),
            RawRecord::new("a", "y", "2"),
            RawRecord::new("b", "y", "2"),
            RawRecord::new("b", "x", "1"),
        ];
        let data = build_transactions(records).unwrap();
        let ids: Vec<&str> = data.transactions.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(data.transactions.transactions()[0].items, vec!["x", "y"]);
    }

    #[test]
    fn test_blank_and_missing_items_dropped() {
        let records = vec![
            RawRecord::new("1", "   ", "1"),
            RawRecord {
                transaction_id: Some("2".to_string()),
                item: None,
                reference: Some("2".to_string()),
            },
            RawRecord {
                transaction_id: None,
                item: Some("orphan".to_string()),
                reference: None,
            },
            RawRecord::new("3", " tea ", "7"),
        ];
        let data = build_transactions(records).unwrap();
        assert_eq!(data.transactions.len(), 1);
        assert_eq!(data.transactions.transactions()[0].items, vec!["tea"]);
        assert_eq!(data.dropped_records, 3);
        assert_eq!(data.references.get("tea"), Some("7"));
        assert_eq!(data.references.get("orphan"), None);
    }

    #[test]
    fn test_reference_first_non_blank_occurrence() {
        let records = vec![
            RawRecord::new("1", "tea", ""),
            RawRecord::new("2", "tea", "A-1"),
            RawRecord::new("3", "tea", "B-2"),
        ];
        let data = build_transactions(records).unwrap();
        assert_eq!(data.references.get("tea"), Some("A-1"));
        assert_eq!(data.references.len(), 1);
    }

    #[test]
    fn test_empty_input_is_validation_error() {
        let err = build_transactions(vec![RawRecord::new("1", "", "x")]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::NoTransactions)
        );
    }

    #[test]
    fn test_reference_code_kept_verbatim() {
        let records = vec![
            RawRecord::new("1", "tea", "  "),
            RawRecord::new("2", "tea", " A-1 "),
        ];
        let data = build_transactions(records).unwrap();
        assert_eq!(data.references.get("tea"), Some(" A-1 "));
    }

    #[test]
    fn test_leading_zeros_preserved() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Beleg,Artikel,Bestellnummer").unwrap();
        writeln!(file, "001,Milk,04711").unwrap();
        writeln!(file, "1,Bread,4712").unwrap();

        let data = load_and_process_data(file.path().to_str().unwrap()).unwrap();
        let ids: Vec<&str> = data.transactions.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["001", "1"]);
        assert_eq!(data.references.get("Milk"), Some("04711"));
        assert_eq!(data.references.get("Bread"), Some("4712"));
    }

    #[test]
    fn test_text_code_after_numeric_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Beleg,Artikel,Bestellnummer").unwrap();
        for i in 0..150 {
            writeln!(file, "{},Item{},{}", i, i % 7, 1000 + i % 7).unwrap();
        }
        writeln!(file, "150,Special,X-12").unwrap();

        let data = load_and_process_data(file.path().to_str().unwrap()).unwrap();
        assert_eq!(data.transactions.len(), 151);
        assert_eq!(data.references.get("Special"), Some("X-12"));
        assert_eq!(data.references.get("Item3"), Some("1003"));
    }
}
