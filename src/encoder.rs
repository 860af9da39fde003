//! Boolean membership matrix of transactions × items

use crate::data::TransactionSet;
use ndarray::Array2;
use std::collections::{BTreeSet, HashMap};

const WORD_BITS: usize = 64;

/// One-hot encoding of a transaction set.
///
/// Columns are the distinct items in lexicographic order, rows follow the
/// transaction order. Besides the dense matrix every column is kept as a
/// bitset over rows, so "rows containing all of these items" is an AND plus a
/// popcount per word.
#[derive(Debug, Clone)]
pub struct TransactionMatrix {
    items: Vec<String>,
    column_by_item: HashMap<String, usize>,
    membership: Array2<bool>,
    column_bits: Vec<Vec<u64>>,
}

/// Encode transactions into a membership matrix with sorted item columns
pub fn encode_transactions(transactions: &TransactionSet) -> TransactionMatrix {
    let universe: BTreeSet<&str> = transactions
        .iter()
        .flat_map(|transaction| transaction.items.iter().map(String::as_str))
        .collect();
    let items: Vec<String> = universe.into_iter().map(str::to_string).collect();
    let column_by_item: HashMap<String, usize> = items
        .iter()
        .enumerate()
        .map(|(column, item)| (item.clone(), column))
        .collect();

    let n_rows = transactions.len();
    let n_words = n_rows.div_ceil(WORD_BITS);
    let mut membership = Array2::from_elem((n_rows, items.len()), false);
    let mut column_bits = vec![vec![0u64; n_words]; items.len()];

    for (row, transaction) in transactions.iter().enumerate() {
        for item in &transaction.items {
            if let Some(&column) = column_by_item.get(item) {
                membership[[row, column]] = true;
                column_bits[column][row / WORD_BITS] |= 1u64 << (row % WORD_BITS);
            }
        }
    }

    TransactionMatrix {
        items,
        column_by_item,
        membership,
        column_bits,
    }
}

impl TransactionMatrix {
    /// Number of rows (transactions)
    pub fn n_transactions(&self) -> usize {
        self.membership.nrows()
    }

    /// Number of columns (distinct items)
    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    /// Item names in column order
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Item name of a column
    pub fn item(&self, column: usize) -> &str {
        &self.items[column]
    }

    /// Column of an item, if it occurs in any transaction
    pub fn column_of(&self, item: &str) -> Option<usize> {
        self.column_by_item.get(item).copied()
    }

    /// Dense view of the membership matrix
    pub fn membership(&self) -> &Array2<bool> {
        &self.membership
    }

    /// Item names for a list of columns, in the given order
    pub fn item_names(&self, columns: &[usize]) -> Vec<&str> {
        columns.iter().map(|&column| self.item(column)).collect()
    }

    /// Count rows that contain every listed column.
    ///
    /// An empty column list matches every row.
    pub fn count_rows(&self, columns: &[usize]) -> usize {
        if columns.is_empty() {
            return self.n_transactions();
        }
        let n_words = self.n_transactions().div_ceil(WORD_BITS);
        (0..n_words)
            .map(|word| {
                columns
                    .iter()
                    .fold(u64::MAX, |acc, &column| acc & self.column_bits[column][word])
                    .count_ones() as usize
            })
            .sum()
    }
}
