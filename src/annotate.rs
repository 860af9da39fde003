//! Derived, non-statistical rule columns: counts, reference codes and short ids

use crate::data::ItemReferenceMap;
use crate::encoder::TransactionMatrix;
use crate::rules::Rule;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

const ID_MODULUS: u64 = 100_000_000;

/// A rule with its export-ready annotations
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedRule {
    pub rule: Rule,
    /// Sorted antecedent item names joined by ", "
    pub antecedents: String,
    /// Sorted consequent item names joined by ", "
    pub consequents: String,
    /// Transactions containing every item of the rule
    pub combination_count: usize,
    /// Sorted, de-duplicated reference codes of the rule's items joined by "-"
    pub mat_combination: String,
    /// Eight-digit display id of `mat_combination`; not unique
    pub mat_combination_id: String,
    /// Number of distinct items in antecedent and consequent
    pub different_items: usize,
}

/// Annotate rules in their generation order
pub fn annotate_rules(
    rules: &[Rule],
    matrix: &TransactionMatrix,
    references: &ItemReferenceMap,
) -> Vec<AnnotatedRule> {
    rules
        .iter()
        .map(|rule| annotate_rule(rule, matrix, references))
        .collect()
}

/// Annotate a single rule
pub fn annotate_rule(
    rule: &Rule,
    matrix: &TransactionMatrix,
    references: &ItemReferenceMap,
) -> AnnotatedRule {
    let items = rule.items();
    let mat_combination = mat_combination(&items, matrix, references);
    let mat_combination_id = mat_combination_id(&mat_combination);

    AnnotatedRule {
        antecedents: render_items(matrix, &rule.antecedent),
        consequents: render_items(matrix, &rule.consequent),
        combination_count: matrix.count_rows(&items),
        mat_combination,
        mat_combination_id,
        different_items: items.len(),
        rule: rule.clone(),
    }
}

/// Item names of the columns, sorted and joined by ", "
pub fn render_items(matrix: &TransactionMatrix, columns: &[usize]) -> String {
    let mut names = matrix.item_names(columns);
    names.sort_unstable();
    names.join(", ")
}

/// Reference codes of the columns' items, sorted, de-duplicated and joined by "-".
///
/// Items without a reference code are skipped.
pub fn mat_combination(
    columns: &[usize],
    matrix: &TransactionMatrix,
    references: &ItemReferenceMap,
) -> String {
    let codes: BTreeSet<&str> = columns
        .iter()
        .filter_map(|&column| references.get(matrix.item(column)))
        .collect();
    codes.into_iter().collect::<Vec<_>>().join("-")
}

/// Eight-digit id of a reference-code combination.
///
/// The SHA-256 digest is read as a big-endian integer and reduced modulo 10^8;
/// the zero-padded result has its leading zeros replaced by nines. Different
/// combinations can share an id.
pub fn mat_combination_id(combination: &str) -> String {
    let digest = Sha256::digest(combination.as_bytes());
    let value = digest
        .iter()
        .fold(0u64, |acc, &byte| (acc * 256 + u64::from(byte)) % ID_MODULUS);
    format_combination_id(value)
}

/// Zero-pad to eight digits, then turn the leading run of zeros into nines
pub fn format_combination_id(value: u64) -> String {
    let padded = format!("{:08}", value % ID_MODULUS);
    let zeros = padded.bytes().take_while(|&b| b == b'0').count();
    format!("{}{}", "9".repeat(zeros), &padded[zeros..])
}
