//! Level-wise Apriori search for frequent itemsets

use crate::encoder::TransactionMatrix;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// An itemset whose support reached the mining threshold
#[derive(Debug, Clone, PartialEq)]
pub struct FrequentItemset {
    /// Matrix columns in strictly increasing order
    pub items: Vec<usize>,
    /// Number of transactions containing every item
    pub count: usize,
    /// `count` divided by the number of transactions
    pub support: f64,
}

impl FrequentItemset {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Every frequent itemset of a run, ordered by size and then lexicographically
#[derive(Debug, Clone, Default)]
pub struct FrequentItemsets {
    itemsets: Vec<FrequentItemset>,
    position: HashMap<Vec<usize>, usize>,
    n_transactions: usize,
}

impl FrequentItemsets {
    fn new(itemsets: Vec<FrequentItemset>, n_transactions: usize) -> Self {
        let position = itemsets
            .iter()
            .enumerate()
            .map(|(i, itemset)| (itemset.items.clone(), i))
            .collect();
        Self {
            itemsets,
            position,
            n_transactions,
        }
    }

    pub fn len(&self) -> usize {
        self.itemsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itemsets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrequentItemset> {
        self.itemsets.iter()
    }

    /// Number of transactions the supports are relative to
    pub fn n_transactions(&self) -> usize {
        self.n_transactions
    }

    /// Look up a frequent itemset by its sorted columns
    pub fn get(&self, items: &[usize]) -> Option<&FrequentItemset> {
        self.position.get(items).map(|&i| &self.itemsets[i])
    }

    /// Support of a frequent itemset by its sorted columns
    pub fn support(&self, items: &[usize]) -> Option<f64> {
        self.get(items).map(|itemset| itemset.support)
    }

    /// Number of frequent itemsets per itemset size
    pub fn count_by_size(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for itemset in &self.itemsets {
            *counts.entry(itemset.len()).or_insert(0) += 1;
        }
        counts
    }
}

/// Mine all itemsets with support >= `min_support`
///
/// # Arguments
/// * `matrix` - Encoded transactions
/// * `min_support` - Minimum fraction of transactions, in (0, 1]
/// * `max_len` - Optional upper bound on itemset size
///
/// # Returns
/// * Exactly the itemsets (up to `max_len` items) whose support meets the threshold
pub fn mine_frequent_itemsets(
    matrix: &TransactionMatrix,
    min_support: f64,
    max_len: Option<usize>,
) -> FrequentItemsets {
    let n_transactions = matrix.n_transactions();
    if n_transactions == 0 || max_len == Some(0) {
        return FrequentItemsets::new(Vec::new(), n_transactions);
    }

    let measure = |items: Vec<usize>| -> Option<FrequentItemset> {
        let count = matrix.count_rows(&items);
        let support = count as f64 / n_transactions as f64;
        (support >= min_support).then_some(FrequentItemset {
            items,
            count,
            support,
        })
    };

    let mut frequent = Vec::new();
    let mut level: Vec<FrequentItemset> = (0..matrix.n_items())
        .filter_map(|column| measure(vec![column]))
        .collect();
    let mut size = 1;

    while !level.is_empty() {
        debug!(size, frequent = level.len(), "apriori level complete");

        if max_len.is_some_and(|max| size >= max) {
            frequent.append(&mut level);
            break;
        }

        let candidates = generate_candidates(&level);
        debug!(size = size + 1, candidates = candidates.len(), "apriori candidates");

        frequent.append(&mut level);
        level = candidates.into_iter().filter_map(&measure).collect();
        size += 1;
    }

    FrequentItemsets::new(frequent, n_transactions)
}

/// Join k-itemsets sharing a (k-1)-prefix, then drop candidates with an
/// infrequent k-subset.
///
/// `level` must be sorted lexicographically and hold itemsets of one size;
/// the candidates come out sorted the same way.
fn generate_candidates(level: &[FrequentItemset]) -> Vec<Vec<usize>> {
    let Some(first) = level.first() else {
        return Vec::new();
    };
    let k = first.len();
    let frequent: HashSet<&[usize]> = level.iter().map(|itemset| itemset.items.as_slice()).collect();

    let mut candidates = Vec::new();
    let mut subset = Vec::with_capacity(k);

    for (i, left) in level.iter().enumerate() {
        for right in &level[i + 1..] {
            if left.items[..k - 1] != right.items[..k - 1] {
                break;
            }
            let mut candidate = left.items.clone();
            candidate.push(right.items[k - 1]);

            // dropping either of the last two items gives `left` or `right`
            let all_subsets_frequent = (0..k.saturating_sub(1)).all(|skip| {
                subset.clear();
                subset.extend(
                    candidate
                        .iter()
                        .enumerate()
                        .filter(|&(j, _)| j != skip)
                        .map(|(_, &column)| column),
                );
                frequent.contains(subset.as_slice())
            });

            if all_subsets_frequent {
                candidates.push(candidate);
            }
        }
    }

    candidates
}
