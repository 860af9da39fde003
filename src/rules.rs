//! Association rules and their interestingness metrics

use crate::apriori::FrequentItemsets;
use tracing::debug;

/// The six statistics attached to every rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleMetrics {
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub leverage: f64,
    /// `f64::INFINITY` when confidence is 1
    pub conviction: f64,
    /// Zhang's metric, always within [-1, 1]
    pub zhangs_metric: f64,
}

impl RuleMetrics {
    /// Compute metrics from the supports of antecedent, consequent and their union
    pub fn compute(antecedent_support: f64, consequent_support: f64, support: f64) -> Self {
        let confidence = support / antecedent_support;
        let lift = confidence / consequent_support;
        let leverage = support - antecedent_support * consequent_support;

        let conviction = if confidence >= 1.0 {
            f64::INFINITY
        } else {
            (1.0 - consequent_support) / (1.0 - confidence)
        };

        let denominator = f64::max(
            antecedent_support * (1.0 - consequent_support),
            consequent_support * (antecedent_support - support),
        );
        let zhangs_metric = if denominator == 0.0 {
            0.0
        } else {
            ((confidence - consequent_support) / denominator).clamp(-1.0, 1.0)
        };

        Self {
            support,
            confidence,
            lift,
            leverage,
            conviction,
            zhangs_metric,
        }
    }
}

/// A directional rule `antecedent -> consequent` over matrix columns
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Sorted columns of the left-hand side
    pub antecedent: Vec<usize>,
    /// Sorted columns of the right-hand side, disjoint from `antecedent`
    pub consequent: Vec<usize>,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    pub metrics: RuleMetrics,
}

impl Rule {
    /// All columns of the rule, sorted
    pub fn items(&self) -> Vec<usize> {
        let mut items: Vec<usize> = self
            .antecedent
            .iter()
            .chain(&self.consequent)
            .copied()
            .collect();
        items.sort_unstable();
        items
    }
}

/// Derive every rule with confidence >= `min_confidence`
///
/// Each frequent itemset with at least two items is split once per non-empty
/// proper subset: larger antecedents first, lexicographic within a size.
pub fn generate_rules(frequent: &FrequentItemsets, min_confidence: f64) -> Vec<Rule> {
    let mut rules = Vec::new();
    let mut considered = 0usize;

    for itemset in frequent.iter().filter(|itemset| itemset.len() >= 2) {
        let n = itemset.len();
        for antecedent_len in (1..n).rev() {
            for picked in combinations(n, antecedent_len) {
                let mut antecedent = Vec::with_capacity(antecedent_len);
                let mut consequent = Vec::with_capacity(n - antecedent_len);
                let mut next = picked.iter().peekable();
                for (position, &column) in itemset.items.iter().enumerate() {
                    if next.peek() == Some(&&position) {
                        next.next();
                        antecedent.push(column);
                    } else {
                        consequent.push(column);
                    }
                }

                // subsets of a frequent itemset are frequent
                let (Some(antecedent_support), Some(consequent_support)) =
                    (frequent.support(&antecedent), frequent.support(&consequent))
                else {
                    continue;
                };

                considered += 1;
                let metrics =
                    RuleMetrics::compute(antecedent_support, consequent_support, itemset.support);
                if metrics.confidence >= min_confidence {
                    rules.push(Rule {
                        antecedent,
                        consequent,
                        antecedent_support,
                        consequent_support,
                        metrics,
                    });
                }
            }
        }
    }

    debug!(considered, retained = rules.len(), "generated association rules");
    rules
}

/// Index combinations of `r` out of `n`, in lexicographic order
fn combinations(n: usize, r: usize) -> Vec<Vec<usize>> {
    if r == 0 || r > n {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut indices: Vec<usize> = (0..r).collect();
    loop {
        out.push(indices.clone());

        let mut i = r;
        loop {
            if i == 0 {
                return out;
            }
            i -= 1;
            if indices[i] < n - r + i {
                break;
            }
        }
        indices[i] += 1;
        for j in i + 1..r {
            indices[j] = indices[j - 1] + 1;
        }
    }
}
