//! CART fitting and prediction.

use crate::{TreeParams, TreeRead};

/// A fitted binary decision tree.
///
/// Nodes live in an arena; handles are indices into it. The root is always
/// the last node pushed.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    root: usize,
    importances: Vec<f64>,
    n_features: usize,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        counts: [f64; 2],
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        counts: [f64; 2],
    },
}

/// Outcome of evaluating one feature vector against a fitted tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Majority class at the reached leaf (1 = symptom).
    pub class: u32,
    /// Positive-class share of the leaf's (weighted) counts.
    pub probability: f64,
}

impl DecisionTree {
    /// Fits a tree on dense rows `x` with binary labels `y`.
    ///
    /// With `params.balanced` set, rows are weighted inversely to their
    /// class frequency before impurity is computed, matching the balanced
    /// class-weight mode of the original training setup.
    ///
    /// # Errors
    ///
    /// Returns an error on empty input, mismatched lengths, or ragged rows.
    pub fn fit(x: &[Vec<f64>], y: &[bool], params: &TreeParams) -> anyhow::Result<Self> {
        anyhow::ensure!(!x.is_empty(), "no training rows provided");
        anyhow::ensure!(
            x.len() == y.len(),
            "row/label length mismatch: {} rows, {} labels",
            x.len(),
            y.len()
        );

        let n_features = x[0].len();
        anyhow::ensure!(
            x.iter().all(|row| row.len() == n_features),
            "rows have inconsistent feature counts"
        );

        let n = x.len() as f64;
        let positives = y.iter().filter(|&&label| label).count() as f64;
        let negatives = n - positives;
        let (weight_neg, weight_pos) = if params.balanced {
            (
                if negatives > 0.0 { n / (2.0 * negatives) } else { 1.0 },
                if positives > 0.0 { n / (2.0 * positives) } else { 1.0 },
            )
        } else {
            (1.0, 1.0)
        };
        let weights: Vec<f64> = y
            .iter()
            .map(|&label| if label { weight_pos } else { weight_neg })
            .collect();
        let total_weight: f64 = weights.iter().sum();

        let mut builder = Builder {
            x,
            y,
            weights: &weights,
            params,
            nodes: Vec::new(),
            importances: vec![0.0; n_features],
            total_weight,
        };

        let indices: Vec<usize> = (0..x.len()).collect();
        let root = builder.build(indices, 0);

        let mut importances = builder.importances;
        let sum: f64 = importances.iter().sum();
        if sum > 0.0 {
            for value in &mut importances {
                *value /= sum;
            }
        }

        Ok(Self {
            nodes: builder.nodes,
            root,
            importances,
            n_features,
        })
    }

    /// Evaluates one feature vector. Traversal goes left when the tested
    /// feature value is less than or equal to the threshold.
    #[must_use]
    pub fn predict(&self, features: &[f64]) -> Prediction {
        let mut node = self.root;
        loop {
            match &self.nodes[node] {
                Node::Leaf { counts } => return leaf_prediction(*counts),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Normalized Gini importance per feature (sums to 1 when the tree has
    /// at least one split, all zeros otherwise).
    #[must_use]
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    /// Number of features the tree was fitted on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of nodes in the fitted tree.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

fn leaf_prediction(counts: [f64; 2]) -> Prediction {
    let total = counts[0] + counts[1];
    Prediction {
        class: u32::from(counts[1] > counts[0]),
        probability: if total > 0.0 { counts[1] / total } else { 0.0 },
    }
}

impl TreeRead for DecisionTree {
    type Node = usize;

    fn root(&self) -> usize {
        self.root
    }

    fn is_leaf(&self, node: usize) -> bool {
        matches!(self.nodes[node], Node::Leaf { .. })
    }

    fn split_feature(&self, node: usize) -> usize {
        match &self.nodes[node] {
            Node::Split { feature, .. } => *feature,
            Node::Leaf { .. } => panic!("split_feature called on a leaf"),
        }
    }

    fn threshold(&self, node: usize) -> f64 {
        match &self.nodes[node] {
            Node::Split { threshold, .. } => *threshold,
            Node::Leaf { .. } => panic!("threshold called on a leaf"),
        }
    }

    fn children(&self, node: usize) -> (usize, usize) {
        match &self.nodes[node] {
            Node::Split { left, right, .. } => (*left, *right),
            Node::Leaf { .. } => panic!("children called on a leaf"),
        }
    }

    fn class_counts(&self, node: usize) -> [f64; 2] {
        match &self.nodes[node] {
            Node::Leaf { counts } | Node::Split { counts, .. } => *counts,
        }
    }
}

struct Builder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [bool],
    weights: &'a [f64],
    params: &'a TreeParams,
    nodes: Vec<Node>,
    importances: Vec<f64>,
    total_weight: f64,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    score: f64,
    left_counts: [f64; 2],
    right_counts: [f64; 2],
}

impl Builder<'_> {
    fn build(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&indices);
        let node_weight = counts[0] + counts[1];
        let node_gini = gini(counts);

        let pure = counts[0] == 0.0 || counts[1] == 0.0;
        let can_split = !pure
            && depth < self.params.max_depth
            && indices.len() >= self.params.min_samples_split;

        if can_split {
            if let Some(candidate) = self.best_split(&indices) {
                let left_weight = candidate.left_counts[0] + candidate.left_counts[1];
                let right_weight = candidate.right_counts[0] + candidate.right_counts[1];
                // Weighted impurity decrease, accumulated per feature.
                let decrease = node_weight / self.total_weight
                    * (node_gini
                        - left_weight / node_weight * gini(candidate.left_counts)
                        - right_weight / node_weight * gini(candidate.right_counts));
                self.importances[candidate.feature] += decrease;

                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .copied()
                    .partition(|&i| self.x[i][candidate.feature] <= candidate.threshold);

                let left = self.build(left_idx, depth + 1);
                let right = self.build(right_idx, depth + 1);

                self.nodes.push(Node::Split {
                    feature: candidate.feature,
                    threshold: candidate.threshold,
                    left,
                    right,
                    counts,
                });
                return self.nodes.len() - 1;
            }
        }

        self.nodes.push(Node::Leaf { counts });
        self.nodes.len() - 1
    }

    fn class_counts(&self, indices: &[usize]) -> [f64; 2] {
        let mut counts = [0.0, 0.0];
        for &i in indices {
            counts[usize::from(self.y[i])] += self.weights[i];
        }
        counts
    }

    /// Exhaustive best-split search: every feature, every boundary between
    /// distinct sorted values, midpoint threshold, weighted Gini score.
    /// Ties keep the first candidate found, so fitting is deterministic.
    fn best_split(&self, indices: &[usize]) -> Option<SplitCandidate> {
        let n_features = self.importances.len();
        let node_counts = self.class_counts(indices);
        let node_weight = node_counts[0] + node_counts[1];
        let mut best: Option<SplitCandidate> = None;

        for feature in 0..n_features {
            let mut ordered: Vec<usize> = indices.to_vec();
            ordered.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let mut left_counts = [0.0, 0.0];
            for i in 1..ordered.len() {
                let prev = ordered[i - 1];
                left_counts[usize::from(self.y[prev])] += self.weights[prev];

                let prev_value = self.x[prev][feature];
                let value = self.x[ordered[i]][feature];
                if value <= prev_value {
                    continue;
                }
                if i < self.params.min_samples_leaf
                    || ordered.len() - i < self.params.min_samples_leaf
                {
                    continue;
                }

                let right_counts = [
                    node_counts[0] - left_counts[0],
                    node_counts[1] - left_counts[1],
                ];
                let left_weight = left_counts[0] + left_counts[1];
                let right_weight = right_counts[0] + right_counts[1];
                let score = (left_weight * gini(left_counts)
                    + right_weight * gini(right_counts))
                    / node_weight;

                if best.as_ref().map_or(true, |b| score < b.score) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: (prev_value + value) / 2.0,
                        score,
                        left_counts,
                        right_counts,
                    });
                }
            }
        }

        best
    }
}

fn gini(counts: [f64; 2]) -> f64 {
    let total = counts[0] + counts[1];
    if total <= 0.0 {
        return 0.0;
    }
    let p0 = counts[0] / total;
    let p1 = counts[1] / total;
    1.0 - p0 * p0 - p1 * p1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shallow_params() -> TreeParams {
        TreeParams {
            max_depth: 4,
            min_samples_split: 2,
            min_samples_leaf: 1,
            balanced: true,
        }
    }

    /// Rows where the label is decided purely by the first feature.
    fn separable_data() -> (Vec<Vec<f64>>, Vec<bool>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..20 {
            let value = f64::from(i);
            x.push(vec![value, 1.0]);
            y.push(value >= 10.0);
        }
        (x, y)
    }

    #[test]
    fn test_fit_rejects_empty_input() {
        assert!(DecisionTree::fit(&[], &[], &shallow_params()).is_err());
    }

    #[test]
    fn test_fit_rejects_length_mismatch() {
        let x = vec![vec![1.0], vec![2.0]];
        assert!(DecisionTree::fit(&x, &[true], &shallow_params()).is_err());
    }

    #[test]
    fn test_separable_data_is_learned() {
        let (x, y) = separable_data();
        let tree = DecisionTree::fit(&x, &y, &shallow_params()).unwrap();

        for (row, &label) in x.iter().zip(&y) {
            let prediction = tree.predict(row);
            assert_eq!(prediction.class, u32::from(label));
        }
    }

    #[test]
    fn test_pure_labels_yield_single_leaf() {
        let x = vec![vec![1.0], vec![2.0], vec![3.0]];
        let y = vec![true, true, true];
        let tree = DecisionTree::fit(&x, &y, &shallow_params()).unwrap();

        assert_eq!(tree.n_nodes(), 1);
        let prediction = tree.predict(&[2.0]);
        assert_eq!(prediction.class, 1);
        assert!((prediction.probability - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_importances_normalized() {
        let (x, y) = separable_data();
        let tree = DecisionTree::fit(&x, &y, &shallow_params()).unwrap();

        let sum: f64 = tree.feature_importances().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        // Only the first feature carries signal.
        assert!(tree.feature_importances()[0] > tree.feature_importances()[1]);
    }

    #[test]
    fn test_min_samples_leaf_blocks_tiny_splits() {
        let x = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let y = vec![false, false, false, true];
        let params = TreeParams {
            max_depth: 4,
            min_samples_split: 2,
            min_samples_leaf: 2,
            balanced: false,
        };
        let tree = DecisionTree::fit(&x, &y, &params).unwrap();

        // The only useful split isolates a single positive row, which
        // min_samples_leaf forbids; the lone legal split (2|2) survives.
        assert!(tree.n_nodes() <= 3);
    }

    #[test]
    fn test_balanced_weights_in_leaf_counts() {
        // 9:1 imbalance; with balancing both classes carry weight n/2.
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..10 {
            x.push(vec![f64::from(i)]);
            y.push(i == 9);
        }
        let tree = DecisionTree::fit(&x, &y, &shallow_params()).unwrap();

        let counts = tree.class_counts(tree.root());
        assert!((counts[0] - 5.0).abs() < 1e-9);
        assert!((counts[1] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_traversal_direction_at_threshold() {
        let (x, y) = separable_data();
        let tree = DecisionTree::fit(&x, &y, &shallow_params()).unwrap();

        // Threshold between 9 and 10 is 9.5; a value exactly at the
        // threshold goes left (negative side).
        assert_eq!(tree.predict(&[9.5, 1.0]).class, 0);
        assert_eq!(tree.predict(&[9.6, 1.0]).class, 1);
    }
}
