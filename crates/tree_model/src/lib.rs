//! Decision-tree classifier for symptom prediction.
//!
//! A small CART implementation (Gini impurity, midpoint thresholds,
//! optional class balancing) plus the split/cross-validation utilities and
//! binary evaluation metrics the training pipeline needs. The export layer
//! never touches the concrete tree type: it sees fitted models only through
//! the [`TreeRead`] capability, so any conforming implementation can be
//! swapped in without touching the serializer.

pub mod metrics;
pub mod split;
mod tree;

pub use tree::{DecisionTree, Prediction};

/// Hyperparameters for tree fitting. These are configuration, not core
/// logic; defaults match the deployed training setup.
#[derive(Debug, Clone)]
pub struct TreeParams {
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Minimum number of rows required to attempt a split.
    pub min_samples_split: usize,
    /// Minimum number of rows on each side of a split.
    pub min_samples_leaf: usize,
    /// Reweight classes inversely to their frequency.
    pub balanced: bool,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 15,
            min_samples_leaf: 5,
            balanced: true,
        }
    }
}

/// Read-only view of a fitted binary decision tree.
///
/// This is the contract between the fitting implementation and the tree
/// serializer. The traversal convention is fixed: a sample goes left when
/// its feature value is less than or equal to the node threshold.
pub trait TreeRead {
    /// Opaque node handle.
    type Node: Copy;

    /// The root node.
    fn root(&self) -> Self::Node;

    /// Whether `node` is a leaf.
    fn is_leaf(&self, node: Self::Node) -> bool;

    /// Index of the feature a split node tests.
    ///
    /// # Panics
    ///
    /// May panic if `node` is a leaf; callers must check [`TreeRead::is_leaf`] first.
    fn split_feature(&self, node: Self::Node) -> usize;

    /// Threshold of a split node.
    ///
    /// # Panics
    ///
    /// May panic if `node` is a leaf; callers must check [`TreeRead::is_leaf`] first.
    fn threshold(&self, node: Self::Node) -> f64;

    /// Left and right children of a split node.
    ///
    /// # Panics
    ///
    /// May panic if `node` is a leaf; callers must check [`TreeRead::is_leaf`] first.
    fn children(&self, node: Self::Node) -> (Self::Node, Self::Node);

    /// Class distribution at `node` as `[negative, positive]` counts.
    /// Counts are sample weights, so they are fractional when class
    /// balancing is enabled.
    fn class_counts(&self, node: Self::Node) -> [f64; 2];
}
