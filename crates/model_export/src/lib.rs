//! Portable decision-tree export for on-device inference.
//!
//! The JSON artifact written here is the sole interface between the trainer
//! and the mobile interpreter, which re-implements evaluation from scratch.
//! Compatibility rests on three fixed conventions:
//!
//! - features are resolved by *name*, in the order the artifact's
//!   `feature_names` list declares;
//! - split traversal goes left when `value <= threshold`;
//! - leaf probability is the positive share of the leaf's class counts.
//!
//! [`evaluate_artifact`] is the reference implementation of the documented
//! traversal; parity tests hold it against direct prediction on the fitted
//! tree.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tree_model::TreeRead;

/// One node of the exported tree. Serialized as the tagged JSON objects the
/// interpreter expects: `{"is_leaf": false, "feature", "threshold", "left",
/// "right"}` or `{"is_leaf": true, "value", "probability"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        is_leaf: bool,
        feature: String,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        is_leaf: bool,
        /// Majority class at the leaf (1 = symptom).
        value: u32,
        /// Positive-class share of the leaf's class counts.
        probability: f64,
    },
}

/// Evaluation metrics embedded in the artifact for staleness checks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ExportMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// The complete per-symptom model artifact, one JSON file per class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub symptom_type: String,
    pub feature_names: Vec<String>,
    pub tree_structure: TreeNode,
    pub metrics: ExportMetrics,
    /// ISO-8601 timestamp of the training run.
    pub training_date: String,
    pub lookback_days: i64,
    pub time_window_hours: i64,
}

/// Outcome of evaluating a feature vector against an exported tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportPrediction {
    pub value: u32,
    pub probability: f64,
}

/// Serializes a fitted tree into the recursive export contract by
/// depth-first traversal, resolving split features to their semantic names.
///
/// # Errors
///
/// Returns an error if a split references a feature index outside
/// `feature_names`.
pub fn serialize_tree<T: TreeRead>(tree: &T, feature_names: &[&str]) -> anyhow::Result<TreeNode> {
    serialize_node(tree, tree.root(), feature_names)
}

fn serialize_node<T: TreeRead>(
    tree: &T,
    node: T::Node,
    feature_names: &[&str],
) -> anyhow::Result<TreeNode> {
    if tree.is_leaf(node) {
        let counts = tree.class_counts(node);
        let total = counts[0] + counts[1];
        return Ok(TreeNode::Leaf {
            is_leaf: true,
            value: u32::from(counts[1] > counts[0]),
            probability: if total > 0.0 { counts[1] / total } else { 0.0 },
        });
    }

    let feature_index = tree.split_feature(node);
    let feature = feature_names
        .get(feature_index)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "split references feature index {feature_index} but only {} names are known",
                feature_names.len()
            )
        })?
        .to_string();

    let (left, right) = tree.children(node);
    Ok(TreeNode::Split {
        is_leaf: false,
        feature,
        threshold: tree.threshold(node),
        left: Box::new(serialize_node(tree, left, feature_names)?),
        right: Box::new(serialize_node(tree, right, feature_names)?),
    })
}

/// Evaluates `values` (ordered per the artifact's `feature_names`) against
/// the exported tree using the documented traversal rule: less-than-or-equal
/// goes left.
///
/// # Errors
///
/// Returns an error if a split names a feature missing from `feature_names`.
pub fn evaluate_artifact(
    artifact: &ModelArtifact,
    values: &[f64],
) -> anyhow::Result<ExportPrediction> {
    anyhow::ensure!(
        values.len() == artifact.feature_names.len(),
        "expected {} feature values, got {}",
        artifact.feature_names.len(),
        values.len()
    );

    let positions: HashMap<&str, usize> = artifact
        .feature_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let mut node = &artifact.tree_structure;
    loop {
        match node {
            TreeNode::Leaf {
                value, probability, ..
            } => {
                return Ok(ExportPrediction {
                    value: *value,
                    probability: *probability,
                })
            }
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
                ..
            } => {
                let index = positions.get(feature.as_str()).ok_or_else(|| {
                    anyhow::anyhow!("split references unknown feature {feature:?}")
                })?;
                node = if values[*index] <= *threshold {
                    left
                } else {
                    right
                };
            }
        }
    }
}

/// Writes one artifact to `<models_dir>/<symptom_type>_predictor.json`,
/// replacing any previous run's file for the same class.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot
/// be written.
pub fn write_artifact(models_dir: &Path, artifact: &ModelArtifact) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(models_dir)?;

    let path = models_dir.join(format!("{}_predictor.json", artifact.symptom_type));
    let json = serde_json::to_string_pretty(artifact)?;
    fs::write(&path, json)?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use tree_model::{DecisionTree, TreeParams};

    use super::*;

    const NAMES: [&str; 3] = ["fat_g", "sugar_g", "is_late_night"];

    fn sample_metrics() -> ExportMetrics {
        ExportMetrics {
            accuracy: 0.9,
            precision: 0.8,
            recall: 0.7,
            f1: 0.75,
        }
    }

    /// Rows whose label depends on two of the three features.
    fn dataset() -> (Vec<Vec<f64>>, Vec<bool>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..60 {
            let fat = f64::from(i % 30);
            let sugar = f64::from((i * 7) % 40);
            let late = f64::from(u32::from(i % 5 == 0));
            x.push(vec![fat, sugar, late]);
            y.push(fat > 15.0 || (sugar > 30.0 && late > 0.0));
        }
        (x, y)
    }

    fn fitted_tree() -> (DecisionTree, Vec<Vec<f64>>, Vec<bool>) {
        let (x, y) = dataset();
        let params = TreeParams {
            max_depth: 6,
            min_samples_split: 4,
            min_samples_leaf: 2,
            balanced: true,
        };
        let tree = DecisionTree::fit(&x, &y, &params).unwrap();
        (tree, x, y)
    }

    fn artifact_for(tree: &DecisionTree) -> ModelArtifact {
        ModelArtifact {
            symptom_type: "pain".to_string(),
            feature_names: NAMES.iter().map(ToString::to_string).collect(),
            tree_structure: serialize_tree(tree, &NAMES).unwrap(),
            metrics: sample_metrics(),
            training_date: "2025-06-04T12:00:00".to_string(),
            lookback_days: 90,
            time_window_hours: 8,
        }
    }

    #[test]
    fn test_round_trip_parity_with_direct_prediction() {
        let (tree, x, _) = fitted_tree();
        let artifact = artifact_for(&tree);

        for row in &x {
            let direct = tree.predict(row);
            let exported = evaluate_artifact(&artifact, row).unwrap();
            assert_eq!(exported.value, direct.class);
            assert!(
                (exported.probability - direct.probability).abs() < 1e-12,
                "probability drifted: {} vs {}",
                exported.probability,
                direct.probability
            );
        }
    }

    #[test]
    fn test_json_round_trip_preserves_predictions() {
        let (tree, x, _) = fitted_tree();
        let artifact = artifact_for(&tree);

        let json = serde_json::to_string(&artifact).unwrap();
        let restored: ModelArtifact = serde_json::from_str(&json).unwrap();

        for row in x.iter().take(10) {
            assert_eq!(
                evaluate_artifact(&artifact, row).unwrap(),
                evaluate_artifact(&restored, row).unwrap()
            );
        }
    }

    #[test]
    fn test_leaf_serialization_shape() {
        let node = TreeNode::Leaf {
            is_leaf: true,
            value: 1,
            probability: 0.75,
        };
        let json: serde_json::Value = serde_json::to_value(&node).unwrap();

        assert_eq!(json["is_leaf"], true);
        assert_eq!(json["value"], 1);
        assert_eq!(json["probability"], 0.75);
    }

    #[test]
    fn test_split_serialization_shape() {
        let node = TreeNode::Split {
            is_leaf: false,
            feature: "fat_g".to_string(),
            threshold: 12.5,
            left: Box::new(TreeNode::Leaf {
                is_leaf: true,
                value: 0,
                probability: 0.1,
            }),
            right: Box::new(TreeNode::Leaf {
                is_leaf: true,
                value: 1,
                probability: 0.9,
            }),
        };
        let json: serde_json::Value = serde_json::to_value(&node).unwrap();

        assert_eq!(json["is_leaf"], false);
        assert_eq!(json["feature"], "fat_g");
        assert_eq!(json["threshold"], 12.5);
        assert_eq!(json["left"]["is_leaf"], true);
        assert_eq!(json["right"]["value"], 1);
    }

    #[test]
    fn test_serialize_rejects_out_of_range_feature() {
        let (tree, _, _) = fitted_tree();
        // Only one name for a tree that splits on up to three features.
        assert!(serialize_tree(&tree, &["fat_g"]).is_err());
    }

    #[test]
    fn test_evaluate_rejects_wrong_arity() {
        let (tree, _, _) = fitted_tree();
        let artifact = artifact_for(&tree);
        assert!(evaluate_artifact(&artifact, &[1.0]).is_err());
    }

    #[test]
    fn test_write_artifact_creates_named_file() {
        let (tree, _, _) = fitted_tree();
        let artifact = artifact_for(&tree);

        let dir = std::env::temp_dir().join("model_export_test_artifacts");
        let path = write_artifact(&dir, &artifact).unwrap();
        assert!(path.ends_with("pain_predictor.json"));

        let restored: ModelArtifact =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(restored.symptom_type, "pain");
        assert_eq!(restored.lookback_days, 90);

        fs::remove_dir_all(&dir).ok();
    }
}
