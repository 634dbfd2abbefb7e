use std::fmt::Write;

use serde_json::Value;

use crate::booster::metrics::sigmoid;
use crate::booster::params::BoosterParams;
use crate::booster::tree::Tree;
use crate::error::Result;

/// A trained model that can be written out as text.
pub trait TextModel {
    fn to_text(&self) -> Result<String>;
}

/// Gradient-boosted tree ensemble for the binary objective.
#[derive(Debug, Clone)]
pub struct GbdtModel {
    pub feature_names: Vec<String>,
    pub feature_infos: Vec<String>,
    /// Log-odds every prediction starts from.
    pub init_score: f64,
    pub trees: Vec<Tree>,
    pub params: BoosterParams,
}

impl GbdtModel {
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Raw log-odds for a row of feature values.
    pub fn predict_raw(&self, features: &[f64]) -> f64 {
        self.init_score + self.trees.iter().map(|t| t.predict(features)).sum::<f64>()
    }

    /// Probability of the positive class.
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        sigmoid(self.predict_raw(features))
    }
}

impl TextModel for GbdtModel {
    /// Header, one block per tree, then the training parameters as JSON.
    ///
    /// The initial score is folded into the first tree's leaves.
    fn to_text(&self) -> Result<String> {
        let mut out = String::new();
        let _ = writeln!(out, "tree");
        let _ = writeln!(out, "version=v3");
        let _ = writeln!(out, "num_class=1");
        let _ = writeln!(out, "num_tree_per_iteration=1");
        let _ = writeln!(out, "label_index=0");
        let _ = writeln!(out, "max_feature_idx={}", self.feature_names.len().saturating_sub(1));
        let _ = writeln!(out, "objective={} sigmoid:1", self.params.objective);
        let _ = writeln!(out, "feature_names={}", self.feature_names.join(" "));
        let _ = writeln!(out, "feature_infos={}", self.feature_infos.join(" "));
        out.push('\n');

        for (idx, tree) in self.trees.iter().enumerate() {
            let bias = if idx == 0 { self.init_score } else { 0.0 };
            tree.write_text(idx, bias, &mut out);
        }

        out.push_str("end of trees\n\n");
        out.push_str("parameters:\n");
        write_parameters(&self.params, &mut out)?;
        out.push_str("end of parameters\n");
        Ok(out)
    }
}

/// One `[name: value]` line per training parameter, lists comma-joined.
fn write_parameters(params: &BoosterParams, out: &mut String) -> Result<()> {
    fn plain(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    if let Value::Object(fields) = serde_json::to_value(params)? {
        for (name, value) in &fields {
            let text = match value {
                Value::Array(items) => items.iter().map(plain).collect::<Vec<_>>().join(","),
                other => plain(other),
            };
            let _ = writeln!(out, "[{}: {}]", name, text);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booster::tree::{Child, SplitNode, SplitRule};

    fn sample_model() -> GbdtModel {
        let stump = Tree {
            splits: vec![SplitNode {
                feature: 0,
                bin: 1,
                threshold: 1.5,
                rule: SplitRule::LessOrEqual,
                gain: 2.0,
                left: Child::Leaf(0),
                right: Child::Leaf(1),
            }],
            leaf_values: vec![-0.5, 0.5],
            leaf_counts: vec![4, 6],
            shrinkage: 0.1,
        };
        GbdtModel {
            feature_names: vec!["a".to_string(), "b".to_string()],
            feature_infos: vec!["[0:3]".to_string(), "0:1".to_string()],
            init_score: 0.25,
            trees: vec![stump.clone(), stump],
            params: BoosterParams::default(),
        }
    }

    #[test]
    fn test_predict_adds_init_score_and_trees() {
        let model = sample_model();
        assert_eq!(model.predict_raw(&[1.0, 0.0]), 0.25 - 1.0);
        assert_eq!(model.predict_raw(&[2.0, 0.0]), 0.25 + 1.0);
        assert!(model.predict_proba(&[2.0, 0.0]) > 0.5);
    }

    #[test]
    fn test_text_layout() {
        let text = sample_model().to_text().unwrap();

        assert!(text.starts_with("tree\nversion=v3\n"));
        assert!(text.contains("objective=binary sigmoid:1\n"));
        assert!(text.contains("feature_names=a b\n"));
        assert!(text.contains("Tree=0\n"));
        assert!(text.contains("Tree=1\n"));
        // Only the first tree carries the initial score.
        assert!(text.contains("leaf_value=-0.25 0.75\n"));
        assert!(text.contains("leaf_value=-0.5 0.5\n"));
        assert!(text.contains("end of trees\n"));
        assert!(text.trim_end().ends_with("end of parameters"));
        assert!(text.contains("[objective: binary]\n"));
        assert!(text.contains("[metric: binary_logloss,auc]\n"));
        assert!(text.contains("[bagging_seed: 3]\n"));
    }

    #[test]
    fn test_categorical_split_written_as_bitset() {
        let mut model = sample_model();
        model.trees[1].splits[0].feature = 1;
        model.trees[1].splits[0].threshold = 1.0;
        model.trees[1].splits[0].rule = SplitRule::CategoryEquals;

        let text = model.to_text().unwrap();
        let second_tree = &text[text.find("Tree=1\n").unwrap()..];

        assert!(second_tree.contains("num_cat=1\n"));
        assert!(second_tree.contains("threshold=0\n"));
        assert!(second_tree.contains("decision_type=1\n"));
        assert!(second_tree.contains("cat_boundaries=0 1\n"));
        assert!(second_tree.contains("cat_threshold=2\n"));
        assert!(model.predict_raw(&[0.0, 1.0]) < model.predict_raw(&[0.0, 0.0]));
    }
}
