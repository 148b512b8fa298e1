//! Evaluator for gradient-boosted tree ensembles saved in XGBoost's JSON
//! model format (`Booster.save_model("model.json")`).
//!
//! Only the parts needed for inference are read: the trees, their output
//! group, the base score and the objective. Numeric splits only.

use std::path::Path;

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Deserializer};

use crate::error::ModelError;

#[derive(Debug, Deserialize)]
struct XgbDocument {
    learner: XgbLearner,
}

#[derive(Debug, Deserialize)]
struct XgbLearner {
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: XgbGradientBooster,
    learner_model_param: XgbLearnerModelParam,
    objective: XgbObjective,
}

#[derive(Debug, Deserialize)]
struct XgbGradientBooster {
    name: String,
    model: Option<XgbTreeModel>,
}

#[derive(Debug, Deserialize)]
struct XgbTreeModel {
    trees: Vec<XgbTree>,
    tree_info: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct XgbTree {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<u32>,
    split_conditions: Vec<f32>,
    #[serde(deserialize_with = "flags")]
    default_left: Vec<bool>,
    #[serde(default)]
    split_type: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct XgbLearnerModelParam {
    base_score: String,
    #[serde(default)]
    num_class: Option<String>,
    num_feature: String,
}

#[derive(Debug, Deserialize)]
struct XgbObjective {
    name: String,
}

/// `default_left` is written as 0/1 by current releases and as booleans by
/// some older ones.
fn flags<'de, D>(deserializer: D) -> Result<Vec<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(u8),
    }

    let raw = Vec::<Flag>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|flag| match flag {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        })
        .collect())
}

/// Parameters are stored as strings, scalars sometimes wrapped as `"[5E-1]"`.
fn parse_param<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, ModelError> {
    let mut values = parse_list(name, raw)?;
    match (values.pop(), values.is_empty()) {
        (Some(value), true) => Ok(value),
        _ => Err(ModelError::Malformed(format!("{name} = {raw:?} is not a scalar"))),
    }
}

/// `base_score` is a scalar in older exports and one entry per output group
/// (`"[2.5E-1,5E-1,2.5E-1]"`) in newer ones.
fn parse_list<T: std::str::FromStr>(name: &str, raw: &str) -> Result<Vec<T>, ModelError> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(trimmed);
    inner
        .split(',')
        .map(|entry| {
            entry
                .trim()
                .parse()
                .map_err(|_| ModelError::Malformed(format!("{name} = {raw:?}")))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// `multi:softprob` / `multi:softmax`: one output group per class.
    Softmax,
    /// `binary:logistic`: one output group, two classes.
    Logistic,
}

impl Objective {
    fn parse(name: &str) -> Result<Self, ModelError> {
        match name {
            "multi:softprob" | "multi:softmax" => Ok(Objective::Softmax),
            "binary:logistic" => Ok(Objective::Logistic),
            other => Err(ModelError::Unsupported(format!("objective {other}"))),
        }
    }

    /// `base_score` is saved in output space; margins start from its
    /// inverse link. Softmax keeps it as is, logistic takes the logit.
    fn prob_to_margin(self, score: f32) -> Result<f32, ModelError> {
        match self {
            Objective::Softmax if score.is_finite() => Ok(score),
            Objective::Logistic if score > 0.0 && score < 1.0 => {
                Ok((score / (1.0 - score)).ln())
            }
            _ => Err(ModelError::Malformed(format!(
                "base_score {score} is out of range for {self:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    left: i32,
    right: i32,
    feature: usize,
    /// Split threshold, or the leaf weight when `left == -1`.
    value: f32,
    default_left: bool,
}

impl Node {
    fn is_leaf(&self) -> bool {
        self.left == -1
    }
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_xgb(index: usize, raw: XgbTree, num_feature: usize) -> Result<Self, ModelError> {
        let len = raw.left_children.len();
        if len == 0 {
            return Err(ModelError::Malformed(format!("tree {index} has no nodes")));
        }
        if raw.right_children.len() != len
            || raw.split_indices.len() != len
            || raw.split_conditions.len() != len
            || raw.default_left.len() != len
        {
            return Err(ModelError::Malformed(format!(
                "tree {index} has node arrays of different lengths"
            )));
        }
        if raw.split_type.iter().any(|kind| *kind != 0) {
            return Err(ModelError::Unsupported(format!(
                "categorical splits in tree {index}"
            )));
        }

        let mut nodes = Vec::with_capacity(len);
        for id in 0..len {
            let node = Node {
                left: raw.left_children[id],
                right: raw.right_children[id],
                feature: raw.split_indices[id] as usize,
                value: raw.split_conditions[id],
                default_left: raw.default_left[id],
            };

            if !node.is_leaf() {
                // Children always come after their parent, which also rules out cycles.
                for child in [node.left, node.right] {
                    if child <= id as i32 || child as usize >= len {
                        return Err(ModelError::Malformed(format!(
                            "tree {index} node {id} points at child {child}"
                        )));
                    }
                }
                if node.feature >= num_feature {
                    return Err(ModelError::Malformed(format!(
                        "tree {index} node {id} splits on feature {} of {num_feature}",
                        node.feature
                    )));
                }
            }
            nodes.push(node);
        }

        Ok(Tree { nodes })
    }

    fn leaf_value(&self, row: &[f32]) -> f32 {
        let mut id = 0usize;
        loop {
            let node = &self.nodes[id];
            if node.is_leaf() {
                return node.value;
            }
            let value = row[node.feature];
            let go_left = if value.is_nan() {
                node.default_left
            } else {
                value < node.value
            };
            let next = if go_left { node.left } else { node.right };
            id = next as usize;
        }
    }
}

/// A loaded tree ensemble.
#[derive(Debug, Clone)]
pub struct Booster {
    feature_names: Vec<String>,
    num_feature: usize,
    num_groups: usize,
    objective: Objective,
    /// Starting margin of each output group.
    base_margin: Vec<f32>,
    trees: Vec<Tree>,
    tree_groups: Vec<usize>,
}

impl Booster {
    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(&bytes).map_err(|err| match err {
            ModelError::Decode { source, .. } => ModelError::Decode {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let document: XgbDocument =
            serde_json::from_slice(bytes).map_err(|source| ModelError::Decode {
                path: Default::default(),
                source,
            })?;
        Self::from_document(document)
    }

    fn from_document(document: XgbDocument) -> Result<Self, ModelError> {
        let learner = document.learner;

        if learner.gradient_booster.name != "gbtree" {
            return Err(ModelError::Unsupported(format!(
                "booster {}",
                learner.gradient_booster.name
            )));
        }
        let model = learner
            .gradient_booster
            .model
            .ok_or_else(|| ModelError::Malformed("gbtree without model".to_string()))?;

        let objective = Objective::parse(&learner.objective.name)?;
        let params = learner.learner_model_param;
        let num_feature: usize = parse_param("num_feature", &params.num_feature)?;
        let num_class: usize = match params.num_class.as_deref() {
            Some(raw) => parse_param("num_class", raw)?,
            None => 0,
        };
        let base_score: Vec<f32> = parse_list("base_score", &params.base_score)?;

        let num_groups = match objective {
            Objective::Softmax if num_class < 2 => {
                return Err(ModelError::Malformed(format!(
                    "softmax objective with num_class = {num_class}"
                )));
            }
            Objective::Softmax => num_class,
            Objective::Logistic => 1,
        };
        let base_margin = match base_score.len() {
            1 => vec![objective.prob_to_margin(base_score[0])?; num_groups],
            len if len == num_groups => base_score
                .into_iter()
                .map(|score| objective.prob_to_margin(score))
                .collect::<Result<Vec<_>, _>>()?,
            len => {
                return Err(ModelError::Malformed(format!(
                    "base_score has {len} entries for {num_groups} output groups"
                )));
            }
        };

        if !learner.feature_names.is_empty() && learner.feature_names.len() != num_feature {
            return Err(ModelError::Malformed(format!(
                "{} feature names for {num_feature} features",
                learner.feature_names.len()
            )));
        }
        if model.tree_info.len() != model.trees.len() {
            return Err(ModelError::Malformed(format!(
                "tree_info lists {} trees, model has {}",
                model.tree_info.len(),
                model.trees.len()
            )));
        }
        if let Some(group) = model.tree_info.iter().find(|group| **group >= num_groups) {
            return Err(ModelError::Malformed(format!(
                "tree assigned to group {group} of {num_groups}"
            )));
        }

        let trees = model
            .trees
            .into_iter()
            .enumerate()
            .map(|(index, raw)| Tree::from_xgb(index, raw, num_feature))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            trees = trees.len(),
            num_feature,
            num_groups,
            ?objective,
            "decoded gradient-boosted ensemble"
        );

        Ok(Booster {
            feature_names: learner.feature_names,
            num_feature,
            num_groups,
            objective,
            base_margin,
            trees,
            tree_groups: model.tree_info,
        })
    }

    pub fn num_feature(&self) -> usize {
        self.num_feature
    }

    /// Feature names recorded at training time, empty when none were saved.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn num_classes(&self) -> usize {
        match self.objective {
            Objective::Softmax => self.num_groups,
            Objective::Logistic => 2,
        }
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Resolves input columns to model features.
    ///
    /// When the model carries feature names every one of them must appear in
    /// `columns`; otherwise the columns are taken positionally and only their
    /// count is checked.
    pub fn bind(&self, columns: &[&str]) -> Result<ColumnBinding, ModelError> {
        let indices = if self.feature_names.is_empty() {
            if columns.len() != self.num_feature {
                return Err(ModelError::FeatureCount {
                    expected: self.num_feature,
                    actual: columns.len(),
                });
            }
            (0..self.num_feature).collect()
        } else {
            self.feature_names
                .iter()
                .map(|name| {
                    columns
                        .iter()
                        .position(|column| column == name)
                        .ok_or_else(|| ModelError::MissingColumn(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(ColumnBinding {
            indices,
            width: columns.len(),
        })
    }

    /// Raw additive scores, shape `(rows, groups)`. Rows must already be in
    /// model feature order.
    pub fn predict_margin(&self, rows: ArrayView2<'_, f32>) -> Result<Array2<f32>, ModelError> {
        if rows.ncols() != self.num_feature {
            return Err(ModelError::FeatureCount {
                expected: self.num_feature,
                actual: rows.ncols(),
            });
        }

        let mut margins =
            Array2::from_shape_fn((rows.nrows(), self.num_groups), |(_, group)| {
                self.base_margin[group]
            });
        for (row, mut out) in rows.outer_iter().zip(margins.outer_iter_mut()) {
            let row = row.to_vec();
            for (tree, group) in self.trees.iter().zip(&self.tree_groups) {
                out[*group] += tree.leaf_value(&row);
            }
        }
        Ok(margins)
    }

    /// Class probabilities, shape `(rows, classes)`; every row sums to 1.
    pub fn predict_proba(&self, rows: ArrayView2<'_, f32>) -> Result<Array2<f32>, ModelError> {
        let margins = self.predict_margin(rows)?;
        let probabilities = match self.objective {
            Objective::Softmax => {
                let mut probabilities = margins;
                for mut row in probabilities.axis_iter_mut(Axis(0)) {
                    let max = row.fold(f32::NEG_INFINITY, |acc, v| acc.max(*v));
                    row.mapv_inplace(|v| (v - max).exp());
                    let sum = row.sum();
                    row.mapv_inplace(|v| v / sum);
                }
                probabilities
            }
            Objective::Logistic => {
                let mut probabilities = Array2::<f32>::zeros((margins.nrows(), 2));
                for (margin, mut out) in margins.column(0).iter().zip(probabilities.outer_iter_mut()) {
                    let positive = 1.0 / (1.0 + (-margin).exp());
                    out[0] = 1.0 - positive;
                    out[1] = positive;
                }
                probabilities
            }
        };
        Ok(probabilities)
    }
}

/// Mapping from an input frame's columns to the model's feature order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBinding {
    indices: Vec<usize>,
    width: usize,
}

impl ColumnBinding {
    pub fn arrange(&self, values: ArrayView2<'_, f32>) -> Result<Array2<f32>, ModelError> {
        if values.ncols() != self.width {
            return Err(ModelError::FeatureCount {
                expected: self.width,
                actual: values.ncols(),
            });
        }
        Ok(values.select(Axis(1), &self.indices))
    }
}

/// Index of the largest value; ties resolve to the first one.
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (index, value)| match best {
            Some((_, top)) if *value <= top => best,
            _ => Some((index, *value)),
        })
        .map(|(index, _)| index)
}
