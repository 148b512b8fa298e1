//! Small hand-built ensembles shared by the unit tests.

use serde_json::{Value, json};

use crate::schema::FEATURE_NAMES;

pub const CLASSES: [&str; 3] = ["Allergy", "Common Cold", "Influenza"];

fn stump(feature: usize, threshold: f32, left: f32, right: f32) -> Value {
    json!({
        "base_weights": [0.0, left, right],
        "default_left": [1, 0, 0],
        "id": 0,
        "left_children": [1, -1, -1],
        "right_children": [2, -1, -1],
        "parents": [2147483647u32, 0, 0],
        "split_conditions": [threshold, left, right],
        "split_indices": [feature, 0, 0],
        "split_type": [0, 0, 0],
        "tree_param": {"num_deleted": "0", "num_feature": "46", "num_nodes": "3", "size_leaf_vector": "1"}
    })
}

/// Three classes, two boosting rounds.
///
/// Allergy reacts to sneezing and itchiness, Common Cold to runny nose and
/// cough, Influenza to fever and (without fever) age over 60.
pub fn multiclass_model() -> Value {
    let influenza = json!({
        "base_weights": [0.0, 0.0, 0.5, -0.3, 0.1],
        "default_left": [1, 1, 0, 0, 0],
        "id": 2,
        "left_children": [1, 3, -1, -1, -1],
        "right_children": [2, 4, -1, -1, -1],
        "parents": [2147483647u32, 0, 0, 1, 1],
        "split_conditions": [0.5, 60.0, 0.5, -0.3, 0.1],
        "split_indices": [6, 0, 0, 0, 0],
        "split_type": [0, 0, 0, 0, 0],
        "tree_param": {"num_deleted": "0", "num_feature": "46", "num_nodes": "5", "size_leaf_vector": "1"}
    });
    let influenza_leaf = json!({
        "base_weights": [0.05],
        "default_left": [0],
        "id": 5,
        "left_children": [-1],
        "right_children": [-1],
        "parents": [2147483647u32],
        "split_conditions": [0.05],
        "split_indices": [0],
        "split_type": [0],
        "tree_param": {"num_deleted": "0", "num_feature": "46", "num_nodes": "1", "size_leaf_vector": "1"}
    });

    let feature_names = FEATURE_NAMES.to_vec();
    let feature_types = vec!["float"; FEATURE_NAMES.len()];

    json!({
        "learner": {
            "attributes": {},
            "feature_names": feature_names,
            "feature_types": feature_types,
            "gradient_booster": {
                "model": {
                    "gbtree_model_param": {"num_parallel_tree": "1", "num_trees": "6"},
                    "iteration_indptr": [0, 3, 6],
                    "tree_info": [0, 1, 2, 0, 1, 2],
                    "trees": [
                        stump(34, 0.5, -0.2, 0.4),
                        stump(11, 0.5, -0.1, 0.3),
                        influenza,
                        stump(44, 0.5, -0.05, 0.25),
                        stump(7, 0.5, 0.0, 0.2),
                        influenza_leaf
                    ]
                },
                "name": "gbtree"
            },
            "learner_model_param": {
                "base_score": "5E-1",
                "boost_from_average": "1",
                "num_class": "3",
                "num_feature": "46",
                "num_target": "1"
            },
            "objective": {
                "name": "multi:softprob",
                "softmax_multiclass_param": {"num_class": "3"}
            }
        },
        "version": [2, 0, 3]
    })
}

pub fn multiclass_model_bytes() -> Vec<u8> {
    serde_json::to_vec(&multiclass_model()).unwrap()
}

/// Two unnamed features, one stump on the first.
pub fn binary_model() -> Value {
    json!({
        "learner": {
            "gradient_booster": {
                "model": {
                    "tree_info": [0],
                    "trees": [{
                        "default_left": [true, false, false],
                        "left_children": [1, -1, -1],
                        "right_children": [2, -1, -1],
                        "split_conditions": [0.5, -0.8, 0.8],
                        "split_indices": [0, 0, 0]
                    }]
                },
                "name": "gbtree"
            },
            "learner_model_param": {"base_score": "[5E-1]", "num_class": "0", "num_feature": "2"},
            "objective": {"name": "binary:logistic"}
        },
        "version": [1, 7, 6]
    })
}

pub fn binary_model_bytes() -> Vec<u8> {
    serde_json::to_vec(&binary_model()).unwrap()
}

pub fn encoder() -> Value {
    json!({ "classes": CLASSES })
}
