use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::ModelError;

/// Bijection between class index and disease name.
///
/// Read from `{"classes": [...]}` or a bare JSON array, in the order the
/// training pipeline's encoder assigned indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EncoderDocument {
    Wrapped { classes: Vec<String> },
    Bare(Vec<String>),
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self, ModelError> {
        if classes.is_empty() {
            return Err(ModelError::Encoder("no classes".to_string()));
        }
        let mut seen = HashSet::with_capacity(classes.len());
        for class in &classes {
            if class.is_empty() {
                return Err(ModelError::Encoder("empty class name".to_string()));
            }
            if !seen.insert(class.as_str()) {
                return Err(ModelError::Encoder(format!("duplicate class '{class}'")));
            }
        }
        Ok(Self { classes })
    }

    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document: EncoderDocument =
            serde_json::from_slice(&bytes).map_err(|source| ModelError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        let classes = match document {
            EncoderDocument::Wrapped { classes } | EncoderDocument::Bare(classes) => classes,
        };
        Self::new(classes)
    }

    pub fn decode(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
