//! Wire models exchanged with the remote NLP service
//!
//! Only the fields this crate reads are modelled; everything else in the
//! service's responses is ignored during deserialization.

use crate::error::{CoreError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Generated (or caller-supplied) theme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub short_label: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub representatives: Vec<String>,
}

impl Theme {
    /// Theme known only by its label (static allocation themes)
    pub fn from_label(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            short_label: label.clone(),
            label,
            description: String::new(),
            representatives: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemesResponse {
    pub themes: Vec<Theme>,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub sentiment: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentResponse {
    pub results: Vec<SentimentResult>,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Embedding of one input text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingDocument {
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    pub vector: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingsResponse {
    pub embeddings: Vec<EmbeddingDocument>,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl EmbeddingsResponse {
    /// Stack the vectors into a `texts x dims` matrix.
    ///
    /// Fails when the document count differs from `expected` or the vectors
    /// have different lengths.
    pub fn into_matrix(self, expected: usize) -> Result<Array2<f64>> {
        if self.embeddings.len() != expected {
            return Err(CoreError::shape_mismatch(
                "embedding documents",
                expected,
                self.embeddings.len(),
            ));
        }
        let dims = self.embeddings.first().map_or(0, |doc| doc.vector.len());
        let mut values = Vec::with_capacity(expected * dims);
        for (index, doc) in self.embeddings.into_iter().enumerate() {
            if doc.vector.len() != dims {
                return Err(CoreError::shape_mismatch(
                    format!("embedding {}", index),
                    dims,
                    doc.vector.len(),
                ));
            }
            values.extend(doc.vector);
        }
        Array2::from_shape_vec((expected, dims), values)
            .map_err(|e| CoreError::shape_mismatch("embedding values", expected * dims, e))
    }
}

/// Block result for one similarity body.
///
/// The service returns either a nested `matrix` or, for `flatten` bodies, a
/// row-major `flattened` vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityResponse {
    #[serde(default)]
    pub matrix: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub flattened: Option<Vec<f64>>,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl SimilarityResponse {
    pub fn from_matrix(matrix: Vec<Vec<f64>>) -> Self {
        Self {
            matrix: Some(matrix),
            ..Default::default()
        }
    }

    pub fn from_flattened(flattened: Vec<f64>) -> Self {
        Self {
            flattened: Some(flattened),
            ..Default::default()
        }
    }

    /// Convert to a block of exactly `rows x cols`
    pub fn into_block(self, rows: usize, cols: usize) -> Result<Array2<f64>> {
        let values = match (self.matrix, self.flattened) {
            (Some(matrix), _) => {
                if matrix.len() != rows {
                    return Err(CoreError::shape_mismatch(
                        "similarity rows",
                        rows,
                        matrix.len(),
                    ));
                }
                let mut values = Vec::with_capacity(rows * cols);
                for (index, row) in matrix.into_iter().enumerate() {
                    if row.len() != cols {
                        return Err(CoreError::shape_mismatch(
                            format!("similarity row {}", index),
                            cols,
                            row.len(),
                        ));
                    }
                    values.extend(row);
                }
                values
            }
            (None, Some(flattened)) => flattened,
            (None, None) => {
                return Err(CoreError::remote(
                    "compare_similarity",
                    "response carries neither matrix nor flattened values",
                ))
            }
        };

        let found = values.len();
        Array2::from_shape_vec((rows, cols), values).map_err(|_| {
            CoreError::shape_mismatch("similarity values", rows * cols, found)
        })
    }
}
