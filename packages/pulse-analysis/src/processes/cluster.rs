use crate::error::Result;
use crate::process::{Process, ProcessContext, ProcessId, ProcessOutput};
use crate::processes::CLUSTER;
use crate::results::ClusterResult;
use async_trait::async_trait;
use pulse_core::{compare_similarity, SimilarityOptions};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Pairwise self-similarity of the dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterProcess {
    pub fast: Option<bool>,
}

impl ClusterProcess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fast(mut self, fast: bool) -> Self {
        self.fast = Some(fast);
        self
    }
}

#[async_trait]
impl Process for ClusterProcess {
    fn id(&self) -> ProcessId {
        ProcessId::from(CLUSTER)
    }

    fn public_config(&self) -> serde_json::Value {
        json!({ "fast": self.fast })
    }

    fn fast(&self) -> Option<bool> {
        self.fast
    }

    async fn run(&self, ctx: &ProcessContext<'_>) -> Result<ProcessOutput> {
        let options = SimilarityOptions {
            flatten: false,
            fast: ctx.fast(),
        };
        let similarity =
            compare_similarity(ctx.client()?, ctx.batching(), ctx.dataset(), None, options).await?;

        Ok(ProcessOutput::Cluster(ClusterResult {
            texts: ctx.dataset().to_vec(),
            matrix: similarity.into_matrix(),
        }))
    }
}
