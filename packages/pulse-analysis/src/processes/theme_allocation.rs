use crate::error::Result;
use crate::process::{Process, ProcessContext, ProcessId, ProcessOutput};
use crate::processes::{THEME_ALLOCATION, THEME_GENERATION};
use crate::results::ThemeAllocationResult;
use async_trait::async_trait;
use pulse_core::{compare_similarity, SimilarityOptions};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

/// Score every text against a set of themes.
///
/// With no static `themes`, the labels come from `theme_generation`, which
/// the engine injects with its default configuration when it isn't listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeAllocation {
    pub themes: Option<Vec<String>>,
    pub single_label: bool,
    pub threshold: f64,
    pub fast: Option<bool>,
}

impl Default for ThemeAllocation {
    fn default() -> Self {
        Self {
            themes: None,
            single_label: true,
            threshold: 0.5,
            fast: None,
        }
    }
}

impl ThemeAllocation {
    pub fn with_themes<S: Into<String>>(themes: impl IntoIterator<Item = S>) -> Self {
        Self {
            themes: Some(themes.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn single_label(mut self, single_label: bool) -> Self {
        self.single_label = single_label;
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_fast(mut self, fast: bool) -> Self {
        self.fast = Some(fast);
        self
    }
}

#[async_trait]
impl Process for ThemeAllocation {
    fn id(&self) -> ProcessId {
        ProcessId::from(THEME_ALLOCATION)
    }

    fn dependencies(&self) -> Vec<ProcessId> {
        match self.themes {
            Some(_) => Vec::new(),
            None => vec![ProcessId::from(THEME_GENERATION)],
        }
    }

    fn public_config(&self) -> serde_json::Value {
        json!({
            "themes": self.themes,
            "single_label": self.single_label,
            "threshold": self.threshold,
            "fast": self.fast,
        })
    }

    fn fast(&self) -> Option<bool> {
        self.fast
    }

    async fn run(&self, ctx: &ProcessContext<'_>) -> Result<ProcessOutput> {
        let labels = match &self.themes {
            Some(themes) => themes.clone(),
            None => ctx.results().theme_generation()?.labels(),
        };
        debug!(
            "theme_allocation: {} texts x {} themes",
            ctx.dataset().len(),
            labels.len()
        );

        let options = SimilarityOptions {
            flatten: false,
            fast: ctx.fast(),
        };
        let similarity = compare_similarity(
            ctx.client()?,
            ctx.batching(),
            ctx.dataset(),
            Some(labels.as_slice()),
            options,
        )
        .await?;

        let result = ThemeAllocationResult::new(
            ctx.dataset().to_vec(),
            labels,
            similarity.into_matrix(),
            self.single_label,
            self.threshold,
        )?;
        Ok(ProcessOutput::ThemeAllocation(result))
    }
}
