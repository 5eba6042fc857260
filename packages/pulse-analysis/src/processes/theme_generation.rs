use crate::error::{AnalysisError, Result};
use crate::process::{Process, ProcessContext, ProcessId, ProcessOutput};
use crate::processes::THEME_GENERATION;
use crate::results::ThemeGenerationResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

/// Generate themes describing the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeGeneration {
    pub min_themes: usize,
    pub max_themes: usize,
    pub fast: Option<bool>,
}

impl Default for ThemeGeneration {
    fn default() -> Self {
        Self {
            min_themes: 2,
            max_themes: 50,
            fast: None,
        }
    }
}

impl ThemeGeneration {
    pub fn new(min_themes: usize, max_themes: usize) -> Self {
        Self {
            min_themes,
            max_themes,
            fast: None,
        }
    }

    pub fn with_fast(mut self, fast: bool) -> Self {
        self.fast = Some(fast);
        self
    }
}

#[async_trait]
impl Process for ThemeGeneration {
    fn id(&self) -> ProcessId {
        ProcessId::from(THEME_GENERATION)
    }

    fn public_config(&self) -> serde_json::Value {
        json!({
            "min_themes": self.min_themes,
            "max_themes": self.max_themes,
            "fast": self.fast,
        })
    }

    fn fast(&self) -> Option<bool> {
        self.fast
    }

    fn validate(&self) -> Result<()> {
        if self.min_themes > self.max_themes {
            return Err(AnalysisError::configuration(format!(
                "min_themes ({}) exceeds max_themes ({})",
                self.min_themes, self.max_themes
            )));
        }
        Ok(())
    }

    async fn run(&self, ctx: &ProcessContext<'_>) -> Result<ProcessOutput> {
        let response = ctx
            .client()?
            .generate_themes(ctx.dataset(), self.min_themes, self.max_themes, ctx.fast())
            .await?;
        debug!("theme_generation: {} themes", response.themes.len());

        Ok(ProcessOutput::ThemeGeneration(ThemeGenerationResult {
            texts: ctx.dataset().to_vec(),
            themes: response.themes,
        }))
    }
}
