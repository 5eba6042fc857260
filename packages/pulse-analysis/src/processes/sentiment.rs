use crate::error::Result;
use crate::process::{Process, ProcessContext, ProcessId, ProcessOutput};
use crate::processes::SENTIMENT;
use crate::results::SentimentAnalysis;
use async_trait::async_trait;
use pulse_core::CoreError;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Classify the sentiment of every text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentProcess {
    pub fast: Option<bool>,
}

impl SentimentProcess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fast(mut self, fast: bool) -> Self {
        self.fast = Some(fast);
        self
    }
}

#[async_trait]
impl Process for SentimentProcess {
    fn id(&self) -> ProcessId {
        ProcessId::from(SENTIMENT)
    }

    fn public_config(&self) -> serde_json::Value {
        json!({ "fast": self.fast })
    }

    fn fast(&self) -> Option<bool> {
        self.fast
    }

    async fn run(&self, ctx: &ProcessContext<'_>) -> Result<ProcessOutput> {
        let response = ctx
            .client()?
            .analyze_sentiment(ctx.dataset(), ctx.fast())
            .await?;

        if response.results.len() != ctx.dataset().len() {
            return Err(CoreError::shape_mismatch(
                "sentiment results",
                ctx.dataset().len(),
                response.results.len(),
            )
            .into());
        }

        Ok(ProcessOutput::Sentiment(SentimentAnalysis {
            texts: ctx.dataset().to_vec(),
            sentiments: response.results,
        }))
    }
}
