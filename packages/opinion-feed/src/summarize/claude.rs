//! Summaries from the Anthropic Messages API.

use anthropic_client::{AnthropicClient, Message, MessagesRequest};
use async_trait::async_trait;

use super::prompts::{summary_user_prompt, SUMMARY_SYSTEM_PROMPT};
use super::{SummaryRequest, Summarizer};
use crate::error::SummaryFailure;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// [`Summarizer`] backed by Claude.
#[derive(Debug, Clone)]
pub struct ClaudeSummarizer {
    client: AnthropicClient,
    model: String,
    max_tokens: u32,
}

impl ClaudeSummarizer {
    pub fn new(client: AnthropicClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_request(&self, request: &SummaryRequest) -> MessagesRequest {
        MessagesRequest::new(self.model.clone(), self.max_tokens)
            .system(SUMMARY_SYSTEM_PROMPT)
            .message(Message::user(summary_user_prompt(request)))
    }
}

#[async_trait]
impl Summarizer for ClaudeSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummaryFailure> {
        let response = self
            .client
            .messages(self.build_request(request))
            .await
            .map_err(SummaryFailure::summarize)?;
        Ok(response.text())
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_request_shape() {
        let summarizer = ClaudeSummarizer::new(AnthropicClient::new("sk-ant-test"), DEFAULT_MODEL);
        let request = summarizer.build_request(&SummaryRequest {
            court_name: "First District Court of Appeal".into(),
            case_number: "1D2024-0001".into(),
            case_name: "A v. B".into(),
            date_filed: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            excerpt: "text".into(),
        });

        assert_eq!(request.model, DEFAULT_MODEL);
        assert_eq!(request.max_tokens, 500);
        assert_eq!(request.system.as_deref(), Some(SUMMARY_SYSTEM_PROMPT));
        assert_eq!(request.messages.len(), 1);
        assert!(request.messages[0].content.contains("Case Number: 1D2024-0001"));
    }
}
