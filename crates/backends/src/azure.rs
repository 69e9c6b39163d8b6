//! Azure OpenAI chat-completions client used for script writing.

use serde::{Deserialize, Serialize};

use crate::config::AzureConfig;
use crate::error::BackendError;
use crate::http::parse_json;

/// HTTP client for one Azure OpenAI deployment.
pub struct AzureTextClient {
    client: reqwest::Client,
    config: AzureConfig,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl AzureTextClient {
    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: AzureConfig) -> Self {
        Self { client, config }
    }

    /// `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version=...`
    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment,
            self.config.api_version,
        )
    }

    /// Send a system + user prompt and return the first choice's text.
    pub async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, BackendError> {
        let body = ChatRequest {
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
        };

        let response = self
            .client
            .post(self.completions_url())
            .header("api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let completion: ChatResponse = parse_json(response).await?;
        first_choice_text(completion)
    }
}

fn first_choice_text(completion: ChatResponse) -> Result<String, BackendError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| BackendError::InvalidResponse("completion contained no text".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn client() -> AzureTextClient {
        AzureTextClient::with_client(
            reqwest::Client::new(),
            AzureConfig {
                api_key: "k".into(),
                endpoint: "https://studio.openai.azure.com/".into(),
                api_version: "2024-06-01".into(),
                deployment: "scriptwriter".into(),
            },
        )
    }

    #[test]
    fn completions_url_targets_the_deployment() {
        assert_eq!(
            client().completions_url(),
            "https://studio.openai.azure.com/openai/deployments/scriptwriter/chat/completions?api-version=2024-06-01"
        );
    }

    #[test]
    fn first_choice_is_trimmed() {
        let completion: ChatResponse = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "  Hello world.\n"}}]
        }))
        .unwrap();
        assert_eq!(first_choice_text(completion).unwrap(), "Hello world.");
    }

    #[test]
    fn empty_completion_is_invalid() {
        let completion: ChatResponse =
            serde_json::from_value(serde_json::json!({"choices": []})).unwrap();
        assert_matches!(
            first_choice_text(completion),
            Err(BackendError::InvalidResponse(_))
        );
    }
}
