//! HTTP client for the Backboard backend
//!
//! All prompt traffic travels as query parameters on bodiless POSTs:
//!
//! | Endpoint | Purpose |
//! |----------|---------|
//! | `POST /messages/query` | Answer plus retrieved sources |
//! | `POST /messages/send` | Answer or tool result for `@directive` prompts |
//! | `GET /` | Health check, `{"status": "ok"}` |
//! | `GET /system/status` | Per-source connection state |
//! | `GET /activity` | Recent ingestion activity |

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::classify::SourceClassifier;
use crate::config::{BackendConfig, Config};
use crate::error::{Error, Result};
use crate::tools::ToolDirective;
use crate::types::{ActivityItem, ChatMessage, FileContext, SystemStatus};

use super::prompt::build_prompt;
use super::reply::{BackendReply, SendReply};

/// Response from GET /
#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

/// HTTP client for the Backboard backend
pub struct BackboardClient {
    http_client: reqwest::Client,
    base_url: String,
    client_id: String,
    classifier: SourceClassifier,
}

impl BackboardClient {
    /// Create a new client from backend settings
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &BackendConfig, classifier: SourceClassifier) -> Result<Self> {
        config.validate()?;

        let base_url = config.api_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            client_id: config.client_id.clone(),
            classifier,
        })
    }

    /// Create a client using the backend and classifier sections of `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.backend,
            SourceClassifier::from_config(&config.classifier),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Ask a question and get an answer with classified sources.
    ///
    /// Never fails: transport errors and non-2xx statuses come back as an
    /// assistant message explaining what went wrong.
    pub async fn query(&self, prompt: &str, context: Option<&FileContext>) -> ChatMessage {
        match self.try_query(prompt, context).await {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Backend query failed: {}", e);
                self.error_message(&e)
            }
        }
    }

    /// [`query`](Self::query) without the error-to-message conversion
    pub async fn try_query(
        &self,
        prompt: &str,
        context: Option<&FileContext>,
    ) -> Result<ChatMessage> {
        let content = build_prompt(prompt, context);
        let body = self.post_message("messages/query", &content).await?;
        Ok(self.message_from_reply(&body))
    }

    /// Send a prompt to `/messages/send`, which answers in plain text or with a
    /// structured tool result. Failures become assistant messages, as in
    /// [`query`](Self::query).
    pub async fn send(&self, prompt: &str, context: Option<&FileContext>) -> ChatMessage {
        match self.try_send(prompt, context).await {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Backend send failed: {}", e);
                self.error_message(&e)
            }
        }
    }

    /// [`send`](Self::send) without the error-to-message conversion
    pub async fn try_send(
        &self,
        prompt: &str,
        context: Option<&FileContext>,
    ) -> Result<ChatMessage> {
        let content = build_prompt(prompt, context);
        let body = self.post_message("messages/send", &content).await?;

        let reply = SendReply::decode(&body);
        let message = ChatMessage::assistant(reply.display_text());
        Ok(match reply {
            SendReply::Tool(tool) => {
                tracing::info!(tool = %tool.tool, "Received tool result");
                message.with_tool_result(tool)
            }
            SendReply::Text(_) => message,
        })
    }

    /// Route a prompt: tool directives go to `send`, everything else to `query`.
    pub async fn dispatch(&self, prompt: &str, context: Option<&FileContext>) -> ChatMessage {
        match ToolDirective::parse(prompt) {
            Some(directive) => {
                tracing::debug!(tool = %directive.name, "Prompt carries a tool directive");
                self.send(prompt, context).await
            }
            None => self.query(prompt, context).await,
        }
    }

    /// Normalize a query reply body into an assistant message
    pub fn message_from_reply(&self, body: &str) -> ChatMessage {
        let reply = BackendReply::decode(body).normalize();
        let sources = self.classifier.classify_all(&reply.sources);
        tracing::debug!(sources = sources.len(), "Normalized backend reply");
        ChatMessage::assistant(reply.text).with_sources(sources)
    }

    /// Assistant message describing a failed request
    pub fn error_message(&self, error: &Error) -> ChatMessage {
        let text = if error.is_not_found() {
            format!(
                "Client not found. Please check your Backboard configuration (client_id = \"{}\").",
                self.client_id
            )
        } else {
            format!(
                "Failed to connect to the backend. Make sure the server is running.\n\nError: {}",
                error
            )
        };
        ChatMessage::assistant(text)
    }

    /// Check if the backend is reachable and healthy
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/", self.base_url);

        match self.http_client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                Ok(response
                    .json::<HealthResponse>()
                    .await
                    .map(|health| health.status == "ok")
                    .unwrap_or(false))
            }
            Ok(response) => {
                tracing::debug!(status = %response.status(), "Health check returned error status");
                Ok(false)
            }
            Err(e) => {
                tracing::debug!("Health check failed: {}", e);
                Ok(false)
            }
        }
    }

    /// Connection state of each ingestion source for this client
    pub async fn system_status(&self) -> Result<SystemStatus> {
        let url = format!(
            "{}/system/status?client_id={}",
            self.base_url,
            urlencoding::encode(&self.client_id)
        );
        self.get_json(&url).await
    }

    /// Most recent ingestion activity, newest first
    pub async fn activity(&self, limit: usize) -> Result<Vec<ActivityItem>> {
        let url = format!(
            "{}/activity?client_id={}&limit={}",
            self.base_url,
            urlencoding::encode(&self.client_id),
            limit
        );
        self.get_json(&url).await
    }

    async fn post_message(&self, endpoint: &str, content: &str) -> Result<String> {
        let url = format!(
            "{}/{}?client_id={}&content={}",
            self.base_url,
            endpoint,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(content)
        );

        tracing::debug!(endpoint, chars = content.len(), "Posting message");

        let response = self
            .http_client
            .post(&url)
            .send()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        read_body(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        let body = read_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Success bodies as text; anything else as [`Error::Backend`]
async fn read_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();

    if status.is_success() {
        response
            .text()
            .await
            .map_err(|e| Error::Request(format!("failed to read response: {}", e)))
    } else {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown".to_string());
        Err(Error::Backend {
            status: status.as_u16(),
            message: error_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, SourceType};

    fn client() -> BackboardClient {
        BackboardClient::new(&BackendConfig::default(), SourceClassifier::default()).unwrap()
    }

    #[test]
    fn test_client_requires_valid_config() {
        let config = BackendConfig {
            client_id: String::new(),
            ..Default::default()
        };
        assert!(BackboardClient::new(&config, SourceClassifier::default()).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = BackendConfig {
            api_url: "https://backboard.example.com/".to_string(),
            ..Default::default()
        };
        let client = BackboardClient::new(&config, SourceClassifier::default()).unwrap();
        assert_eq!(client.base_url(), "https://backboard.example.com");
    }

    #[test]
    fn test_reply_normalization_classifies_sources() {
        let msg = client().message_from_reply(
            r#"["Here is your answer", ["a1b2c3d karan: fix", "random memory blob"]]"#,
        );
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "Here is your answer");

        let sources = msg.sources.expect("sources present");
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].source_type, SourceType::Git);
        assert_eq!(sources[1].source_type, SourceType::Unknown);
        assert_eq!(sources[1].content, "random memory blob");
    }

    #[test]
    fn test_reply_without_sources_omits_them() {
        let msg = client().message_from_reply(r#"{"response": "just text"}"#);
        assert_eq!(msg.content, "just text");
        assert!(msg.sources.is_none());
    }

    #[test]
    fn test_not_found_maps_to_configuration_message() {
        let err = Error::Backend {
            status: 404,
            message: "Client does not exist!".to_string(),
        };
        let msg = client().error_message(&err);
        assert!(msg.content.starts_with("Client not found"));
        assert!(msg.content.contains("configuration"));
        assert!(msg.content.contains("default_user"));
    }

    #[test]
    fn test_other_errors_map_to_connectivity_message() {
        let err = Error::Backend {
            status: 500,
            message: "boom".to_string(),
        };
        let msg = client().error_message(&err);
        assert!(msg.content.starts_with("Failed to connect to the backend"));
        assert!(msg.content.contains("backend error (500): boom"));

        let msg = client().error_message(&Error::Request("connection refused".to_string()));
        assert!(msg.content.ends_with("Error: request failed: connection refused"));
    }
}
