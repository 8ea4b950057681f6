// src/services/queue_service.rs

use async_trait::async_trait;
use serde::Deserialize;

use crate::common::error::AppError;

/// Fila de jobs assíncronos: entrega `body` (JSON) para `url` mais tarde.
/// Não há garantia de entrega observável por quem publica.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, url: &str, body: serde_json::Value) -> Result<(), AppError>;
}

// ---
// QStash (Upstash)
// ---
#[derive(Clone)]
pub struct QstashJobQueue {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    message_id: Option<String>,
}

impl QstashJobQueue {
    pub fn new(client: reqwest::Client, base_url: &str, token: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    // O destino vai "cru" no path, como a API do QStash espera
    fn publish_url(&self, destination: &str) -> String {
        format!("{}/v2/publish/{}", self.base_url, destination)
    }
}

#[async_trait]
impl JobQueue for QstashJobQueue {
    async fn enqueue(&self, url: &str, body: serde_json::Value) -> Result<(), AppError> {
        let response = self.client
            .post(self.publish_url(url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::QueuePublishFailed(format!("{} -> {}: {}", url, status, text)));
        }

        let published = response
            .json::<PublishResponse>()
            .await
            .ok()
            .and_then(|r| r.message_id);
        tracing::debug!("📨 Job publicado para {} (messageId: {:?})", url, published);

        Ok(())
    }
}

// Sem QSTASH_TOKEN: só registra no log (ambiente local)
#[derive(Clone, Default)]
pub struct LogJobQueue;

#[async_trait]
impl JobQueue for LogJobQueue {
    async fn enqueue(&self, url: &str, body: serde_json::Value) -> Result<(), AppError> {
        tracing::info!("📭 QSTASH_TOKEN ausente, job não publicado: {} {}", url, body);
        Ok(())
    }
}
