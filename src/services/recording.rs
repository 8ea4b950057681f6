// src/services/recording.rs
//
// Dublês de e-mail e fila para os testes: guardam o que receberam e podem
// falhar de propósito.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    common::error::AppError,
    services::{email_service::{EmailSender, EmailTemplate}, queue_service::JobQueue},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub subject: String,
    pub to: String,
    pub template: EmailTemplate,
}

#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<SentEmail>>,
    fail: bool,
}

impl RecordingEmailSender {
    pub fn failing() -> Self {
        Self { sent: Mutex::new(Vec::new()), fail: true }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, subject: &str, to: &str, template: &EmailTemplate) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::EmailDeliveryFailed("servidor de e-mail fora do ar".to_string()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            subject: subject.to_string(),
            to: to.to_string(),
            template: template.clone(),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingJobQueue {
    published: Mutex<Vec<(String, serde_json::Value)>>,
    // Jobs cujo corpo contém este groupId falham
    fail_for_group: Option<String>,
}

impl RecordingJobQueue {
    pub fn failing_for_group(group_id: &str) -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail_for_group: Some(group_id.to_string()),
        }
    }

    pub fn published(&self) -> Vec<(String, serde_json::Value)> {
        self.published.lock().unwrap().clone()
    }

    pub fn published_groups(&self) -> Vec<String> {
        let mut groups: Vec<String> = self
            .published()
            .iter()
            .filter_map(|(_, body)| body["groupId"].as_str().map(str::to_string))
            .collect();
        groups.sort();
        groups
    }
}

#[async_trait]
impl JobQueue for RecordingJobQueue {
    async fn enqueue(&self, url: &str, body: serde_json::Value) -> Result<(), AppError> {
        if let Some(group_id) = &self.fail_for_group {
            if body["groupId"].as_str() == Some(group_id.as_str()) {
                return Err(AppError::QueuePublishFailed(format!("fila recusou {}", group_id)));
            }
        }
        self.published.lock().unwrap().push((url.to_string(), body));
        Ok(())
    }
}
