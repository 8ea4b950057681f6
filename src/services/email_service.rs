// src/services/email_service.rs

use async_trait::async_trait;
use serde_json::json;

use crate::common::error::AppError;

// ---
// 1. Templates
// ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailTemplate {
    /// Avisa o dono do workspace que o cupom do Stripe (e o desconto ligado a
    /// ele) foi excluído.
    DiscountDeleted { email: String, coupon_id: String },
}

impl EmailTemplate {
    pub fn render_html(&self) -> String {
        match self {
            EmailTemplate::DiscountDeleted { email, coupon_id } => format!(
                "<h1>Desconto excluído</h1>\
                 <p>O cupom <strong>{coupon_id}</strong> foi excluído na sua conta Stripe.</p>\
                 <p>O desconto do programa de parceiros ligado a ele foi removido, \
                 e os parceiros dos grupos afetados deixam de oferecê-lo.</p>\
                 <p>Se isso não era esperado, crie um novo desconto nas configurações do programa.</p>\
                 <p style=\"color:#666\">Este e-mail foi enviado para {email}.</p>"
            ),
        }
    }

    pub fn render_text(&self) -> String {
        match self {
            EmailTemplate::DiscountDeleted { email, coupon_id } => format!(
                "Desconto excluído\n\n\
                 O cupom {coupon_id} foi excluído na sua conta Stripe.\n\
                 O desconto do programa de parceiros ligado a ele foi removido.\n\n\
                 Este e-mail foi enviado para {email}."
            ),
        }
    }
}

// ---
// 2. O contrato de envio
// ---
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, subject: &str, to: &str, template: &EmailTemplate) -> Result<(), AppError>;
}

// ---
// 3. Resend (produção)
// ---
#[derive(Clone)]
pub struct ResendEmailSender {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    from: String,
}

impl ResendEmailSender {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.resend.com";

    pub fn new(client: reqwest::Client, base_url: &str, api_key: &str, from: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        }
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send(&self, subject: &str, to: &str, template: &EmailTemplate) -> Result<(), AppError> {
        let response = self.client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": [to],
                "subject": subject,
                "html": template.render_html(),
                "text": template.render_text(),
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EmailDeliveryFailed(format!("{}: {}", status, body)));
        }

        tracing::info!("📧 E-mail \"{}\" enviado para {}", subject, to);
        Ok(())
    }
}

// ---
// 4. Sem RESEND_API_KEY: só registra no log (ambiente local)
// ---
#[derive(Clone, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, subject: &str, to: &str, template: &EmailTemplate) -> Result<(), AppError> {
        tracing::info!(
            "📭 RESEND_API_KEY ausente, e-mail não enviado. Para: {} | Assunto: {}\n{}",
            to,
            subject,
            template.render_text()
        );
        Ok(())
    }
}
