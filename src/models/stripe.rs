// src/models/stripe.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::common::error::AppError;

// ---
// 1. StripeEvent (O envelope que o Stripe Connect envia)
// ---
// Só os campos que usamos. O `object` fica como JSON cru porque o formato
// muda conforme o tipo do evento.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    // Conta conectada que originou o evento (ausente em eventos da plataforma)
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub livemode: bool,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

// ---
// 2. CouponDeletedEvent
// ---
// O que o handler de "coupon.deleted" realmente precisa.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct CouponDeletedEvent {
    #[validate(length(min = 1, message = "O id do cupom é obrigatório."))]
    pub coupon_id: String,
    #[validate(length(min = 1, message = "O evento precisa vir de uma conta Stripe Connect."))]
    pub stripe_account_id: String,
}

impl CouponDeletedEvent {
    pub fn new(coupon_id: impl Into<String>, stripe_account_id: impl Into<String>) -> Self {
        Self {
            coupon_id: coupon_id.into(),
            stripe_account_id: stripe_account_id.into(),
        }
    }

    /// Extrai e valida o cupom e a conta conectada de um evento do Stripe.
    pub fn from_stripe_event(event: &StripeEvent) -> Result<Self, AppError> {
        let coupon_id = event
            .data
            .object
            .get("id")
            .and_then(|id| id.as_str())
            .ok_or_else(|| {
                AppError::MalformedPayload(format!("evento {} sem data.object.id", event.id))
            })?;

        let parsed = Self::new(coupon_id, event.account.clone().unwrap_or_default());
        parsed.validate()?;

        Ok(parsed)
    }
}

// Resposta devolvida ao Stripe (o status também vai para os logs)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    #[schema(example = true)]
    pub received: bool,
    #[schema(example = "Cupom do Stripe co_123 excluído.")]
    pub message: String,
}
