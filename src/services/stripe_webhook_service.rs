// src/services/stripe_webhook_service.rs

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{
    common::error::AppError,
    models::stripe::{CouponDeletedEvent, StripeEvent},
    services::coupon_service::CouponService,
};

type HmacSha256 = Hmac<Sha256>;

/// Idade máxima (em segundos) de um evento assinado, contra replay.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Confere o cabeçalho `Stripe-Signature` (`t=...,v1=...`) contra o corpo cru.
pub fn verify_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    now: i64,
) -> Result<(), AppError> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {} // v0 e esquemas futuros são ignorados
        }
    }

    let (Some(timestamp), false) = (timestamp, signatures.is_empty()) else {
        return Err(AppError::MissingSignature);
    };
    let signed_at: i64 = timestamp.parse().map_err(|_| AppError::MissingSignature)?;

    // O timestamp vem do cabeçalho antes de qualquer autenticação: nada de overflow
    let Some(age) = now.checked_sub(signed_at) else {
        return Err(AppError::InvalidSignature);
    };
    if age > SIGNATURE_TOLERANCE_SECS {
        tracing::warn!("Evento do Stripe assinado há {}s, fora da tolerância.", age);
        return Err(AppError::InvalidSignature);
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Segredo do webhook inválido: {}", e))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    // Comparação em tempo constante contra cada v1 enviado
    let valid = signatures
        .iter()
        .filter_map(|sig| hex::decode(sig).ok())
        .any(|sig| mac.clone().verify_slice(&sig).is_ok());

    if valid {
        Ok(())
    } else {
        Err(AppError::InvalidSignature)
    }
}

#[derive(Clone)]
pub struct StripeWebhookService {
    webhook_secret: String,
    coupon_service: CouponService,
}

impl StripeWebhookService {
    pub fn new(webhook_secret: &str, coupon_service: CouponService) -> Self {
        Self {
            webhook_secret: webhook_secret.to_string(),
            coupon_service,
        }
    }

    /// Verifica a assinatura e desserializa o evento.
    pub fn construct_event(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<StripeEvent, AppError> {
        let signature_header = signature_header.ok_or(AppError::MissingSignature)?;
        verify_signature(
            payload,
            signature_header,
            &self.webhook_secret,
            chrono::Utc::now().timestamp(),
        )?;

        Ok(serde_json::from_slice::<StripeEvent>(payload)?)
    }

    /// Encaminha o evento para o handler do tipo e devolve o status
    /// legível que vai para a resposta e para os logs.
    pub async fn dispatch(&self, event: StripeEvent) -> Result<String, AppError> {
        tracing::info!(
            "📬 Evento do Stripe {} ({}) da conta {:?}, livemode={}",
            event.id,
            event.event_type,
            event.account,
            event.livemode
        );

        match event.event_type.as_str() {
            "coupon.deleted" => {
                let coupon_event = CouponDeletedEvent::from_stripe_event(&event)?;
                // As notificações seguem destacadas; não esperamos por elas
                let deletion = self.coupon_service
                    .handle_coupon_deleted(&coupon_event)
                    .await?;
                Ok(deletion.outcome.to_string())
            }
            other => Ok(format!("Evento não suportado: {}", other)),
        }
    }
}
