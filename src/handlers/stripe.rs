// src/handlers/stripe.rs

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::stripe::WebhookResponse,
};

const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

// POST /api/stripe/integration/webhook
#[utoipa::path(
    post,
    path = "/api/stripe/integration/webhook",
    tag = "Stripe",
    request_body(
        content = String,
        description = "Evento do Stripe Connect, exatamente como foi assinado",
        content_type = "application/json"
    ),
    params(
        ("stripe-signature" = String, Header, description = "Assinatura t=...,v1=... do Stripe")
    ),
    responses(
        (status = 200, description = "Evento processado (ou ignorado)", body = WebhookResponse),
        (status = 400, description = "Assinatura ausente/inválida ou payload malformado"),
        (status = 500, description = "Falha ao processar; o Stripe reenviará o evento")
    )
)]
pub async fn stripe_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes, // O corpo cru é necessário para conferir a assinatura
) -> Result<Json<WebhookResponse>, AppError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    // 1. Assinatura + desserialização
    let event = app_state
        .webhook_service
        .construct_event(&body, signature)?;

    // 2. Encaminha para o handler do tipo do evento
    let message = app_state.webhook_service.dispatch(event).await?;

    tracing::info!("{}", message);

    Ok(Json(WebhookResponse { received: true, message }))
}
