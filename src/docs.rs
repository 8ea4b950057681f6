// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Stripe ---
        handlers::stripe::stripe_webhook,
    ),
    components(
        schemas(
            models::stripe::WebhookResponse,
        )
    ),
    tags(
        (name = "Stripe", description = "Webhooks do Stripe Connect (cupons e descontos do programa)")
    )
)]
pub struct ApiDoc;
