// src/models/workspace.rs

use sqlx::FromRow;

// ---
// Workspace (O "Tenant")
// ---
// Resolvido pela conta Stripe Connect que originou o evento.
#[derive(Debug, Clone, FromRow)]
pub struct Workspace {
    pub id: String,
    pub slug: String,
    pub default_program_id: Option<String>,
    pub stripe_connect_id: Option<String>,
}
