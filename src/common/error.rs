use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Cabeçalho Stripe-Signature ausente ou malformado")]
    MissingSignature,

    #[error("Assinatura do webhook inválida")]
    InvalidSignature,

    #[error("Payload do webhook malformado: {0}")]
    MalformedPayload(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro no cliente HTTP: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("Falha ao enviar e-mail: {0}")]
    EmailDeliveryFailed(String),

    #[error("Falha ao publicar job na fila: {0}")]
    QueuePublishFailed(String),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedPayload(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos do evento são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::MissingSignature => (
                StatusCode::BAD_REQUEST,
                "Cabeçalho Stripe-Signature ausente ou malformado.".to_string(),
            ),
            AppError::InvalidSignature => (
                StatusCode::BAD_REQUEST,
                "Assinatura do webhook inválida.".to_string(),
            ),
            AppError::MalformedPayload(ref reason) => {
                tracing::warn!("Payload de webhook rejeitado: {}", reason);
                (StatusCode::BAD_REQUEST, format!("Payload inválido: {}", reason))
            }

            // Todos os outros erros viram 500, para que o Stripe reenvie o evento.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
