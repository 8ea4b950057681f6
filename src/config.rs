// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{PartnerProgramStore, PgPartnerProgramStore},
    services::{
        coupon_service::CouponService,
        email_service::{EmailSender, LogEmailSender, ResendEmailSender},
        queue_service::{JobQueue, LogJobQueue, QstashJobQueue},
        stripe_webhook_service::StripeWebhookService,
    },
};

const DEFAULT_APP_NAME: &str = "Maestro Partners";
const DEFAULT_APP_DOMAIN: &str = "http://localhost:3000";
const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_EMAIL_FROM: &str = "Maestro Partners <system@maestro.app>";
const DEFAULT_QSTASH_URL: &str = "https://qstash.upstash.io";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

// Configuração lida do ambiente (.env incluso)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_addr: String,
    pub stripe_webhook_secret: String,
    pub app_name: String,
    pub app_domain: String,
    pub resend_api_key: Option<String>,
    pub email_from: String,
    pub qstash_url: String,
    pub qstash_token: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de qualquer fonte chave -> valor.
    /// Valores vazios contam como ausentes.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS inválido: {}", raw))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url: get("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            database_max_connections,
            server_addr: get("SERVER_ADDR").unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string()),
            stripe_webhook_secret: get("STRIPE_CONNECT_WEBHOOK_SECRET")
                .context("STRIPE_CONNECT_WEBHOOK_SECRET deve ser definido")?,
            app_name: get("APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            app_domain: get("APP_DOMAIN").unwrap_or_else(|| DEFAULT_APP_DOMAIN.to_string()),
            resend_api_key: get("RESEND_API_KEY"),
            email_from: get("EMAIL_FROM").unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string()),
            qstash_url: get("QSTASH_URL").unwrap_or_else(|| DEFAULT_QSTASH_URL.to_string()),
            qstash_token: get("QSTASH_TOKEN"),
        })
    }
}

/// Conecta ao Postgres com os limites da configuração.
pub async fn connect_database(config: &Config) -> anyhow::Result<PgPool> {
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.database_url)
        .await?; // <-- Se falhar, retorna um Err em vez de dar panic

    tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
    Ok(db_pool)
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub webhook_service: StripeWebhookService,
}

impl AppState {
    pub fn new(config: Config, db_pool: PgPool) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        // --- Monta o gráfico de dependências ---
        let store: Arc<dyn PartnerProgramStore> = Arc::new(PgPartnerProgramStore::new(db_pool));

        let email_sender: Arc<dyn EmailSender> = match &config.resend_api_key {
            Some(api_key) => Arc::new(ResendEmailSender::new(
                http_client.clone(),
                ResendEmailSender::DEFAULT_BASE_URL,
                api_key,
                &config.email_from,
            )),
            None => {
                tracing::warn!("RESEND_API_KEY não definida: e-mails só serão registrados no log.");
                Arc::new(LogEmailSender)
            }
        };

        let job_queue: Arc<dyn JobQueue> = match &config.qstash_token {
            Some(token) => Arc::new(QstashJobQueue::new(http_client, &config.qstash_url, token)),
            None => {
                tracing::warn!("QSTASH_TOKEN não definido: jobs só serão registrados no log.");
                Arc::new(LogJobQueue)
            }
        };

        Ok(Self::from_parts(config, store, email_sender, job_queue))
    }

    pub fn from_parts(
        config: Config,
        store: Arc<dyn PartnerProgramStore>,
        email_sender: Arc<dyn EmailSender>,
        job_queue: Arc<dyn JobQueue>,
    ) -> Self {
        let coupon_service = CouponService::new(
            store,
            email_sender,
            job_queue,
            &config.app_name,
            &config.app_domain,
        );
        let webhook_service = StripeWebhookService::new(&config.stripe_webhook_secret, coupon_service);

        Self {
            config: Arc::new(config),
            webhook_service,
        }
    }
}
