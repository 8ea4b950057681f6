// src/services/coupon_service.rs

use std::{fmt, sync::Arc};

use futures::future::join_all;
use serde_json::json;
use tokio::task::JoinHandle;

use crate::{
    common::error::AppError,
    db::PartnerProgramStore,
    models::{discount::collect_cascade_targets, stripe::CouponDeletedEvent},
    services::{
        email_service::{EmailSender, EmailTemplate},
        queue_service::JobQueue,
    },
};

/// Rota do job que invalida os links de parceiros de um grupo.
pub const INVALIDATE_LINKS_PATH: &str = "/api/cron/links/invalidate-for-discounts";

// ---
// 1. O resultado de cada ramo
// ---
// Os três primeiros não são erros: o evento só não diz respeito a nós.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponDeletedOutcome {
    WorkspaceNotFound {
        stripe_account_id: String,
    },
    NoProgram {
        workspace_id: String,
        stripe_account_id: String,
    },
    DiscountNotFound {
        coupon_id: String,
    },
    Deleted {
        coupon_id: String,
        discount_ids: Vec<String>,
        group_ids: Vec<String>,
    },
}

impl fmt::Display for CouponDeletedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CouponDeletedOutcome::WorkspaceNotFound { stripe_account_id } => write!(
                f,
                "Workspace não encontrado para a conta Stripe {}.",
                stripe_account_id
            ),
            CouponDeletedOutcome::NoProgram { workspace_id, stripe_account_id } => write!(
                f,
                "Workspace {} da conta Stripe {} não tem programas.",
                workspace_id, stripe_account_id
            ),
            CouponDeletedOutcome::DiscountNotFound { coupon_id } => {
                write!(f, "Desconto não encontrado para o cupom do Stripe {}.", coupon_id)
            }
            CouponDeletedOutcome::Deleted { coupon_id, .. } => {
                write!(f, "Cupom do Stripe {} excluído.", coupon_id)
            }
        }
    }
}

/// O que o fan-out depois do commit conseguiu fazer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationSummary {
    pub email_sent: bool,
    pub jobs_enqueued: usize,
    pub jobs_failed: usize,
}

pub struct CouponDeletion {
    pub outcome: CouponDeletedOutcome,
    /// Task destacada das notificações. Pode ser descartada (continua rodando)
    /// ou aguardada.
    pub notifications: Option<JoinHandle<NotificationSummary>>,
}

// ---
// 2. O serviço
// ---
#[derive(Clone)]
pub struct CouponService {
    store: Arc<dyn PartnerProgramStore>,
    email_sender: Arc<dyn EmailSender>,
    job_queue: Arc<dyn JobQueue>,
    app_name: String,
    app_domain: String,
}

impl CouponService {
    pub fn new(
        store: Arc<dyn PartnerProgramStore>,
        email_sender: Arc<dyn EmailSender>,
        job_queue: Arc<dyn JobQueue>,
        app_name: &str,
        app_domain: &str,
    ) -> Self {
        Self {
            store,
            email_sender,
            job_queue,
            app_name: app_name.to_string(),
            app_domain: app_domain.trim_end_matches('/').to_string(),
        }
    }

    /// LÓGICA DE NEGÓCIO: o Stripe avisou que um cupom foi excluído.
    /// Remove os descontos que o espelham (limpando grupos e matrículas antes,
    /// numa única transação) e só depois dispara as notificações.
    pub async fn handle_coupon_deleted(
        &self,
        event: &CouponDeletedEvent,
    ) -> Result<CouponDeletion, AppError> {
        let coupon_id = event.coupon_id.as_str();
        let stripe_account_id = event.stripe_account_id.as_str();

        // 1. Workspace da conta conectada
        let Some(workspace) = self.store
            .find_workspace_by_stripe_account(stripe_account_id)
            .await?
        else {
            return Ok(Self::without_notifications(CouponDeletedOutcome::WorkspaceNotFound {
                stripe_account_id: stripe_account_id.to_string(),
            }));
        };

        // 2. Programa padrão
        let Some(program_id) = workspace.default_program_id.as_deref() else {
            return Ok(Self::without_notifications(CouponDeletedOutcome::NoProgram {
                workspace_id: workspace.id.clone(),
                stripe_account_id: stripe_account_id.to_string(),
            }));
        };

        // 3. Descontos com esse cupom (live ou test)
        let discounts = self.store
            .find_discounts_by_coupon(program_id, coupon_id)
            .await?;

        if discounts.is_empty() {
            return Ok(Self::without_notifications(CouponDeletedOutcome::DiscountNotFound {
                coupon_id: coupon_id.to_string(),
            }));
        }

        // 4. O que a cascata precisa tocar
        let (discount_ids, group_ids) = collect_cascade_targets(&discounts);

        // 5. Cascata atômica
        let summary = self.store
            .delete_discounts_cascade(&discount_ids, &group_ids)
            .await?;

        tracing::info!(
            "🗑️ Cupom {} (workspace {}): {} desconto(s) excluído(s), {} grupo(s) e {} matrícula(s) liberados.",
            coupon_id,
            workspace.id,
            summary.discounts_deleted,
            summary.groups_cleared,
            summary.enrollments_cleared
        );

        // 6. Notificações fora do caminho da resposta
        let notifier = self.clone();
        let workspace_id = workspace.id.clone();
        let notified_coupon = coupon_id.to_string();
        let notified_groups = group_ids.clone();
        let notifications = tokio::spawn(async move {
            notifier
                .notify_discount_deleted(&workspace_id, &notified_coupon, &notified_groups)
                .await
        });

        Ok(CouponDeletion {
            outcome: CouponDeletedOutcome::Deleted {
                coupon_id: coupon_id.to_string(),
                discount_ids,
                group_ids,
            },
            notifications: Some(notifications),
        })
    }

    /// Envia o e-mail ao dono e publica um job de invalidação por grupo.
    /// Tudo roda em paralelo e cada falha fica isolada: nada aqui vira erro.
    pub async fn notify_discount_deleted(
        &self,
        workspace_id: &str,
        coupon_id: &str,
        group_ids: &[String],
    ) -> NotificationSummary {
        let job_url = format!("{}{}", self.app_domain, INVALIDATE_LINKS_PATH);

        let email = self.email_owner(workspace_id, coupon_id);

        let jobs = join_all(group_ids.iter().map(|group_id| {
            let job_url = job_url.as_str();
            async move {
                let result = self.job_queue
                    .enqueue(job_url, json!({ "groupId": group_id }))
                    .await;
                (group_id, result)
            }
        }));

        let (email_result, job_results) = tokio::join!(email, jobs);

        let mut summary = NotificationSummary::default();

        match email_result {
            Ok(sent) => summary.email_sent = sent,
            Err(e) => tracing::warn!(
                "⚠️ Falha ao notificar o dono do workspace {} sobre o cupom {}: {}",
                workspace_id,
                coupon_id,
                e
            ),
        }

        for (group_id, result) in job_results {
            match result {
                Ok(()) => summary.jobs_enqueued += 1,
                Err(e) => {
                    summary.jobs_failed += 1;
                    tracing::warn!("⚠️ Falha ao publicar invalidação do grupo {}: {}", group_id, e);
                }
            }
        }

        tracing::info!(
            "📣 Cupom {}: e-mail enviado={}, {} job(s) de invalidação publicados, {} com falha.",
            coupon_id,
            summary.email_sent,
            summary.jobs_enqueued,
            summary.jobs_failed
        );

        summary
    }

    // Ok(false) quando o workspace não tem dono com e-mail
    async fn email_owner(&self, workspace_id: &str, coupon_id: &str) -> Result<bool, AppError> {
        let Some(owner_email) = self.store.find_owner_email(workspace_id).await? else {
            return Ok(false);
        };

        let subject = format!("{}: Desconto foi excluído", self.app_name);
        let template = EmailTemplate::DiscountDeleted {
            email: owner_email.clone(),
            coupon_id: coupon_id.to_string(),
        };
        self.email_sender.send(&subject, &owner_email, &template).await?;

        Ok(true)
    }

    fn without_notifications(outcome: CouponDeletedOutcome) -> CouponDeletion {
        tracing::debug!("Nada a excluir: {}", outcome);
        CouponDeletion { outcome, notifications: None }
    }
}
