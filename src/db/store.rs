// src/db/store.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{DiscountRepository, WorkspaceRepository},
    models::{
        discount::{CascadeSummary, DiscountMatch},
        workspace::Workspace,
    },
};

/// As operações de persistência que a cascata de exclusão de cupom usa.
///
/// O serviço depende deste trait (e não dos repositórios) para que os testes
/// rodem contra um armazenamento em memória.
#[async_trait]
pub trait PartnerProgramStore: Send + Sync {
    async fn find_workspace_by_stripe_account(
        &self,
        stripe_account_id: &str,
    ) -> Result<Option<Workspace>, AppError>;

    async fn find_discounts_by_coupon(
        &self,
        program_id: &str,
        coupon_id: &str,
    ) -> Result<Vec<DiscountMatch>, AppError>;

    /// Limpa as referências e exclui os descontos numa única transação.
    /// Ou tudo é aplicado, ou nada.
    async fn delete_discounts_cascade(
        &self,
        discount_ids: &[String],
        group_ids: &[String],
    ) -> Result<CascadeSummary, AppError>;

    async fn find_owner_email(&self, workspace_id: &str) -> Result<Option<String>, AppError>;
}

#[derive(Clone)]
pub struct PgPartnerProgramStore {
    workspace_repo: WorkspaceRepository,
    discount_repo: DiscountRepository,
    pool: PgPool, // Usamos a pool para iniciar transações
}

impl PgPartnerProgramStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            workspace_repo: WorkspaceRepository::new(pool.clone()),
            discount_repo: DiscountRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl PartnerProgramStore for PgPartnerProgramStore {
    async fn find_workspace_by_stripe_account(
        &self,
        stripe_account_id: &str,
    ) -> Result<Option<Workspace>, AppError> {
        self.workspace_repo
            .find_by_stripe_connect_id(stripe_account_id)
            .await
    }

    async fn find_discounts_by_coupon(
        &self,
        program_id: &str,
        coupon_id: &str,
    ) -> Result<Vec<DiscountMatch>, AppError> {
        self.discount_repo.find_by_coupon(program_id, coupon_id).await
    }

    async fn delete_discounts_cascade(
        &self,
        discount_ids: &[String],
        group_ids: &[String],
    ) -> Result<CascadeSummary, AppError> {
        let mut summary = CascadeSummary::default();

        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Grupos deixam de apontar para os descontos
        if !group_ids.is_empty() {
            summary.groups_cleared = self.discount_repo
                .clear_group_discounts(&mut *tx, group_ids)
                .await?; // Se falhar, o tx sofre rollback ao sair do escopo (drop)
        }

        // 3. Matrículas também, e só então os descontos podem sumir (FKs)
        if !discount_ids.is_empty() {
            summary.enrollments_cleared = self.discount_repo
                .clear_enrollment_discounts(&mut *tx, discount_ids)
                .await?;

            summary.discounts_deleted = self.discount_repo
                .delete_discounts(&mut *tx, discount_ids)
                .await?;
        }

        // 4. Commit
        tx.commit().await?;

        Ok(summary)
    }

    async fn find_owner_email(&self, workspace_id: &str) -> Result<Option<String>, AppError> {
        self.workspace_repo
            .find_owner_email(&self.pool, workspace_id)
            .await
    }
}
