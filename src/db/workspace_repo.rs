// src/db/workspace_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use crate::{common::error::AppError, models::workspace::Workspace};

#[derive(Clone)]
pub struct WorkspaceRepository {
    pool: PgPool,
}

impl WorkspaceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Busca o workspace ligado a uma conta Stripe Connect.
    pub async fn find_by_stripe_connect_id(
        &self,
        stripe_connect_id: &str,
    ) -> Result<Option<Workspace>, AppError> {
        let workspace = sqlx::query_as::<_, Workspace>(
            r#"
            SELECT id, slug, default_program_id, stripe_connect_id
            FROM workspaces
            WHERE stripe_connect_id = $1
            "#,
        )
            .bind(stripe_connect_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(workspace)
    }

    /// E-mail do primeiro dono (role = 'owner') que tenha e-mail cadastrado.
    pub async fn find_owner_email<'e, E>(
        &self,
        executor: E,
        workspace_id: &str,
    ) -> Result<Option<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let email = sqlx::query_scalar::<_, String>(
            r#"
            SELECT u.email
            FROM workspace_users wu
            JOIN users u ON u.id = wu.user_id
            WHERE wu.workspace_id = $1
              AND wu.role = 'owner'
              AND u.email IS NOT NULL
            ORDER BY wu.created_at ASC
            LIMIT 1
            "#,
        )
            .bind(workspace_id)
            .fetch_optional(executor)
            .await?;

        Ok(email)
    }
}
