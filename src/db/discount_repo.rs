// src/db/discount_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use crate::{common::error::AppError, models::discount::DiscountMatch};

#[derive(Clone)]
pub struct DiscountRepository {
    pool: PgPool,
}

impl DiscountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    /// Descontos do programa cujo cupom live OU test é o cupom informado,
    /// com o grupo de parceiros que aponta para cada um.
    pub async fn find_by_coupon(
        &self,
        program_id: &str,
        coupon_id: &str,
    ) -> Result<Vec<DiscountMatch>, AppError> {
        // partner_groups.discount_id é UNIQUE, então o LEFT JOIN não duplica descontos
        let discounts = sqlx::query_as::<_, DiscountMatch>(
            r#"
            SELECT d.id, pg.id AS partner_group_id
            FROM discounts d
            LEFT JOIN partner_groups pg ON pg.discount_id = d.id
            WHERE d.program_id = $1
              AND (d.coupon_id = $2 OR d.coupon_test_id = $2)
            ORDER BY d.created_at ASC, d.id ASC
            "#,
        )
            .bind(program_id)
            .bind(coupon_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(discounts)
    }

    // =========================================================================
    //  CASCATA (sempre dentro de uma transação)
    // =========================================================================

    pub async fn clear_group_discounts<'e, E>(
        &self,
        executor: E,
        group_ids: &[String],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE partner_groups SET discount_id = NULL WHERE id = ANY($1)",
        )
            .bind(group_ids)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn clear_enrollment_discounts<'e, E>(
        &self,
        executor: E,
        discount_ids: &[String],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE program_enrollments SET discount_id = NULL WHERE discount_id = ANY($1)",
        )
            .bind(discount_ids)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_discounts<'e, E>(
        &self,
        executor: E,
        discount_ids: &[String],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM discounts WHERE id = ANY($1)")
            .bind(discount_ids)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
