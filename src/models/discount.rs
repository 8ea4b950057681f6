// src/models/discount.rs

use sqlx::FromRow;

// ---
// 1. DiscountMatch
// ---
// Um desconto do programa cujo cupom (live ou test) bate com o evento,
// junto com o grupo de parceiros que aponta para ele (se houver).
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DiscountMatch {
    pub id: String,
    pub partner_group_id: Option<String>,
}

// ---
// 2. CascadeSummary
// ---
// Quantas linhas cada etapa da transação afetou.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    pub groups_cleared: u64,
    pub enrollments_cleared: u64,
    pub discounts_deleted: u64,
}

/// Separa os ids de desconto e os ids distintos (não nulos) de grupos,
/// preservando a ordem em que apareceram.
pub fn collect_cascade_targets(discounts: &[DiscountMatch]) -> (Vec<String>, Vec<String>) {
    let discount_ids: Vec<String> = discounts.iter().map(|d| d.id.clone()).collect();

    let mut group_ids: Vec<String> = Vec::new();
    for group_id in discounts.iter().filter_map(|d| d.partner_group_id.as_ref()) {
        if !group_ids.contains(group_id) {
            group_ids.push(group_id.clone());
        }
    }

    (discount_ids, group_ids)
}
