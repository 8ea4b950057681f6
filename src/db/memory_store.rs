// src/db/memory_store.rs
//
// Armazenamento em memória usado nos testes. Aplica a cascata numa cópia do
// estado e só a publica no "commit", imitando uma transação do Postgres.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;

use crate::{
    common::error::AppError,
    db::PartnerProgramStore,
    models::{
        discount::{CascadeSummary, DiscountMatch},
        workspace::Workspace,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDiscount {
    pub id: String,
    pub program_id: String,
    pub coupon_id: Option<String>,
    pub coupon_test_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryGroup {
    pub id: String,
    pub discount_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEnrollment {
    pub id: String,
    pub discount_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryOwner {
    pub workspace_id: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub workspaces: Vec<Workspace>,
    pub owners: Vec<MemoryOwner>,
    pub discounts: Vec<MemoryDiscount>,
    pub groups: Vec<MemoryGroup>,
    pub enrollments: Vec<MemoryEnrollment>,
}

impl MemoryState {
    pub fn workspace(mut self, id: &str, stripe_account: &str, default_program: Option<&str>) -> Self {
        self.workspaces.push(Workspace {
            id: id.to_string(),
            slug: id.to_string(),
            default_program_id: default_program.map(str::to_string),
            stripe_connect_id: Some(stripe_account.to_string()),
        });
        self
    }

    pub fn owner(mut self, workspace_id: &str, email: Option<&str>) -> Self {
        self.owners.push(MemoryOwner {
            workspace_id: workspace_id.to_string(),
            email: email.map(str::to_string),
        });
        self
    }

    pub fn discount(mut self, id: &str, program_id: &str, coupon: Option<&str>, test_coupon: Option<&str>) -> Self {
        self.discounts.push(MemoryDiscount {
            id: id.to_string(),
            program_id: program_id.to_string(),
            coupon_id: coupon.map(str::to_string),
            coupon_test_id: test_coupon.map(str::to_string),
        });
        self
    }

    pub fn group(mut self, id: &str, discount_id: Option<&str>) -> Self {
        self.groups.push(MemoryGroup {
            id: id.to_string(),
            discount_id: discount_id.map(str::to_string),
        });
        self
    }

    pub fn enrollment(mut self, id: &str, discount_id: Option<&str>) -> Self {
        self.enrollments.push(MemoryEnrollment {
            id: id.to_string(),
            discount_id: discount_id.map(str::to_string),
        });
        self
    }

    pub fn group_discount(&self, id: &str) -> Option<String> {
        self.groups
            .iter()
            .find(|g| g.id == id)
            .and_then(|g| g.discount_id.clone())
    }

    pub fn enrollment_discount(&self, id: &str) -> Option<String> {
        self.enrollments
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| e.discount_id.clone())
    }

    pub fn has_discount(&self, id: &str) -> bool {
        self.discounts.iter().any(|d| d.id == id)
    }
}

/// Etapa da cascata em que o armazenamento deve falhar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    ClearGroups,
    ClearEnrollments,
    DeleteDiscounts,
    OwnerLookup,
}

pub struct MemoryStore {
    state: Mutex<MemoryState>,
    commits: AtomicUsize,
    fail_at: Option<FailPoint>,
}

impl MemoryStore {
    pub fn new(state: MemoryState) -> Self {
        Self {
            state: Mutex::new(state),
            commits: AtomicUsize::new(0),
            fail_at: None,
        }
    }

    pub fn failing_at(mut self, point: FailPoint) -> Self {
        self.fail_at = Some(point);
        self
    }

    pub fn snapshot(&self) -> MemoryState {
        self.state.lock().unwrap().clone()
    }

    /// Quantas transações de escrita foram confirmadas.
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    fn check(&self, point: FailPoint) -> Result<(), AppError> {
        if self.fail_at == Some(point) {
            return Err(AppError::DatabaseError(sqlx::Error::Protocol(format!(
                "falha simulada em {:?}",
                point
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl PartnerProgramStore for MemoryStore {
    async fn find_workspace_by_stripe_account(
        &self,
        stripe_account_id: &str,
    ) -> Result<Option<Workspace>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .workspaces
            .iter()
            .find(|w| w.stripe_connect_id.as_deref() == Some(stripe_account_id))
            .cloned())
    }

    async fn find_discounts_by_coupon(
        &self,
        program_id: &str,
        coupon_id: &str,
    ) -> Result<Vec<DiscountMatch>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .discounts
            .iter()
            .filter(|d| d.program_id == program_id)
            .filter(|d| {
                d.coupon_id.as_deref() == Some(coupon_id)
                    || d.coupon_test_id.as_deref() == Some(coupon_id)
            })
            .map(|d| DiscountMatch {
                id: d.id.clone(),
                partner_group_id: state
                    .groups
                    .iter()
                    .find(|g| g.discount_id.as_deref() == Some(d.id.as_str()))
                    .map(|g| g.id.clone()),
            })
            .collect())
    }

    async fn delete_discounts_cascade(
        &self,
        discount_ids: &[String],
        group_ids: &[String],
    ) -> Result<CascadeSummary, AppError> {
        let mut state = self.state.lock().unwrap();
        let mut draft = state.clone();
        let mut summary = CascadeSummary::default();

        if !group_ids.is_empty() {
            self.check(FailPoint::ClearGroups)?;
            for group in draft.groups.iter_mut().filter(|g| group_ids.contains(&g.id)) {
                group.discount_id = None;
                summary.groups_cleared += 1;
            }
        }

        if !discount_ids.is_empty() {
            self.check(FailPoint::ClearEnrollments)?;
            for enrollment in draft.enrollments.iter_mut() {
                if enrollment
                    .discount_id
                    .as_ref()
                    .is_some_and(|id| discount_ids.contains(id))
                {
                    enrollment.discount_id = None;
                    summary.enrollments_cleared += 1;
                }
            }

            self.check(FailPoint::DeleteDiscounts)?;

            // Mesma regra que as FKs do Postgres impõem
            let still_referenced = draft
                .groups
                .iter()
                .filter_map(|g| g.discount_id.as_ref())
                .chain(draft.enrollments.iter().filter_map(|e| e.discount_id.as_ref()))
                .any(|id| discount_ids.contains(id));
            if still_referenced {
                return Err(AppError::DatabaseError(sqlx::Error::Protocol(
                    "violação de chave estrangeira em discounts".to_string(),
                )));
            }

            let before = draft.discounts.len();
            draft.discounts.retain(|d| !discount_ids.contains(&d.id));
            summary.discounts_deleted = (before - draft.discounts.len()) as u64;
        }

        *state = draft;
        self.commits.fetch_add(1, Ordering::SeqCst);

        Ok(summary)
    }

    async fn find_owner_email(&self, workspace_id: &str) -> Result<Option<String>, AppError> {
        self.check(FailPoint::OwnerLookup)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .owners
            .iter()
            .filter(|o| o.workspace_id == workspace_id)
            .find_map(|o| o.email.clone()))
    }
}
