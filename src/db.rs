pub mod workspace_repo;
pub use workspace_repo::WorkspaceRepository;
pub mod discount_repo;
pub use discount_repo::DiscountRepository;
pub mod store;
pub use store::{PartnerProgramStore, PgPartnerProgramStore};

#[cfg(test)]
pub mod memory_store;
