use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("inventory error: {0}")]
    Inventory(#[from] rm_inventory::InventoryError),

    #[error("domain error: {0}")]
    Domain(#[from] rm_domain::DomainError),

    #[error("internal error: {0}")]
    Internal(String),
}
