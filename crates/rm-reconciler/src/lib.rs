pub mod backoff;
pub mod error;
pub mod fabric;
pub mod ip;

pub use backoff::Backoff;
pub use error::ReconcileError;
pub use fabric::{
    handle_inventory_error, Directive, Reconcile, ReconcilerDriver, ReconcilerId, ResweepSource,
    WorkerPool,
};
pub use ip::IpReconciler;
