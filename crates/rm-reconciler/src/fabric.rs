use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rm_domain::TenantId;
use rm_inventory::{InventoryError, InventoryEvent, InventoryGateway, ResourceKind};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::backoff::Backoff;

/// Identifies one unit of reconciliation work: a single resource, scoped to
/// its tenant (§4.D).
pub type ReconcilerId = (TenantId, String);

/// What a reconciler decided to do with one pass over a resource (§4.D).
#[derive(Debug, Clone)]
pub enum Directive {
    /// Converged; drop the item until the next event or resweep.
    Ack,
    /// Failed; retry after backoff. Carries the error for logging.
    Retry(String),
}

/// One kind of reconcilable resource (§4.D.1's IP reconciler is the
/// canonical instance of this trait).
#[async_trait]
pub trait Reconcile: Send + Sync + 'static {
    async fn reconcile(&self, tenant: &TenantId, resource_id: &str) -> Directive;
}

/// Maps a bounded inventory error onto a fabric directive (§4.D).
/// `NotFound`/`AlreadyExists`/`Unauthenticated`/`PermissionDenied` are
/// final — nothing a retry would fix — so they `Ack`. Every other inventory
/// error is transient or a server-side fault and gets retried with backoff.
pub fn handle_inventory_error(err: &InventoryError) -> Directive {
    match err {
        InventoryError::NotFound(_)
        | InventoryError::AlreadyExists(_)
        | InventoryError::Unauthenticated(_)
        | InventoryError::PermissionDenied(_) => Directive::Ack,
        e => Directive::Retry(e.to_string()),
    }
}

/// Lists the ids a full resweep should re-enqueue for a tenant, supplied
/// per-reconciler-kind since [`InventoryGateway`]'s list calls are typed per
/// resource (§4.D's periodic full resweep).
#[async_trait]
pub trait ResweepSource: Send + Sync + 'static {
    async fn list_ids(&self, tenant: &TenantId) -> Result<Vec<String>, InventoryError>;
}

struct Shared {
    in_flight: Mutex<HashSet<ReconcilerId>>,
    dirty: Mutex<HashSet<ReconcilerId>>,
    attempts: Mutex<HashMap<ReconcilerId, u32>>,
}

impl Default for Shared {
    fn default() -> Self {
        Shared {
            in_flight: Mutex::new(HashSet::new()),
            dirty: Mutex::new(HashSet::new()),
            attempts: Mutex::new(HashMap::new()),
        }
    }
}

/// A bounded pool of workers for one reconciler kind. Enqueues coalesce:
/// if an id is already in flight, a second enqueue just marks it dirty so
/// it gets one more pass after the current one finishes, instead of
/// queuing duplicate work (§4.D).
pub struct WorkerPool {
    tx: mpsc::Sender<ReconcilerId>,
    shared: Arc<Shared>,
}

impl WorkerPool {
    pub fn spawn<R: Reconcile>(reconciler: Arc<R>, pool_size: usize, backoff: Backoff) -> Self {
        let (tx, rx) = mpsc::channel(1024);
        let shared = Arc::new(Shared::default());
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        for worker in 0..pool_size.max(1) {
            let reconciler = reconciler.clone();
            let shared = shared.clone();
            let rx = rx.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                loop {
                    let id = {
                        let mut guard = rx.lock().await;
                        match guard.recv().await {
                            Some(id) => id,
                            None => break,
                        }
                    };
                    debug!(worker, tenant = %id.0, resource = %id.1, "reconciling");
                    let directive = reconciler.reconcile(&id.0, &id.1).await;
                    handle_directive(&shared, &tx, &backoff, id, directive).await;
                }
            });
        }

        WorkerPool { tx, shared }
    }

    pub async fn enqueue(&self, id: ReconcilerId) {
        let already_in_flight = {
            let mut in_flight = self.shared.in_flight.lock().unwrap();
            if in_flight.contains(&id) {
                true
            } else {
                in_flight.insert(id.clone());
                false
            }
        };
        if already_in_flight {
            self.shared.dirty.lock().unwrap().insert(id);
            return;
        }
        if self.tx.send(id).await.is_err() {
            warn!("worker pool channel closed, dropping enqueue");
        }
    }
}

async fn handle_directive(
    shared: &Arc<Shared>,
    tx: &mpsc::Sender<ReconcilerId>,
    backoff: &Backoff,
    id: ReconcilerId,
    directive: Directive,
) {
    match directive {
        Directive::Ack => {
            shared.attempts.lock().unwrap().remove(&id);
            requeue_if_dirty(shared, tx, id).await;
        }
        Directive::Retry(reason) => {
            let attempt = {
                let mut attempts = shared.attempts.lock().unwrap();
                let entry = attempts.entry(id.clone()).or_insert(0);
                let attempt = *entry;
                *entry += 1;
                attempt
            };
            let delay = backoff.delay_for_attempt(attempt);
            info!(tenant = %id.0, resource = %id.1, %reason, ?delay, "retrying after backoff");
            let tx = tx.clone();
            let shared = shared.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                requeue_if_dirty_or_retry(&shared, &tx, id).await;
            });
        }
    }
}

async fn requeue_if_dirty(shared: &Arc<Shared>, tx: &mpsc::Sender<ReconcilerId>, id: ReconcilerId) {
    let redo = shared.dirty.lock().unwrap().remove(&id);
    if redo {
        let _ = tx.send(id).await;
    } else {
        shared.in_flight.lock().unwrap().remove(&id);
    }
}

async fn requeue_if_dirty_or_retry(
    shared: &Arc<Shared>,
    tx: &mpsc::Sender<ReconcilerId>,
    id: ReconcilerId,
) {
    shared.dirty.lock().unwrap().remove(&id);
    let _ = tx.send(id).await;
}

/// Drives one reconciler kind end to end: subscribes to inventory events,
/// enqueues the affected resource on every create/update, drops deletes by
/// default (the reconciler has nothing left to converge), and performs a
/// full resweep on `resweep_interval` (§4.D).
pub struct ReconcilerDriver {
    pub kind: ResourceKind,
    pub pool: Arc<WorkerPool>,
    pub resweep: Arc<dyn ResweepSource>,
    pub tracked_tenants: Vec<TenantId>,
}

impl ReconcilerDriver {
    pub async fn run(
        self,
        mut events: mpsc::Receiver<InventoryEvent>,
        resweep_interval: Duration,
        mut term: oneshot::Receiver<()>,
    ) {
        let mut ticker = tokio::time::interval(resweep_interval);
        ticker.tick().await;

        self.full_resweep().await;

        loop {
            tokio::select! {
                maybe_event = events.recv() => {
                    match maybe_event {
                        Some(event) if event.kind == self.kind => {
                            if matches!(event.change, rm_inventory::ChangeKind::Deleted) {
                                continue;
                            }
                            self.pool.enqueue((event.tenant_id, event.resource_id)).await;
                        }
                        Some(_) => continue,
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    self.full_resweep().await;
                }
                _ = &mut term => break,
            }
        }
    }

    async fn full_resweep(&self) {
        for tenant in &self.tracked_tenants {
            match self.resweep.list_ids(tenant).await {
                Ok(ids) => {
                    for id in ids {
                        self.pool.enqueue((tenant.clone(), id)).await;
                    }
                }
                Err(err) => warn!(?err, %tenant, kind = %self.kind, "full resweep listing failed"),
            }
        }
    }
}
