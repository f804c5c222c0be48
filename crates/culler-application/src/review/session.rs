//! Review session.
//!
//! Owns the single mutable review state and serializes every operation on
//! it. Tag, undo and jump run entirely under the state lock. Commit, refresh
//! and open have to await the photo store, so they raise the `reconciling`
//! flag while still holding the lock and keep it raised until the new
//! sequence is applied and persisted; anything arriving in between is
//! rejected with [`RejectReason::Reconciling`].

use super::ledger_store::LedgerStore;
use super::position::PositionMemory;
use culler_core::config::ReviewConfig;
use culler_core::disposition::{Disposition, DispositionLedger};
use culler_core::error::{CullerError, Result};
use culler_core::item::{Item, ItemId, ItemStore, PermissionState};
use culler_core::review::{
    CommitOutcome, RejectReason, ReviewSnapshot, ReviewState, SessionEvent, TagOutcome,
    UndoOutcome, ViewOutcome,
};
use culler_core::state::StateRepository;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, MutexGuard, broadcast};

const EVENT_CAPACITY: usize = 64;

/// Raised `reconciling` flag; lowering happens on drop so every exit path,
/// including errors, releases it.
struct ReconcileGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ReconcileGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ReconcileGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Persistence work collected under the lock and performed after releasing it.
#[derive(Default)]
struct PendingWrites {
    ledger: Option<DispositionLedger>,
    last_viewed: Option<ItemId>,
}

/// The review session.
///
/// `None` state means the session is unavailable: never opened, or the
/// photo store denied access. In that state it holds no sequence.
pub struct ReviewSession {
    store: Arc<dyn ItemStore>,
    state: Mutex<Option<ReviewState>>,
    /// Taken under the state lock before it is released, so persisted
    /// snapshots land in the order the state changed.
    write_order: Mutex<()>,
    reconciling: AtomicBool,
    ledger_store: LedgerStore,
    position: PositionMemory,
    config: ReviewConfig,
    events: broadcast::Sender<SessionEvent>,
}

impl ReviewSession {
    /// Creates an unopened session. Call [`open`](Self::open) before reviewing.
    ///
    /// # Arguments
    ///
    /// * `store` - The photo store to review and delete from
    /// * `repository` - Key-value storage for the ledger and last viewed item
    /// * `config` - History policy and lookahead size
    pub fn new(
        store: Arc<dyn ItemStore>,
        repository: Arc<dyn StateRepository>,
        config: ReviewConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            state: Mutex::new(None),
            write_order: Mutex::new(()),
            reconciling: AtomicBool::new(false),
            ledger_store: LedgerStore::new(repository.clone()),
            position: PositionMemory::new(repository),
            config,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn is_reconciling(&self) -> bool {
        self.reconciling.load(Ordering::Acquire)
    }

    pub async fn is_available(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Current view, or `None` while unavailable.
    pub async fn snapshot(&self) -> Option<ReviewSnapshot> {
        let state = self.state.lock().await;
        state
            .as_ref()
            .map(|s| s.snapshot(self.config.lookahead, self.is_reconciling()))
    }

    /// The current sequence, empty while unavailable.
    pub async fn items(&self) -> Vec<Item> {
        let state = self.state.lock().await;
        state
            .as_ref()
            .map(|s| s.sequence().to_vec())
            .unwrap_or_default()
    }

    /// Loads the collection and positions the cursor.
    ///
    /// The cursor lands on `target` if given and present, else on the
    /// remembered last viewed item, else on the first item.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied`: access refused; the session becomes unavailable
    /// - `StoreUnavailable`: listing failed; previous state is kept
    pub async fn open(&self, target: Option<ItemId>) -> Result<ViewOutcome> {
        let guard = {
            let _state = self.state.lock().await;
            match ReconcileGuard::try_acquire(&self.reconciling) {
                Some(guard) => guard,
                None => return Ok(ViewOutcome::Rejected(RejectReason::Reconciling)),
            }
        };

        let mut permission = self.store.permission().await;
        if permission == PermissionState::NotDetermined {
            permission = self.store.request_permission().await;
        }
        if permission != PermissionState::Granted {
            self.mark_unavailable().await;
            return Err(CullerError::PermissionDenied);
        }

        let sequence = self.list_or_mark_unavailable().await?;
        let ledger = self.ledger_store.load().await;
        let target = match target {
            Some(id) => Some(id),
            None => self.position.load().await,
        };

        let mut review = ReviewState::new(sequence, ledger);
        if let Some(id) = &target {
            if review.seek(id).is_none() {
                tracing::info!("[ReviewSession] Resume target {} not found, starting at 0", id);
            }
        }

        tracing::info!(
            "[ReviewSession] Opened {} items at cursor {} ({} dispositions restored)",
            review.len(),
            review.cursor(),
            review.ledger().len()
        );

        let writes = PendingWrites {
            ledger: None,
            last_viewed: review.last_viewed_id().cloned(),
        };
        let snapshot = self.install(review).await;
        self.flush(self.write_order.lock().await, writes).await;
        drop(guard);

        Ok(ViewOutcome::Ready(snapshot))
    }

    /// Tags the current item and advances the cursor.
    pub async fn tag(&self, direction: Disposition) -> TagOutcome {
        let (outcome, writes, order) = {
            let mut state = self.state.lock().await;
            if self.is_reconciling() {
                return TagOutcome::Rejected(RejectReason::Reconciling);
            }
            let Some(review) = state.as_mut() else {
                return TagOutcome::Rejected(RejectReason::Unavailable);
            };

            let outcome = review.tag(direction);
            let writes = match &outcome {
                TagOutcome::Tagged { .. } => PendingWrites {
                    ledger: Some(review.ledger().clone()),
                    last_viewed: review.last_viewed_id().cloned(),
                },
                TagOutcome::Rejected(_) => PendingWrites::default(),
            };
            (outcome, writes, self.write_order.lock().await)
        };

        if let TagOutcome::Tagged {
            id,
            disposition,
            cursor,
            complete,
        } = &outcome
        {
            tracing::debug!("[ReviewSession] Tagged {} as {} -> cursor {}", id, disposition, cursor);
            if *complete {
                tracing::info!("[ReviewSession] Review complete");
                self.emit(SessionEvent::ReviewComplete);
            }
        }

        self.flush(order, writes).await;
        outcome
    }

    /// Reverts the most recent tag.
    ///
    /// Calls are serialized by the state lock; a second undo waits for the
    /// first to finish its bookkeeping and then walks one step further back.
    pub async fn undo(&self) -> UndoOutcome {
        let (outcome, writes, order) = {
            let mut state = self.state.lock().await;
            if self.is_reconciling() {
                return UndoOutcome::Rejected(RejectReason::Reconciling);
            }
            let Some(review) = state.as_mut() else {
                return UndoOutcome::Rejected(RejectReason::Unavailable);
            };

            let outcome = review.undo();
            let writes = match &outcome {
                UndoOutcome::Undone { id, .. } => PendingWrites {
                    ledger: Some(review.ledger().clone()),
                    last_viewed: Some(id.clone()),
                },
                _ => PendingWrites::default(),
            };
            (outcome, writes, self.write_order.lock().await)
        };

        match &outcome {
            UndoOutcome::Undone { id, cursor, .. } => {
                tracing::debug!("[ReviewSession] Undid tag on {} -> cursor {}", id, cursor)
            }
            UndoOutcome::StaleEntryDiscarded => {
                tracing::warn!("[ReviewSession] Discarded out-of-range history entry")
            }
            _ => {}
        }

        self.flush(order, writes).await;
        outcome
    }

    /// Moves the cursor onto `id` without recording history.
    ///
    /// # Errors
    ///
    /// `NotFound` if no item has that id.
    pub async fn jump_to(&self, id: &ItemId) -> Result<ViewOutcome> {
        let snapshot = {
            let mut state = self.state.lock().await;
            if self.is_reconciling() {
                return Ok(ViewOutcome::Rejected(RejectReason::Reconciling));
            }
            let Some(review) = state.as_mut() else {
                return Ok(ViewOutcome::Rejected(RejectReason::Unavailable));
            };
            review
                .seek(id)
                .ok_or_else(|| CullerError::not_found("item", id.as_str()))?;
            review.snapshot(self.config.lookahead, false)
        };

        self.position.save(id).await;
        Ok(ViewOutcome::Ready(snapshot))
    }

    /// Asks the store to delete every item marked for deletion, then
    /// re-anchors cursor, history and ledger on the store's fresh listing.
    ///
    /// The landing item is chosen before the delete is issued; see
    /// [`ReviewState::plan_commit`]. If the listing fails after a successful
    /// delete, the pre-commit sequence minus the deleted ids stands in for it.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if the delete call itself failed. Nothing is changed
    /// in that case and the commit can be retried.
    pub async fn commit(&self) -> Result<CommitOutcome> {
        let (guard, plan) = {
            let state = self.state.lock().await;
            let Some(review) = state.as_ref() else {
                return Ok(CommitOutcome::Rejected(RejectReason::Unavailable));
            };
            let Some(guard) = ReconcileGuard::try_acquire(&self.reconciling) else {
                return Ok(CommitOutcome::Rejected(RejectReason::Reconciling));
            };
            let Some(plan) = review.plan_commit() else {
                tracing::debug!("[ReviewSession] Nothing to commit");
                return Ok(CommitOutcome::NothingToCommit);
            };
            (guard, plan)
        };

        tracing::info!(
            "[ReviewSession] Committing {} deletions (landing on {:?})",
            plan.pending.len(),
            plan.target.as_ref().map(ItemId::as_str)
        );

        let outcome = match self.store.delete_items(&plan.pending).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("[ReviewSession] Delete failed, nothing committed: {}", e);
                return Err(e);
            }
        };

        let fresh = match self.store.list_items().await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(
                    "[ReviewSession] Listing after delete failed, reconciling locally: {}",
                    e
                );
                surviving(&plan.pre_sequence, &outcome.deleted_ids)
            }
        };

        let (report, writes, order) = {
            let mut state = self.state.lock().await;
            let review = state
                .as_mut()
                .ok_or_else(|| CullerError::internal("Session closed during commit"))?;
            let report =
                review.apply_commit(&plan, &outcome, fresh, self.config.history_policy);
            let writes = PendingWrites {
                ledger: Some(review.ledger().clone()),
                last_viewed: review.last_viewed_id().cloned(),
            };
            (report, writes, self.write_order.lock().await)
        };

        if report.retained.is_empty() {
            tracing::info!(
                "[ReviewSession] Committed {} deletions, cursor {}",
                report.deleted.len(),
                report.cursor
            );
        } else {
            tracing::warn!(
                "[ReviewSession] Store removed {}/{} items; {} remain marked",
                report.deleted.len(),
                report.requested.len(),
                report.retained.len()
            );
        }

        self.flush(order, writes).await;
        drop(guard);

        self.emit(SessionEvent::Committed {
            deleted: report.deleted.clone(),
            failed: report.retained.clone(),
        });
        if report.collection_empty {
            self.emit(SessionEvent::CollectionEmpty);
        }

        Ok(CommitOutcome::Committed(report))
    }

    /// Re-lists the collection without deleting anything.
    ///
    /// The item under review stays under review. The ledger is left alone,
    /// including entries for items that have disappeared.
    pub async fn refresh(&self) -> Result<ViewOutcome> {
        let guard = {
            let state = self.state.lock().await;
            if state.is_none() {
                return Ok(ViewOutcome::Rejected(RejectReason::Unavailable));
            }
            match ReconcileGuard::try_acquire(&self.reconciling) {
                Some(guard) => guard,
                None => return Ok(ViewOutcome::Rejected(RejectReason::Reconciling)),
            }
        };

        let fresh = self.list_or_mark_unavailable().await?;

        let (snapshot, writes, order) = {
            let mut state = self.state.lock().await;
            let review = state
                .as_mut()
                .ok_or_else(|| CullerError::internal("Session closed during refresh"))?;
            let cursor = review.apply_refresh(fresh, self.config.history_policy);
            tracing::info!(
                "[ReviewSession] Refreshed: {} items, cursor {}",
                review.len(),
                cursor
            );
            let writes = PendingWrites {
                ledger: None,
                last_viewed: review.last_viewed_id().cloned(),
            };
            let snapshot = review.snapshot(self.config.lookahead, false);
            (snapshot, writes, self.write_order.lock().await)
        };

        self.flush(order, writes).await;
        drop(guard);

        if snapshot.len == 0 {
            self.emit(SessionEvent::CollectionEmpty);
        }
        Ok(ViewOutcome::Ready(snapshot))
    }

    // ============================================================================
    // Internals
    // ============================================================================

    async fn install(&self, review: ReviewState) -> ReviewSnapshot {
        let snapshot = review.snapshot(self.config.lookahead, false);
        *self.state.lock().await = Some(review);
        if snapshot.len == 0 {
            self.emit(SessionEvent::CollectionEmpty);
        }
        snapshot
    }

    async fn list_or_mark_unavailable(&self) -> Result<Vec<Item>> {
        match self.store.list_items().await {
            Ok(items) => Ok(items),
            Err(CullerError::PermissionDenied) => {
                self.mark_unavailable().await;
                Err(CullerError::PermissionDenied)
            }
            Err(e) => {
                tracing::warn!("[ReviewSession] Listing failed: {}", e);
                Err(e)
            }
        }
    }

    async fn mark_unavailable(&self) {
        tracing::warn!("[ReviewSession] Photo store access denied; session unavailable");
        *self.state.lock().await = None;
        self.emit(SessionEvent::Unavailable);
    }

    async fn flush(&self, _order: MutexGuard<'_, ()>, writes: PendingWrites) {
        if let Some(ledger) = writes.ledger {
            self.ledger_store.save(&ledger).await;
        }
        if let Some(id) = writes.last_viewed {
            self.position.save(&id).await;
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn surviving(sequence: &[Item], deleted: &BTreeSet<ItemId>) -> Vec<Item> {
    sequence
        .iter()
        .filter(|item| !deleted.contains(&item.id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use culler_core::item::DeleteOutcome;
    use culler_core::review::HistoryPolicy;
    use culler_core::state::keys;
    use culler_infrastructure::InMemoryStateRepository;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    // Mock ItemStore with scripted failures
    struct MockItemStore {
        items: StdMutex<Vec<Item>>,
        permission: StdMutex<PermissionState>,
        /// Ids the store silently fails to remove.
        stubborn: StdMutex<BTreeSet<ItemId>>,
        fail_delete: AtomicBool,
        fail_next_list: AtomicBool,
        /// When set, `delete_items` waits for a notification before proceeding.
        gate: Option<Arc<Notify>>,
    }

    impl MockItemStore {
        fn new(ids: &[&str]) -> Self {
            let items = ids
                .iter()
                .enumerate()
                .map(|(n, id)| {
                    Item::new(*id, Utc.timestamp_opt(10_000 - n as i64, 0).unwrap(), *id)
                })
                .collect();
            Self {
                items: StdMutex::new(items),
                permission: StdMutex::new(PermissionState::Granted),
                stubborn: StdMutex::new(BTreeSet::new()),
                fail_delete: AtomicBool::new(false),
                fail_next_list: AtomicBool::new(false),
                gate: None,
            }
        }

        fn gated(ids: &[&str], gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::new(ids)
            }
        }

        fn ids(&self) -> Vec<String> {
            self.items
                .lock()
                .unwrap()
                .iter()
                .map(|i| i.id.to_string())
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl ItemStore for MockItemStore {
        async fn permission(&self) -> PermissionState {
            *self.permission.lock().unwrap()
        }

        async fn request_permission(&self) -> PermissionState {
            let mut permission = self.permission.lock().unwrap();
            if *permission == PermissionState::NotDetermined {
                *permission = PermissionState::Granted;
            }
            *permission
        }

        async fn list_items(&self) -> Result<Vec<Item>> {
            if *self.permission.lock().unwrap() == PermissionState::Denied {
                return Err(CullerError::PermissionDenied);
            }
            if self.fail_next_list.swap(false, Ordering::SeqCst) {
                return Err(CullerError::store_unavailable("listing timed out"));
            }
            Ok(self.items.lock().unwrap().clone())
        }

        async fn delete_items(&self, ids: &BTreeSet<ItemId>) -> Result<DeleteOutcome> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(CullerError::store_unavailable("photo library busy"));
            }
            let stubborn = self.stubborn.lock().unwrap().clone();
            let removed: BTreeSet<ItemId> = ids.difference(&stubborn).cloned().collect();
            self.items
                .lock()
                .unwrap()
                .retain(|item| !removed.contains(&item.id));
            Ok(DeleteOutcome::new(removed))
        }
    }

    fn id(s: &str) -> ItemId {
        ItemId::from(s)
    }

    async fn open_session(
        store: Arc<MockItemStore>,
        repository: Arc<InMemoryStateRepository>,
    ) -> Arc<ReviewSession> {
        let session = Arc::new(ReviewSession::new(store, repository, ReviewConfig::default()));
        let outcome = session.open(None).await.unwrap();
        assert!(matches!(outcome, ViewOutcome::Ready(_)));
        session
    }

    async fn current_id(session: &ReviewSession) -> Option<String> {
        session
            .snapshot()
            .await
            .and_then(|s| s.current)
            .map(|i| i.id.to_string())
    }

    #[tokio::test]
    async fn test_tag_persists_ledger_and_position() {
        let repository = Arc::new(InMemoryStateRepository::new());
        let session =
            open_session(Arc::new(MockItemStore::new(&["a", "b"])), repository.clone()).await;

        session.tag(Disposition::Delete).await;

        assert_eq!(
            repository.get(keys::DISPOSITIONS).await.unwrap(),
            Some(r#"{"a":"delete"}"#.to_string())
        );
        assert_eq!(
            repository.get(keys::LAST_VIEWED_ID).await.unwrap(),
            Some("b".to_string())
        );
    }

    #[tokio::test]
    async fn test_operations_rejected_while_commit_in_flight() {
        let gate = Arc::new(Notify::new());
        let store = Arc::new(MockItemStore::gated(&["a", "b", "c"], gate.clone()));
        let session = open_session(store.clone(), Arc::new(InMemoryStateRepository::new())).await;
        session.tag(Disposition::Delete).await;

        let committing = {
            let session = session.clone();
            tokio::spawn(async move { session.commit().await })
        };
        while !session.is_reconciling() {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            session.tag(Disposition::Keep).await,
            TagOutcome::Rejected(RejectReason::Reconciling)
        );
        assert_eq!(
            session.undo().await,
            UndoOutcome::Rejected(RejectReason::Reconciling)
        );
        assert_eq!(
            session.commit().await.unwrap(),
            CommitOutcome::Rejected(RejectReason::Reconciling)
        );
        assert_eq!(
            session.refresh().await.unwrap(),
            ViewOutcome::Rejected(RejectReason::Reconciling)
        );
        assert!(session.snapshot().await.unwrap().reconciling);

        gate.notify_one();
        let outcome = committing.await.unwrap().unwrap();

        assert!(matches!(outcome, CommitOutcome::Committed(_)));
        assert!(!session.is_reconciling());
        assert_eq!(store.ids(), vec!["b", "c"]);
        assert_eq!(current_id(&session).await, Some("b".to_string()));
    }

    #[tokio::test]
    async fn test_failed_delete_changes_nothing() {
        let store = Arc::new(MockItemStore::new(&["a", "b"]));
        let session = open_session(store.clone(), Arc::new(InMemoryStateRepository::new())).await;
        session.tag(Disposition::Delete).await;
        let before = session.snapshot().await.unwrap();

        store.fail_delete.store(true, Ordering::SeqCst);
        let err = session.commit().await.unwrap_err();

        assert!(err.is_recoverable());
        assert!(!session.is_reconciling());
        assert_eq!(session.snapshot().await.unwrap(), before);
        assert!(matches!(session.undo().await, UndoOutcome::Undone { .. }));
    }

    #[tokio::test]
    async fn test_retry_after_failed_delete_succeeds() {
        let store = Arc::new(MockItemStore::new(&["a", "b"]));
        let session = open_session(store.clone(), Arc::new(InMemoryStateRepository::new())).await;
        session.tag(Disposition::Delete).await;

        store.fail_delete.store(true, Ordering::SeqCst);
        assert!(session.commit().await.is_err());
        store.fail_delete.store(false, Ordering::SeqCst);

        let CommitOutcome::Committed(report) = session.commit().await.unwrap() else {
            panic!("expected a committed outcome");
        };
        assert_eq!(report.deleted, BTreeSet::from([id("a")]));
    }

    #[tokio::test]
    async fn test_partial_delete_leaves_retained_marked() {
        let store = Arc::new(MockItemStore::new(&["a", "b", "c"]));
        store.stubborn.lock().unwrap().insert(id("b"));
        let session = open_session(store.clone(), Arc::new(InMemoryStateRepository::new())).await;
        let mut events = session.subscribe();
        session.tag(Disposition::Delete).await;
        session.tag(Disposition::Delete).await;

        let CommitOutcome::Committed(report) = session.commit().await.unwrap() else {
            panic!("expected a committed outcome");
        };

        assert_eq!(report.retained, BTreeSet::from([id("b")]));
        let snapshot = session.snapshot().await.unwrap();
        assert_eq!(snapshot.stats.marked_for_delete, 1);
        assert_eq!(snapshot.current.map(|i| i.id), Some(id("c")));
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::Committed {
                deleted: BTreeSet::from([id("a")]),
                failed: BTreeSet::from([id("b")]),
            }
        );
    }

    #[tokio::test]
    async fn test_listing_failure_after_delete_reconciles_locally() {
        let store = Arc::new(MockItemStore::new(&["a", "b", "c"]));
        let session = open_session(store.clone(), Arc::new(InMemoryStateRepository::new())).await;
        session.tag(Disposition::Keep).await;
        session.tag(Disposition::Delete).await;

        store.fail_next_list.store(true, Ordering::SeqCst);
        let CommitOutcome::Committed(report) = session.commit().await.unwrap() else {
            panic!("expected a committed outcome");
        };

        assert_eq!(report.deleted, BTreeSet::from([id("b")]));
        let snapshot = session.snapshot().await.unwrap();
        assert_eq!(snapshot.len, 2);
        assert_eq!(snapshot.current.map(|i| i.id), Some(id("c")));
    }

    #[tokio::test]
    async fn test_nothing_to_commit() {
        let session = open_session(
            Arc::new(MockItemStore::new(&["a"])),
            Arc::new(InMemoryStateRepository::new()),
        )
        .await;
        session.tag(Disposition::Keep).await;

        assert_eq!(
            session.commit().await.unwrap(),
            CommitOutcome::NothingToCommit
        );
        assert!(!session.is_reconciling());
    }

    #[tokio::test]
    async fn test_permission_denied_makes_session_unavailable() {
        let store = Arc::new(MockItemStore::new(&["a"]));
        *store.permission.lock().unwrap() = PermissionState::Denied;
        let session = ReviewSession::new(
            store,
            Arc::new(InMemoryStateRepository::new()),
            ReviewConfig::default(),
        );
        let mut events = session.subscribe();

        assert_eq!(
            session.open(None).await.unwrap_err(),
            CullerError::PermissionDenied
        );
        assert!(!session.is_available().await);
        assert!(session.snapshot().await.is_none());
        assert_eq!(events.recv().await.unwrap(), SessionEvent::Unavailable);
        assert_eq!(
            session.tag(Disposition::Keep).await,
            TagOutcome::Rejected(RejectReason::Unavailable)
        );
        assert_eq!(
            session.commit().await.unwrap(),
            CommitOutcome::Rejected(RejectReason::Unavailable)
        );
    }

    #[tokio::test]
    async fn test_undetermined_permission_is_requested() {
        let store = Arc::new(MockItemStore::new(&["a"]));
        *store.permission.lock().unwrap() = PermissionState::NotDetermined;
        let session = open_session(store, Arc::new(InMemoryStateRepository::new())).await;

        assert!(session.is_available().await);
    }

    #[tokio::test]
    async fn test_revoked_permission_on_refresh() {
        let store = Arc::new(MockItemStore::new(&["a"]));
        let session = open_session(store.clone(), Arc::new(InMemoryStateRepository::new())).await;

        *store.permission.lock().unwrap() = PermissionState::Denied;
        assert!(session.refresh().await.unwrap_err().is_permission_denied());
        assert!(!session.is_available().await);
    }

    #[tokio::test]
    async fn test_review_complete_event() {
        let session = open_session(
            Arc::new(MockItemStore::new(&["a"])),
            Arc::new(InMemoryStateRepository::new()),
        )
        .await;
        let mut events = session.subscribe();

        let outcome = session.tag(Disposition::Keep).await;

        assert!(matches!(outcome, TagOutcome::Tagged { complete: true, .. }));
        assert_eq!(events.recv().await.unwrap(), SessionEvent::ReviewComplete);
    }

    #[tokio::test]
    async fn test_jump_to() {
        let session = open_session(
            Arc::new(MockItemStore::new(&["a", "b", "c"])),
            Arc::new(InMemoryStateRepository::new()),
        )
        .await;

        let outcome = session.jump_to(&id("c")).await.unwrap();
        assert!(matches!(outcome, ViewOutcome::Ready(ref s) if s.cursor == 2));
        assert!(session.jump_to(&id("zzz")).await.unwrap_err().is_not_found());
        assert_eq!(current_id(&session).await, Some("c".to_string()));
    }

    #[tokio::test]
    async fn test_drop_policy_forgets_history_on_commit() {
        let store = Arc::new(MockItemStore::new(&["a", "b", "c"]));
        let config = ReviewConfig {
            history_policy: HistoryPolicy::Drop,
            ..ReviewConfig::default()
        };
        let session = ReviewSession::new(store, Arc::new(InMemoryStateRepository::new()), config);
        session.open(None).await.unwrap();
        session.tag(Disposition::Keep).await;
        session.tag(Disposition::Delete).await;

        session.commit().await.unwrap();

        assert_eq!(session.undo().await, UndoOutcome::NothingToUndo);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_undos_walk_back_one_step_each() {
        let store = Arc::new(MockItemStore::new(&["a", "b", "c", "d"]));
        let session = open_session(store, Arc::new(InMemoryStateRepository::new())).await;
        for _ in 0..3 {
            session.tag(Disposition::Delete).await;
        }

        let (first, second) = tokio::join!(session.undo(), session.undo());

        let mut undone: Vec<(String, usize)> = [first, second]
            .into_iter()
            .map(|outcome| match outcome {
                UndoOutcome::Undone { id, cursor, .. } => (id.to_string(), cursor),
                other => panic!("expected Undone, got {:?}", other),
            })
            .collect();
        undone.sort();
        assert_eq!(undone, vec![("b".to_string(), 1), ("c".to_string(), 2)]);

        let snapshot = session.snapshot().await.unwrap();
        assert_eq!(snapshot.cursor, 1);
        assert_eq!(snapshot.stats.marked_for_delete, 1);

        // Exactly one entry is left on the stack.
        assert_eq!(
            session.undo().await,
            UndoOutcome::Undone {
                id: id("a"),
                disposition: Disposition::Delete,
                cursor: 0,
            }
        );
        assert_eq!(session.undo().await, UndoOutcome::NothingToUndo);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_tag_and_undo_keep_ledger_behind_cursor() {
        let store = Arc::new(MockItemStore::new(&["a", "b", "c", "d"]));
        let repository = Arc::new(InMemoryStateRepository::new());
        let session = open_session(store, repository.clone()).await;
        session.tag(Disposition::Delete).await;
        session.tag(Disposition::Delete).await;

        let tagging = tokio::spawn({
            let session = session.clone();
            async move { session.tag(Disposition::Keep).await }
        });
        let undoing = tokio::spawn({
            let session = session.clone();
            async move { session.undo().await }
        });
        let (tagged, undone) = tokio::join!(tagging, undoing);

        assert!(matches!(tagged.unwrap(), TagOutcome::Tagged { .. }));
        assert!(matches!(undone.unwrap(), UndoOutcome::Undone { .. }));

        // Whichever ran first, the net effect is one tag and one undo.
        let snapshot = session.snapshot().await.unwrap();
        assert_eq!(snapshot.cursor, 2);
        assert_eq!(snapshot.stats.reviewed, 2);
        assert_eq!(
            snapshot.stats.kept + snapshot.stats.marked_for_delete,
            snapshot.stats.reviewed
        );
        assert_eq!(snapshot.current_disposition, None);
        assert_eq!(current_id(&session).await.as_deref(), Some("c"));

        // The persisted snapshot is the later of the two writes.
        let persisted = LedgerStore::new(repository.clone()).load().await;
        assert_eq!(persisted.len(), 2);
        assert_eq!(persisted.get(&id("c")), None);
        assert_eq!(
            repository.get(keys::LAST_VIEWED_ID).await.unwrap(),
            Some("c".to_string())
        );
    }

    #[tokio::test]
    async fn test_reindex_policy_allows_undo_across_commit() {
        let store = Arc::new(MockItemStore::new(&["a", "b", "c"]));
        let session = open_session(store, Arc::new(InMemoryStateRepository::new())).await;
        session.tag(Disposition::Keep).await;
        session.tag(Disposition::Delete).await;

        session.commit().await.unwrap();

        assert_eq!(
            session.undo().await,
            UndoOutcome::Undone {
                id: id("a"),
                disposition: Disposition::Keep,
                cursor: 0,
            }
        );
    }
}
