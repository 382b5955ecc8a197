//! The plan cache controller.
//!
//! Owns the current-plan slot and reconciles the two ways a plan arrives:
//! a fresh fetch from the generation service and the copy saved by a
//! previous run. Both may be in flight at once and may complete in either
//! order; the slot only ever moves up in precedence until a clear.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::error::PlanError;
use crate::generation::GenerationClient;
use crate::plan::{self, DietPlan, UserProfile};
use crate::store::{PLAN_KEY, PlanStore};

use super::slot::{CacheSlot, CacheState, PlanView};

/// Result of a completed [`PlanCacheController::request_plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The fetched plan now holds the slot. `persisted` is `false` when the
    /// store write failed; the plan is still shown for this session.
    Promoted { persisted: bool },
    /// A clear happened while the fetch was in flight; the result was
    /// dropped.
    Superseded,
    /// The fetch failed but a saved plan is being shown instead.
    Absorbed(PlanError),
}

/// Result of [`PlanCacheController::load_persisted`]. Loading never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The saved plan now holds the slot.
    Loaded,
    /// A saved plan was read but a fetched plan or a clear got there first.
    Ignored,
    /// Nothing is saved.
    Absent,
    /// The saved blob could not be read or decoded; treated as absent.
    Unreadable(PlanError),
}

/// Single authority for which diet plan the user sees.
///
/// The store is injected once and never reopened. State lives in a
/// [`watch`] channel so every transition is observable through
/// [`Self::subscribe`].
pub struct PlanCacheController {
    client: Arc<dyn GenerationClient>,
    store: Arc<dyn PlanStore>,
    state: watch::Sender<CacheState>,
    /// Serializes store writes: a fetch's check-write-promote sequence and a
    /// clear's delete never interleave.
    write_lock: Mutex<()>,
}

impl PlanCacheController {
    pub fn new(client: Arc<dyn GenerationClient>, store: Arc<dyn PlanStore>) -> Self {
        Self {
            client,
            store,
            state: watch::Sender::new(CacheState::default()),
            write_lock: Mutex::new(()),
        }
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<CacheState> {
        self.state.subscribe()
    }

    /// Snapshot of the full cache state.
    pub fn state(&self) -> CacheState {
        self.state.borrow().clone()
    }

    /// The plan currently held by the slot, if any.
    pub fn current_plan(&self) -> Option<DietPlan> {
        self.state.borrow().slot.plan().cloned()
    }

    pub fn slot(&self) -> CacheSlot {
        self.state.borrow().slot.clone()
    }

    /// What the presentation layer should render now.
    pub fn view(&self) -> PlanView {
        self.state.borrow().view()
    }

    fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    /// Fetch a new plan for `profile`, persist it, and promote it.
    ///
    /// Issues exactly one request. Returns:
    /// - `Err(InvalidInput)` for an incomplete profile, before any I/O.
    /// - `Err(FetchFailed)` when the fetch fails and there is no plan to
    ///   fall back on.
    /// - `Ok(Absorbed)` when the fetch fails but a plan is being shown.
    ///
    /// A clear issued while the fetch is in flight wins: the late result is
    /// neither shown nor left in the store.
    pub async fn request_plan(&self, profile: &UserProfile) -> Result<FetchOutcome, PlanError> {
        profile.validate()?;

        let mut generation = 0;
        self.state.send_modify(|state| generation = state.begin_fetch());
        debug!(generation, client = self.client.name(), "fetch started");

        let plan = match self.client.generate(profile).await {
            Ok(plan) => plan,
            Err(e) => return self.fail_fetch(generation, PlanError::fetch(&e)),
        };

        // Check, write and promote under the write lock so a clear is ordered
        // entirely before or after this fetch's effect on the store.
        let _write = self.write_lock.lock().await;

        if self.generation() != generation {
            info!(generation, "plan cleared during fetch; discarding result");
            return Ok(FetchOutcome::Superseded);
        }

        let persisted = self.persist(&plan).await;

        let plan_name = plan.name.clone();
        let promoted = self
            .state
            .send_if_modified(|state| state.promote_fetched(generation, plan));
        if !promoted {
            // The pending clear deletes the copy once it gets the lock.
            info!(generation, "plan cleared during save; discarding result");
            return Ok(FetchOutcome::Superseded);
        }

        info!(plan = %plan_name, persisted, "fetched plan promoted");
        Ok(FetchOutcome::Promoted { persisted })
    }

    /// Record a fetch failure and decide whether it is absorbed.
    fn fail_fetch(&self, generation: u64, err: PlanError) -> Result<FetchOutcome, PlanError> {
        let mut recorded = false;
        let mut has_plan = false;
        self.state.send_if_modified(|state| {
            recorded = state.record_fetch_failure(generation, err.clone());
            has_plan = !state.slot.is_empty();
            recorded
        });

        if !recorded {
            debug!(generation, error = %err, "fetch failed after clear; ignoring");
            return Ok(FetchOutcome::Superseded);
        }
        if has_plan {
            warn!(error = %err, "fetch failed; keeping the plan already shown");
            return Ok(FetchOutcome::Absorbed(err));
        }
        warn!(error = %err, "fetch failed with no plan to fall back on");
        Err(err)
    }

    /// Write `plan` to the store. Failures are logged, not propagated.
    async fn persist(&self, plan: &DietPlan) -> bool {
        let result = match plan::encode(plan) {
            Ok(blob) => self
                .store
                .set(PLAN_KEY, &blob)
                .await
                .map_err(|e| PlanError::store_write(&e)),
            Err(e) => Err(PlanError::StoreWriteFailed(e.to_string())),
        };

        match result {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "could not save fetched plan");
                false
            }
        }
    }

    /// Read the saved plan and show it unless something better is already
    /// shown.
    ///
    /// Missing or corrupt data is not an error.
    pub async fn load_persisted(&self) -> LoadOutcome {
        let generation = self.generation();

        let blob = match self.store.get(PLAN_KEY).await {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                debug!("no saved plan");
                return LoadOutcome::Absent;
            }
            Err(e) => {
                let err = PlanError::store_read(&e);
                warn!(error = %err, "could not read saved plan");
                return LoadOutcome::Unreadable(err);
            }
        };

        let plan = match plan::decode(&blob) {
            Ok(plan) => plan,
            Err(e) => {
                let err = PlanError::StoreReadFailed(e.to_string());
                warn!(error = %err, "saved plan is corrupt; ignoring it");
                return LoadOutcome::Unreadable(err);
            }
        };

        let plan_name = plan.name.clone();
        let loaded = self
            .state
            .send_if_modified(|state| state.promote_persisted(generation, plan));

        if loaded {
            info!(plan = %plan_name, "saved plan loaded");
            LoadOutcome::Loaded
        } else {
            debug!(plan = %plan_name, "saved plan ignored; slot already decided");
            LoadOutcome::Ignored
        }
    }

    /// Forget the current plan: delete the saved copy and empty the slot.
    ///
    /// Safe to call repeatedly. The slot is emptied immediately; the delete
    /// waits for a save already in progress so it removes that copy too.
    /// The slot is emptied even if the delete fails; the failure is returned
    /// so the caller can report it.
    pub async fn clear(&self) -> Result<(), PlanError> {
        self.state.send_modify(CacheState::reset);
        let generation = self.generation();
        let _write = self.write_lock.lock().await;

        self.store.delete(PLAN_KEY).await.map_err(|e| {
            let err = PlanError::store_write(&e);
            warn!(error = %err, "could not delete saved plan");
            err
        })?;

        info!(generation, "plan cleared");
        Ok(())
    }

    /// Share text for the plan currently shown.
    pub fn export_text(&self) -> Result<String, PlanError> {
        plan::export_text(self.state.borrow().slot.plan())
    }

    /// Startup flow: fetch a new plan and load the saved one concurrently,
    /// then return what should be shown.
    ///
    /// Only an invalid profile is an error; fetch failures are reflected in
    /// the returned view.
    pub async fn mount(&self, profile: &UserProfile) -> Result<PlanView, PlanError> {
        profile.validate()?;

        let (fetched, loaded) = tokio::join!(self.request_plan(profile), self.load_persisted());
        debug!(?fetched, ?loaded, "mount settled");

        Ok(self.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::{Result, bail};
    use async_trait::async_trait;

    use crate::cache::PlanSource;
    use crate::plan::Meal;
    use crate::store::MemoryStore;

    struct StubClient {
        plan: Option<DietPlan>,
    }

    #[async_trait]
    impl GenerationClient for StubClient {
        fn name(&self) -> &str {
            "stub"
        }

        async fn generate(&self, _profile: &UserProfile) -> Result<DietPlan> {
            match &self.plan {
                Some(plan) => Ok(plan.clone()),
                None => bail!("service unavailable"),
            }
        }
    }

    struct ReadOnlyStore;

    #[async_trait]
    impl PlanStore for ReadOnlyStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _blob: &str) -> Result<()> {
            bail!("disk full")
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            bail!("read-only")
        }
    }

    fn profile() -> UserProfile {
        UserProfile {
            name: "Ana".to_string(),
            age: "29".to_string(),
            gender: "Feminino".to_string(),
            height: "1.65".to_string(),
            weight: "62".to_string(),
            objective: "Perder peso".to_string(),
            level: "Sedentário".to_string(),
        }
    }

    fn plan(name: &str) -> DietPlan {
        DietPlan {
            name: name.to_string(),
            objective: "Perder peso".to_string(),
            meals: vec![Meal {
                name: "Café".to_string(),
                time: "08:00".to_string(),
                foods: vec!["Ovos".to_string(), "Aveia".to_string()],
            }],
            supplements: vec!["Whey".to_string()],
        }
    }

    fn controller(client_plan: Option<DietPlan>, store: Arc<dyn PlanStore>) -> PlanCacheController {
        PlanCacheController::new(Arc::new(StubClient { plan: client_plan }), store)
    }

    #[tokio::test]
    async fn request_plan_promotes_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let ctl = controller(Some(plan("novo")), store.clone());

        let outcome = ctl.request_plan(&profile()).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Promoted { persisted: true });
        assert_eq!(ctl.current_plan(), Some(plan("novo")));
        assert_eq!(ctl.slot(), CacheSlot::Fetched(plan("novo")));

        let blob = store.get(PLAN_KEY).await.unwrap().expect("plan should be saved");
        assert_eq!(plan::decode(&blob).unwrap(), plan("novo"));
    }

    #[tokio::test]
    async fn invalid_profile_is_rejected_before_any_io() {
        let store = Arc::new(MemoryStore::new());
        let ctl = controller(Some(plan("novo")), store.clone());
        let mut incomplete = profile();
        incomplete.weight = String::new();

        let err = ctl.request_plan(&incomplete).await.unwrap_err();
        assert!(matches!(err, PlanError::InvalidInput(_)));
        assert_eq!(ctl.state(), CacheState::default(), "state must be untouched");
        assert_eq!(store.get(PLAN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn fetch_failure_without_plan_is_reported() {
        let ctl = controller(None, Arc::new(MemoryStore::new()));

        let err = ctl.request_plan(&profile()).await.unwrap_err();
        assert!(matches!(err, PlanError::FetchFailed(ref msg) if msg.contains("service unavailable")));
        assert_eq!(ctl.view(), PlanView::Failed(err));
    }

    #[tokio::test]
    async fn fetch_failure_is_absorbed_by_saved_plan() {
        let blob = plan::encode(&plan("antigo")).unwrap();
        let ctl = controller(None, Arc::new(MemoryStore::with_entry(PLAN_KEY, blob)));

        assert_eq!(ctl.load_persisted().await, LoadOutcome::Loaded);
        let outcome = ctl.request_plan(&profile()).await.unwrap();

        assert!(matches!(outcome, FetchOutcome::Absorbed(PlanError::FetchFailed(_))));
        assert_eq!(
            ctl.view(),
            PlanView::Ready {
                plan: plan("antigo"),
                source: PlanSource::Persisted
            }
        );
    }

    #[tokio::test]
    async fn store_write_failure_keeps_fetched_plan() {
        let ctl = controller(Some(plan("novo")), Arc::new(ReadOnlyStore));

        let outcome = ctl.request_plan(&profile()).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Promoted { persisted: false });
        assert_eq!(ctl.current_plan(), Some(plan("novo")));
    }

    #[tokio::test]
    async fn load_absent_is_a_no_op() {
        let ctl = controller(None, Arc::new(MemoryStore::new()));
        assert_eq!(ctl.load_persisted().await, LoadOutcome::Absent);
        assert_eq!(ctl.slot(), CacheSlot::Empty);
    }

    #[tokio::test]
    async fn load_corrupt_is_a_no_op() {
        let ctl = controller(None, Arc::new(MemoryStore::with_entry(PLAN_KEY, "{not json")));

        let outcome = ctl.load_persisted().await;
        assert!(matches!(outcome, LoadOutcome::Unreadable(PlanError::StoreReadFailed(_))));
        assert_eq!(ctl.slot(), CacheSlot::Empty);
        assert_eq!(ctl.view(), PlanView::Empty);
    }

    #[tokio::test]
    async fn load_after_fetch_is_ignored() {
        let store = Arc::new(MemoryStore::new());
        let ctl = controller(Some(plan("novo")), store.clone());

        ctl.request_plan(&profile()).await.unwrap();
        // Simulate a stale copy appearing in the store.
        store
            .set(PLAN_KEY, &plan::encode(&plan("antigo")).unwrap())
            .await
            .unwrap();

        assert_eq!(ctl.load_persisted().await, LoadOutcome::Ignored);
        assert_eq!(ctl.current_plan(), Some(plan("novo")));
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let ctl = controller(Some(plan("novo")), store.clone());
        ctl.request_plan(&profile()).await.unwrap();

        ctl.clear().await.unwrap();
        assert_eq!(ctl.slot(), CacheSlot::Empty);
        assert_eq!(store.get(PLAN_KEY).await.unwrap(), None);

        ctl.clear().await.unwrap();
        assert_eq!(ctl.slot(), CacheSlot::Empty);
        assert_eq!(ctl.view(), PlanView::Empty);
    }

    #[tokio::test]
    async fn clear_reports_delete_failure_but_empties_slot() {
        let ctl = controller(Some(plan("novo")), Arc::new(ReadOnlyStore));
        ctl.request_plan(&profile()).await.unwrap();

        let err = ctl.clear().await.unwrap_err();
        assert!(matches!(err, PlanError::StoreWriteFailed(_)));
        assert_eq!(ctl.slot(), CacheSlot::Empty);
    }

    #[tokio::test]
    async fn export_text_uses_current_plan() {
        let ctl = controller(Some(plan("Plano A")), Arc::new(MemoryStore::new()));
        assert_eq!(ctl.export_text(), Err(PlanError::EmptyPlan));

        ctl.request_plan(&profile()).await.unwrap();
        assert_eq!(
            ctl.export_text().unwrap(),
            "Dieta: Plano A - Objetivo: Perder peso\n\n\n- Nome: Café\n- Horário: 08:00\n- Alimentos: Ovos, Aveia\n\n- Dica Suplemento: Whey"
        );
    }

    #[tokio::test]
    async fn export_text_on_empty_has_no_side_effect() {
        let ctl = controller(None, Arc::new(MemoryStore::new()));
        let before = ctl.state();
        assert_eq!(ctl.export_text(), Err(PlanError::EmptyPlan));
        assert_eq!(ctl.state(), before);
    }

    #[tokio::test]
    async fn mount_prefers_fetched_plan() {
        let blob = plan::encode(&plan("antigo")).unwrap();
        let ctl = controller(
            Some(plan("novo")),
            Arc::new(MemoryStore::with_entry(PLAN_KEY, blob)),
        );

        let view = ctl.mount(&profile()).await.unwrap();
        assert_eq!(
            view,
            PlanView::Ready {
                plan: plan("novo"),
                source: PlanSource::Fetched
            }
        );
    }

    #[tokio::test]
    async fn mount_falls_back_to_saved_plan() {
        let blob = plan::encode(&plan("antigo")).unwrap();
        let ctl = controller(None, Arc::new(MemoryStore::with_entry(PLAN_KEY, blob)));

        let view = ctl.mount(&profile()).await.unwrap();
        assert_eq!(
            view,
            PlanView::Ready {
                plan: plan("antigo"),
                source: PlanSource::Persisted
            }
        );
    }

    #[tokio::test]
    async fn mount_reports_failure_with_nothing_saved() {
        let ctl = controller(None, Arc::new(MemoryStore::new()));
        let view = ctl.mount(&profile()).await.unwrap();
        assert!(matches!(view, PlanView::Failed(PlanError::FetchFailed(_))));
    }
}
