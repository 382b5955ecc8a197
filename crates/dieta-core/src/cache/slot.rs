//! The single current-plan slot and the state derived from it.
//!
//! Valid slot transitions:
//!
//! ```text
//! Empty     -> Persisted   (load completes)
//! Empty     -> Fetched     (fetch completes)
//! Persisted -> Fetched     (fetch completes, late or not)
//! Persisted -> Persisted   (reload)
//! Fetched   -> Fetched     (newer fetch)
//! *         -> Empty       (clear, bumps the generation)
//! ```
//!
//! `Fetched -> Persisted` is never valid: a fetched plan always outranks a
//! persisted one.

use crate::error::PlanError;
use crate::plan::DietPlan;

/// Where the current plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSource {
    Persisted,
    Fetched,
}

/// The controller's single mutable plan slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CacheSlot {
    #[default]
    Empty,
    Persisted(DietPlan),
    Fetched(DietPlan),
}

impl CacheSlot {
    pub fn plan(&self) -> Option<&DietPlan> {
        match self {
            Self::Empty => None,
            Self::Persisted(plan) | Self::Fetched(plan) => Some(plan),
        }
    }

    pub fn source(&self) -> Option<PlanSource> {
        match self {
            Self::Empty => None,
            Self::Persisted(_) => Some(PlanSource::Persisted),
            Self::Fetched(_) => Some(PlanSource::Fetched),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Precedence rank: `Fetched` > `Persisted` > `Empty`.
    fn rank(&self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Persisted(_) => 1,
            Self::Fetched(_) => 2,
        }
    }

    /// Check whether moving from `self` to `next` respects precedence.
    pub fn can_promote_to(&self, next: &CacheSlot) -> bool {
        !next.is_empty() && next.rank() >= self.rank()
    }
}

/// What the presentation layer should show right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanView {
    /// A fetch is in flight and there is nothing to show yet.
    Loading,
    /// The last fetch failed and there is nothing to fall back on.
    Failed(PlanError),
    /// A plan is available, possibly while a newer one is being fetched.
    Ready { plan: DietPlan, source: PlanSource },
    /// No plan, no fetch in flight, no failure.
    Empty,
}

/// Everything the controller tracks. Observers receive snapshots of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheState {
    pub slot: CacheSlot,
    /// Bumped by every clear. Completions carrying an older generation are
    /// discarded.
    pub generation: u64,
    /// Fetches started in the current generation that have not completed.
    pub fetches_in_flight: u32,
    /// Failure of the most recent fetch in the current generation, if it
    /// failed.
    pub last_fetch_error: Option<PlanError>,
}

impl CacheState {
    /// Derive the view.
    ///
    /// A plan in the slot always wins, even while a fetch is outstanding.
    pub fn view(&self) -> PlanView {
        if let (Some(plan), Some(source)) = (self.slot.plan(), self.slot.source()) {
            return PlanView::Ready {
                plan: plan.clone(),
                source,
            };
        }
        if self.fetches_in_flight > 0 {
            return PlanView::Loading;
        }
        match &self.last_fetch_error {
            Some(err) => PlanView::Failed(err.clone()),
            None => PlanView::Empty,
        }
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Record the start of a fetch and return its generation.
    pub(crate) fn begin_fetch(&mut self) -> u64 {
        self.fetches_in_flight += 1;
        self.generation
    }

    /// Record the end of a fetch started in `generation`.
    ///
    /// Returns `false` (and changes nothing) if a clear happened since.
    pub(crate) fn finish_fetch(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);
        true
    }

    /// Apply a successful fetch started in `generation`.
    pub(crate) fn promote_fetched(&mut self, generation: u64, plan: DietPlan) -> bool {
        if !self.finish_fetch(generation) {
            return false;
        }
        self.slot = CacheSlot::Fetched(plan);
        self.last_fetch_error = None;
        true
    }

    /// Apply a failed fetch started in `generation`.
    pub(crate) fn record_fetch_failure(&mut self, generation: u64, err: PlanError) -> bool {
        if !self.finish_fetch(generation) {
            return false;
        }
        self.last_fetch_error = Some(err);
        true
    }

    /// Apply a persisted plan read in `generation`.
    ///
    /// Ignored if a clear happened since or a fetched plan already holds the
    /// slot.
    pub(crate) fn promote_persisted(&mut self, generation: u64, plan: DietPlan) -> bool {
        let next = CacheSlot::Persisted(plan);
        if !self.is_current(generation) || !self.slot.can_promote_to(&next) {
            return false;
        }
        self.slot = next;
        true
    }

    /// Reset to `Empty` and start a new generation.
    pub(crate) fn reset(&mut self) {
        self.slot = CacheSlot::Empty;
        self.generation += 1;
        self.fetches_in_flight = 0;
        self.last_fetch_error = None;
    }
}
