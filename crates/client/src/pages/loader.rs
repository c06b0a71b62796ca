//! Page load state with stale-result protection.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use super::PageError;

/// Where a page's data stands.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(PageError),
}

impl<T> LoadState<T> {
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Loaded(data) => Some(data),
            _ => None,
        }
    }

    #[must_use]
    pub const fn error(&self) -> Option<&PageError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Proof that a load was started. Only the ticket of the latest load may
/// commit its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Ticket(u64);

struct Slot<T> {
    generation: u64,
    state: LoadState<T>,
}

/// Load state of one page.
///
/// Every [`Loader::begin`] and [`Loader::unmount`] bumps a generation
/// counter; a result is committed only if no newer load started and the
/// page was not unmounted in the meantime.
pub struct Loader<T> {
    slot: Mutex<Slot<T>>,
}

impl<T> Default for Loader<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(Slot {
                generation: 0,
                state: LoadState::Idle,
            }),
        }
    }
}

impl<T> std::fmt::Debug for Loader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.lock();
        f.debug_struct("Loader")
            .field("generation", &slot.generation)
            .finish_non_exhaustive()
    }
}

impl<T> Loader<T> {
    fn lock(&self) -> std::sync::MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Loader<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load: state becomes `Loading` and earlier tickets go stale.
    pub fn begin(&self) -> Ticket {
        let mut slot = self.lock();
        slot.generation += 1;
        slot.state = LoadState::Loading;
        Ticket(slot.generation)
    }

    /// Store a result. Returns `false` and drops it when the ticket is stale.
    pub fn commit(&self, ticket: Ticket, data: T) -> bool {
        self.settle(ticket, LoadState::Loaded(data))
    }

    /// Store a failure. Returns `false` and drops it when the ticket is stale.
    pub fn fail(&self, ticket: Ticket, error: PageError) -> bool {
        self.settle(ticket, LoadState::Failed(error))
    }

    fn settle(&self, ticket: Ticket, state: LoadState<T>) -> bool {
        let mut slot = self.lock();
        if slot.generation != ticket.0 {
            tracing::debug!(
                ticket = ticket.0,
                current = slot.generation,
                "dropping stale load result"
            );
            return false;
        }
        slot.state = state;
        true
    }

    /// Forget the page: back to `Idle`, and in-flight loads go stale.
    pub fn unmount(&self) {
        let mut slot = self.lock();
        slot.generation += 1;
        slot.state = LoadState::Idle;
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> LoadState<T> {
        self.lock().state.clone()
    }

    /// Loaded data, if any.
    #[must_use]
    pub fn data(&self) -> Option<T> {
        self.lock().state.data().cloned()
    }

    /// Run `load` under a fresh ticket and return the resulting state.
    pub async fn run<F>(&self, load: F) -> LoadState<T>
    where
        F: Future<Output = Result<T, PageError>>,
    {
        let ticket = self.begin();
        match load.await {
            Ok(data) => self.commit(ticket, data),
            Err(error) => self.fail(ticket, error),
        };
        self.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorKind;

    fn error() -> PageError {
        PageError {
            kind: ErrorKind::Network,
            message: "offline".into(),
        }
    }

    #[test]
    fn test_lifecycle() {
        let loader = Loader::<Vec<u32>>::new();
        assert_eq!(loader.state(), LoadState::Idle);

        let ticket = loader.begin();
        assert!(loader.state().is_loading());
        assert!(loader.commit(ticket, vec![1, 2]));
        assert_eq!(loader.data(), Some(vec![1, 2]));
    }

    #[test]
    fn test_stale_ticket_is_dropped() {
        let loader = Loader::<u32>::new();
        let first = loader.begin();
        let second = loader.begin();

        assert!(loader.commit(second, 2));
        assert!(!loader.commit(first, 1));
        assert!(!loader.fail(first, error()));
        assert_eq!(loader.data(), Some(2));
    }

    #[test]
    fn test_unmount_drops_in_flight_result() {
        let loader = Loader::<u32>::new();
        let ticket = loader.begin();
        loader.unmount();
        assert!(!loader.commit(ticket, 1));
        assert_eq!(loader.state(), LoadState::Idle);
    }

    #[tokio::test]
    async fn test_run() {
        let loader = Loader::<u32>::new();
        assert_eq!(loader.run(async { Ok(7) }).await, LoadState::Loaded(7));
        assert_eq!(
            loader.run(async { Err(error()) }).await.error(),
            Some(&error())
        );
    }
}
