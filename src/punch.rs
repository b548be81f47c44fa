//! The punch-clock state machine. Two states, no self-transitions, no
//! timeouts: an abandoned session stays open until an explicit sign-out, which
//! matches real-world "forgot to sign out" semantics.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::{
    store::{entities::Session, kv::KvStore, session_store::SessionStore},
    utils::clock::Clock,
};

/// Rejected punch transition. State is left untouched in every case.
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum PunchError {
    #[error("already signed in since {0}")]
    AlreadyActive(DateTime<Utc>),

    #[error("not signed in")]
    NotActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchState {
    Idle,
    Active(DateTime<Utc>),
}

/// Derives machine state from the persisted in-progress marker. This is the
/// single source of truth for initial state; the machine never starts blind.
pub fn derive_state(marker: Option<DateTime<Utc>>) -> PunchState {
    match marker {
        Some(start) => PunchState::Active(start),
        None => PunchState::Idle,
    }
}

pub struct PunchClock<S: KvStore> {
    store: SessionStore<S>,
    clock: Box<dyn Clock>,
    state: PunchState,
}

impl<S: KvStore> PunchClock<S> {
    /// Restores the machine from storage, resuming an open session if its
    /// marker survived a reload.
    pub fn restore(store: SessionStore<S>, clock: Box<dyn Clock>) -> Result<Self> {
        let state = derive_state(store.in_progress()?);
        Ok(Self { store, clock, state })
    }

    pub fn state(&self) -> PunchState {
        self.state
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    /// Starts a session at the current time. A double punch-in is rejected
    /// rather than silently overwriting the start, which would lose elapsed
    /// time.
    pub fn punch_in(&mut self) -> Result<DateTime<Utc>> {
        if let PunchState::Active(start) = self.state {
            return Err(PunchError::AlreadyActive(start).into());
        }
        let start = self.clock.time();
        // marker goes down before any log mutation so a crash after this point
        // resumes the session on reload
        self.store.set_in_progress(start)?;
        self.state = PunchState::Active(start);
        Ok(start)
    }

    /// Finalizes the open session and returns it for display. The marker is
    /// cleared only after the log append succeeded.
    pub fn punch_out(&mut self) -> Result<Session> {
        let PunchState::Active(start) = self.state else {
            return Err(PunchError::NotActive.into());
        };
        let session = Session::finished(start, self.clock.time());
        self.store.append_finished(session.clone())?;
        self.store.clear_in_progress()?;
        self.state = PunchState::Idle;
        Ok(session)
    }

    /// Read-only query for live display; does not transition state. Polling it
    /// is a presentation concern.
    pub fn elapsed(&self) -> Result<Duration, PunchError> {
        match self.state {
            PunchState::Active(start) => Ok(self.clock.time() - start),
            PunchState::Idle => Err(PunchError::NotActive),
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::{
        punch::{derive_state, PunchClock, PunchError, PunchState},
        store::{
            kv::{MemoryKvStore, MockKvStore},
            session_store::SessionStore,
        },
        utils::clock::Clock,
    };

    /// Clock that advances a fixed step on every punch boundary check.
    struct SteppingClock {
        start: DateTime<Utc>,
        step: Duration,
        calls: std::cell::Cell<i64>,
    }

    impl SteppingClock {
        fn new(start: DateTime<Utc>, step: Duration) -> Self {
            Self { start, step, calls: std::cell::Cell::new(0) }
        }
    }

    impl Clock for SteppingClock {
        fn time(&self) -> DateTime<Utc> {
            let calls = self.calls.get();
            self.calls.set(calls + 1);
            self.start + self.step * calls as i32
        }
    }

    fn test_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap()
    }

    fn restored_clock() -> Result<PunchClock<MemoryKvStore>> {
        PunchClock::restore(
            SessionStore::new(MemoryKvStore::new()),
            Box::new(SteppingClock::new(test_start(), Duration::minutes(30))),
        )
    }

    #[test]
    fn derive_state_is_total() {
        assert_eq!(derive_state(None), PunchState::Idle);
        assert_eq!(derive_state(Some(test_start())), PunchState::Active(test_start()));
    }

    #[test]
    fn completed_pairs_append_ordered_sessions() -> Result<()> {
        let mut clock = restored_clock()?;

        for _ in 0..3 {
            clock.punch_in()?;
            clock.punch_out()?;
        }

        let log = clock.store().load_log()?;
        assert_eq!(log.len(), 3);
        for session in &log {
            assert!(session.end.unwrap() >= session.start);
        }
        // newest first
        assert!(log[0].start > log[1].start);
        assert!(log[1].start > log[2].start);
        Ok(())
    }

    #[test]
    fn double_punch_in_is_rejected_and_state_kept() -> Result<()> {
        let mut clock = restored_clock()?;
        let start = clock.punch_in()?;

        let err = clock.punch_in().unwrap_err();
        assert_eq!(
            err.downcast_ref::<PunchError>(),
            Some(&PunchError::AlreadyActive(start))
        );
        assert_eq!(clock.state(), PunchState::Active(start));
        Ok(())
    }

    #[test]
    fn punch_out_while_idle_is_rejected() -> Result<()> {
        let mut clock = restored_clock()?;

        let err = clock.punch_out().unwrap_err();
        assert_eq!(err.downcast_ref::<PunchError>(), Some(&PunchError::NotActive));
        assert_eq!(clock.state(), PunchState::Idle);
        assert_eq!(clock.elapsed(), Err(PunchError::NotActive));
        Ok(())
    }

    #[test]
    fn restore_resumes_active_session() -> Result<()> {
        let kv = MemoryKvStore::new();
        let store = SessionStore::new(&kv);
        store.set_in_progress(test_start())?;

        let clock = PunchClock::restore(
            store,
            Box::new(SteppingClock::new(test_start() + Duration::hours(2), Duration::zero())),
        )?;
        assert_eq!(clock.state(), PunchState::Active(test_start()));
        assert_eq!(clock.elapsed(), Ok(Duration::hours(2)));
        Ok(())
    }

    #[test]
    fn failed_marker_write_leaves_machine_idle() -> Result<()> {
        let mut kv = MockKvStore::new();
        kv.expect_get().returning(|_| Ok(None));
        kv.expect_set()
            .returning(|_, _| Err(anyhow::anyhow!("disk full")));

        let mut clock = PunchClock::restore(
            SessionStore::new(kv),
            Box::new(SteppingClock::new(test_start(), Duration::zero())),
        )?;

        assert!(clock.punch_in().is_err());
        assert_eq!(clock.state(), PunchState::Idle);
        Ok(())
    }
}
