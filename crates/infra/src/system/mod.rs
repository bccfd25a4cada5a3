use chrono::prelude::*;
use std::sync::Mutex;

// Mocking out time so that it is possible to run tests that depend on time.
pub trait ISys: Send + Sync {
    /// The current wall-clock datetime in the engine's local timezone.
    /// Schedule matching and fire-record day keys both derive from this.
    fn local_now(&self) -> NaiveDateTime;
}

/// System that gets the real time and is used when not testing
pub struct RealSys {}
impl ISys for RealSys {
    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Settable clock for tests that exercise minute matching and day
/// rollover without waiting on real time.
pub struct FakeSys {
    now: Mutex<NaiveDateTime>,
}

impl FakeSys {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap() = now;
    }
}

impl ISys for FakeSys {
    fn local_now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}
