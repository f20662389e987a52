use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ping;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Damage {
    pub amount: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Heal(pub u32);

/// Shared call log used to observe invocation order across handlers.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock())
    }
}
