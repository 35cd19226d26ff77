//! Events that carry data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// An event paired with an optional payload.
///
/// Equality and hashing only look at the event, so a `Signal` can be used as
/// the event type of a machine: transitions registered for
/// `Signal::of(Coin)` are triggered by `Signal::with(Coin, 25)`, and actions
/// read the payload of the signal that fired.
///
/// ```
/// use arbor::signal::Signal;
///
/// let registered: Signal<&str, u32> = Signal::of("coin");
/// let fired = Signal::with("coin", 25);
///
/// assert_eq!(registered, fired);
/// assert_eq!(fired.payload(), Some(&25));
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct Signal<E, T> {
    event: E,
    payload: Option<T>,
}

impl<E, T> Signal<E, T> {
    /// Signal without payload, typically used when registering transitions.
    pub fn of(event: E) -> Self {
        Self {
            event,
            payload: None,
        }
    }

    pub fn with(event: E, payload: T) -> Self {
        Self {
            event,
            payload: Some(payload),
        }
    }

    pub fn event(&self) -> &E {
        &self.event
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    pub fn into_payload(self) -> Option<T> {
        self.payload
    }
}

impl<E: PartialEq, T> PartialEq for Signal<E, T> {
    fn eq(&self, other: &Self) -> bool {
        self.event == other.event
    }
}

impl<E: Eq, T> Eq for Signal<E, T> {}

impl<E: Hash, T> Hash for Signal<E, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.event.hash(state);
    }
}

impl<E: fmt::Debug, T: fmt::Debug> fmt::Debug for Signal<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Some(payload) => write!(f, "{:?}({payload:?})", self.event),
            None => write!(f, "{:?}", self.event),
        }
    }
}
