//! Typed identifiers for runtime execution infrastructure.
//!
//! The rest of the runtime passes session ids and step numbers around as
//! plain `String`/`u64` for ergonomics with `sqlx` and `serde_json`; these
//! newtypes exist for call sites that want the extra type safety without
//! committing the whole runtime to them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for a workflow session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Monotonic superstep counter within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StepNumber(pub u64);

impl StepNumber {
    pub fn new(step: u64) -> Self {
        Self(step)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for StepNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StepNumber {
    fn from(step: u64) -> Self {
        Self(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_round_trips_through_string() {
        let id = SessionId::new("session-1");
        assert_eq!(id.as_str(), "session-1");
        assert_eq!(id.to_string(), "session-1");
    }

    #[test]
    fn step_number_advances_monotonically() {
        let step = StepNumber::new(0);
        assert_eq!(step.next().get(), 1);
    }
}
