//! Run and session identifier generation.
//!
//! Run ids need to be unique per process invocation and sortable by creation
//! order; a monotonic counter combined with a random suffix gives both
//! without requiring a central allocator.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generates run/session identifiers of the form `run-{counter}-{suffix}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdGenerator;

impl IdGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generates a new run id, unique within this process.
    pub fn generate_run_id(&self) -> String {
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
        let suffix: u32 = rand::rng().random();
        format!("run-{counter:08x}-{suffix:08x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let gen = IdGenerator::new();
        let a = gen.generate_run_id();
        let b = gen.generate_run_id();
        assert_ne!(a, b);
    }

    #[test]
    fn generated_ids_carry_run_prefix() {
        let gen = IdGenerator::new();
        assert!(gen.generate_run_id().starts_with("run-"));
    }
}
