//! Constructors for the small collection types nodes pass around, so call
//! sites don't need to spell out `FxHashMap::default()` everywhere.

use rustc_hash::FxHashMap;
use serde_json::Value;

/// An empty extras map, ready for a node to `.insert(...)` into before
/// wrapping it in a [`NodePartial`](crate::node::NodePartial).
pub fn new_extra_map() -> FxHashMap<String, Value> {
    FxHashMap::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_extra_map_starts_empty() {
        assert!(new_extra_map().is_empty());
    }
}
