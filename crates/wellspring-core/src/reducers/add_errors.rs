use super::Reducer;
use crate::{channels::Channel, node::NodePartial, state::VersionedState};

/// Appends a node's new error events to the errors channel.
#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub struct AddErrors;

impl Reducer for AddErrors {
    fn apply(&self, state: &mut VersionedState, update: &NodePartial) {
        if let Some(errors) = &update.errors
            && !errors.is_empty()
        {
            state.errors.get_mut().extend(errors.iter().cloned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::errors::{ErrorEvent, LadderError};

    #[test]
    fn appends_new_errors() {
        let mut state = VersionedState::new_with_user_message("hi");
        let update = NodePartial::new()
            .with_errors(vec![ErrorEvent::app(LadderError::msg("boom"))]);
        AddErrors.apply(&mut state, &update);
        assert_eq!(state.snapshot().errors.len(), 1);
    }

    #[test]
    fn empty_update_is_a_no_op() {
        let mut state = VersionedState::new_with_user_message("hi");
        AddErrors.apply(&mut state, &NodePartial::new());
        assert!(state.snapshot().errors.is_empty());
    }
}
