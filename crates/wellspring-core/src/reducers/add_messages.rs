use super::Reducer;
use crate::{channels::Channel, node::NodePartial, state::VersionedState};

/// Appends a node's new messages to the messages channel.
#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub struct AddMessages;

impl Reducer for AddMessages {
    fn apply(&self, state: &mut VersionedState, update: &NodePartial) {
        if let Some(messages) = &update.messages
            && !messages.is_empty()
        {
            state.messages.get_mut().extend(messages.iter().cloned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn appends_new_messages_without_dropping_existing() {
        let mut state = VersionedState::new_with_user_message("hi");
        let update = NodePartial::new().with_messages(vec![Message::assistant("hello")]);
        AddMessages.apply(&mut state, &update);
        assert_eq!(state.snapshot().messages.len(), 2);
    }

    #[test]
    fn empty_update_is_a_no_op() {
        let mut state = VersionedState::new_with_user_message("hi");
        AddMessages.apply(&mut state, &NodePartial::new());
        assert_eq!(state.snapshot().messages.len(), 1);
    }
}
