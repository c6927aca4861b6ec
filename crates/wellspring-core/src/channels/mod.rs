//! Versioned state channels.
//!
//! Each channel wraps one piece of [`VersionedState`](crate::state::VersionedState)
//! data with a monotonic version counter. Reducers mutate a channel's data
//! through [`Channel::get_mut`]; the barrier step bumps the version only when
//! the content actually changed, so unrelated nodes don't see spurious
//! version churn on channels they didn't touch.

pub mod errors;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::message::Message;
use errors::ErrorEvent;

/// Common interface shared by every versioned channel.
pub trait Channel {
    type Data;

    /// Current version number. Starts at 1 for a freshly constructed channel.
    fn version(&self) -> u32;

    /// Sets the version explicitly, used when restoring from a checkpoint.
    fn set_version(&mut self, version: u32);

    /// A cloned, read-only copy of the channel's data.
    fn snapshot(&self) -> Self::Data;

    /// Mutable access to the channel's data. Callers are responsible for
    /// bumping the version afterward if the content changed.
    fn get_mut(&mut self) -> &mut Self::Data;
}

macro_rules! versioned_channel {
    ($name:ident, $data:ty) => {
        #[derive(Clone, Debug, Default, PartialEq, Eq)]
        pub struct $name {
            data: $data,
            version: u32,
        }

        impl $name {
            pub fn new(data: $data, version: u32) -> Self {
                Self { data, version }
            }
        }

        impl Channel for $name {
            type Data = $data;

            fn version(&self) -> u32 {
                self.version
            }

            fn set_version(&mut self, version: u32) {
                self.version = version;
            }

            fn snapshot(&self) -> $data {
                self.data.clone()
            }

            fn get_mut(&mut self) -> &mut $data {
                &mut self.data
            }
        }
    };
}

versioned_channel!(MessagesChannel, Vec<Message>);
versioned_channel!(ExtrasChannel, FxHashMap<String, Value>);
versioned_channel!(ErrorsChannel, Vec<ErrorEvent>);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_channel_starts_at_requested_version() {
        let channel = MessagesChannel::new(vec![Message::user("hi")], 3);
        assert_eq!(channel.version(), 3);
        assert_eq!(channel.snapshot().len(), 1);
    }

    #[test]
    fn get_mut_allows_in_place_mutation() {
        let mut channel = ExtrasChannel::default();
        channel.get_mut().insert("k".to_string(), Value::from(1));
        assert_eq!(channel.snapshot().get("k"), Some(&Value::from(1)));
    }

    #[test]
    fn set_version_overrides_directly() {
        let mut channel = ErrorsChannel::default();
        channel.set_version(42);
        assert_eq!(channel.version(), 42);
    }
}
