use std::borrow::Cow;

use derive_more::Into;

use crate::data::{string_size, Typed};

/// The Key-Value pair can be used in a KV-list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyValue<'a, T>(pub(crate) Cow<'a, str>, pub(crate) T);

impl<T> KeyValue<'_, T>
where
    T: Clone + Into<Typed>,
{
    /// Returns the size in bytes of this key-value pair once encoded.
    pub fn size(&self) -> usize {
        string_size(&self.0) + self.1.clone().into().size()
    }
}

impl<T> From<(&'static str, T)> for KeyValue<'static, T> {
    fn from((key, value): (&'static str, T)) -> Self {
        KeyValue(key.into(), value)
    }
}

impl<T> From<(String, T)> for KeyValue<'_, T> {
    fn from((key, value): (String, T)) -> Self {
        KeyValue(key.into(), value)
    }
}
