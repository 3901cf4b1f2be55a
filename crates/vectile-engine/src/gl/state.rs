use std::fmt::Debug;

use super::api::GraphicsApi;

/// One piece of pipeline state the context caches.
pub trait StateValue {
    type Type: Copy + PartialEq + Debug;

    fn default_value() -> Self::Type;

    /// Issues the API call that applies `value`.
    fn apply(api: &mut dyn GraphicsApi, value: Self::Type);
}

/// Cached value of a state slot.
///
/// Invariant: when `dirty` is false, `current` equals the value the API
/// actually holds, so setting it again is a no-op.
#[derive(Debug)]
pub struct State<V: StateValue> {
    current: V::Type,
    default: V::Type,
    dirty: bool,
}

impl<V: StateValue> State<V> {
    /// A fresh slot starts dirty: the API value is unknown.
    pub fn new() -> Self {
        Self { current: V::default_value(), default: V::default_value(), dirty: true }
    }

    pub fn set(&mut self, api: &mut dyn GraphicsApi, value: V::Type) {
        if self.dirty || self.current != value {
            self.current = value;
            self.dirty = false;
            V::apply(api, value);
        }
    }

    pub fn reset(&mut self, api: &mut dyn GraphicsApi) {
        self.set(api, self.default);
    }

    pub fn set_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn set_default_value(&mut self, value: V::Type) {
        self.default = value;
    }

    #[inline]
    pub fn current(&self) -> V::Type {
        self.current
    }

    #[inline]
    pub fn default_value(&self) -> V::Type {
        self.default
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl<V: StateValue> Default for State<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a slot for whole-cache iteration.
pub(crate) trait Slot {
    fn reset(&mut self, api: &mut dyn GraphicsApi);
    fn set_dirty(&mut self);
}

impl<V: StateValue> Slot for State<V> {
    fn reset(&mut self, api: &mut dyn GraphicsApi) {
        State::reset(self, api);
    }

    fn set_dirty(&mut self) {
        State::set_dirty(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::backend::{Call, RecordingApi};
    use crate::gl::value::StencilMask;

    #[test]
    fn equal_values_emit_no_call() {
        let mut rec = RecordingApi::new();
        let mut slot = State::<StencilMask>::new();

        slot.set(&mut rec, 0xff);
        slot.set(&mut rec, 0xff);
        assert_eq!(rec.count(|c| matches!(c, Call::StencilMask(_))), 1);

        slot.set(&mut rec, 0x0f);
        assert_eq!(rec.calls().last(), Some(&Call::StencilMask(0x0f)));
        assert_eq!(rec.count(|c| matches!(c, Call::StencilMask(_))), 2);
    }

    #[test]
    fn dirty_slot_reapplies_same_value() {
        let mut rec = RecordingApi::new();
        let mut slot = State::<StencilMask>::new();
        slot.set(&mut rec, 0x0f);

        slot.set_dirty();
        assert!(slot.is_dirty());
        slot.set(&mut rec, 0x0f);
        assert_eq!(rec.count(|c| matches!(c, Call::StencilMask(0x0f))), 2);
        assert!(!slot.is_dirty());
    }

    #[test]
    fn reset_applies_the_configured_default() {
        let mut rec = RecordingApi::new();
        let mut slot = State::<StencilMask>::new();
        slot.set(&mut rec, 0x01);
        slot.set_default_value(0x80);
        slot.reset(&mut rec);
        assert_eq!(slot.current(), 0x80);
        assert_eq!(rec.calls().last(), Some(&Call::StencilMask(0x80)));
    }
}
