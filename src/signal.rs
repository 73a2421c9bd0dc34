//! Ordered observer list with stable subscription handles.
//!
//! Single-threaded by construction (the sequencer and its subscribers run
//! on the same cooperative task), so no synchronisation is needed.
//! Capacity is fixed; `subscribe` reports a full list instead of growing.

/// Maximum number of subscribers per signal (stack-allocated).
pub const MAX_SUBSCRIBERS: usize = 8;

/// Handle returned by [`Signal::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

type Slot<T> = (SubscriptionId, Box<dyn FnMut(&T)>);

/// Broadcasts a value to every subscriber in subscription order.
pub struct Signal<T> {
    next_id: u32,
    slots: heapless::Vec<Slot<T>, MAX_SUBSCRIBERS>,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            slots: heapless::Vec::new(),
        }
    }

    /// Add a subscriber.  Returns `None` if all slots are taken.
    pub fn subscribe(&mut self, f: impl FnMut(&T) + 'static) -> Option<SubscriptionId> {
        let id = SubscriptionId(self.next_id);
        if self.slots.push((id, Box::new(f))).is_err() {
            log::warn!("Signal: subscriber list full ({})", MAX_SUBSCRIBERS);
            return None;
        }
        self.next_id = self.next_id.wrapping_add(1);
        Some(id)
    }

    /// Remove a subscriber.  Returns `false` if the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match self.slots.iter().position(|(slot_id, _)| *slot_id == id) {
            Some(index) => {
                let _ = self.slots.remove(index);
                true
            }
            None => false,
        }
    }

    /// Call every subscriber with `value`.
    pub fn notify(&mut self, value: &T) {
        for (_, f) in &mut self.slots {
            f(value);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
