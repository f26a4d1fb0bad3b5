//! Per-frame slot allocators.
//!
//! Parallel stages produce a variable amount of output per work item. Instead of global counters,
//! each output buffer owns a [`SlotCursor`]: work items claim a unique slot through an atomic
//! fetch-and-increment, and the cursor is rewound at the start of every frame. Claims past the
//! capacity fail and are remembered, so overflow can be reported after the stage completes.

use std::{
    cell::UnsafeCell,
    mem::MaybeUninit,
    sync::atomic::{AtomicU32, Ordering},
};

/// An atomic bump cursor over a fixed amount of slots.
#[derive(Debug, Default)]
pub struct SlotCursor(AtomicU32);

impl SlotCursor {
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    /// Claims the next slot. Returns [`None`] if every slot below `capacity` has been claimed.
    #[inline(always)]
    pub fn claim(&self, capacity: u32) -> Option<u32> {
        let slot = self.0.fetch_add(1, Ordering::Relaxed);
        (slot < capacity).then_some(slot)
    }

    /// Amount of claims, including failed ones.
    #[inline(always)]
    pub fn claims(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }

    /// Amount of successfully claimed slots.
    #[inline(always)]
    pub fn filled(&self, capacity: u32) -> u32 {
        self.claims().min(capacity)
    }

    /// Amount of claims that failed because the capacity was exhausted.
    #[inline(always)]
    pub fn overflow(&self, capacity: u32) -> u32 {
        self.claims().saturating_sub(capacity)
    }

    /// Rewinds the cursor to the first slot.
    #[inline(always)]
    pub fn reset(&mut self) {
        *self.0.get_mut() = 0;
    }
}

/// A fixed-capacity buffer that is filled concurrently through shared references and read back
/// densely once every writer is done.
///
/// Writers call [`SlotArena::push`] with `&self`. Reading requires `&mut self`, which statically
/// guarantees that no push is in flight while the contents are observed.
pub struct SlotArena<T> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    cursor: SlotCursor,
}

// SAFETY: every slot is written by at most one thread per frame (the one that claimed it), and
// slots are only read through `&mut self`, after all writers are done.
unsafe impl<T: Send> Sync for SlotArena<T> {}

impl<T: Copy> SlotArena<T> {
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            slots: (0..capacity)
                .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
                .collect(),
            cursor: SlotCursor::new(),
        }
    }

    #[inline(always)]
    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Appends a value, returning the slot it was written to. Returns [`None`] if the arena is
    /// full, in which case the value is dropped and counted as overflow.
    #[inline(always)]
    pub fn push(&self, value: T) -> Option<u32> {
        let slot = self.cursor.claim(self.capacity())?;

        // SAFETY: `claim` hands out every slot index at most once between resets, so no other
        // thread accesses this cell. Readers need `&mut self` and therefore can't exist right now.
        unsafe { (*self.slots[slot as usize].get()).write(value) };
        Some(slot)
    }

    /// Amount of stored values.
    #[inline(always)]
    pub fn len(&self) -> u32 {
        self.cursor.filled(self.capacity())
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Amount of values dropped because the arena was full.
    #[inline(always)]
    pub fn overflow(&self) -> u32 {
        self.cursor.overflow(self.capacity())
    }

    /// The stored values, densely packed in claim order.
    pub fn as_slice(&mut self) -> &[T] {
        let len = self.len() as usize;

        // SAFETY: the first `len` slots were claimed and therefore written. `UnsafeCell` and
        // `MaybeUninit` are both `repr(transparent)`, so the slots have the layout of `T`. The
        // exclusive borrow of `self` prevents concurrent writes while the slice lives.
        unsafe { std::slice::from_raw_parts(self.slots.as_ptr().cast::<T>(), len) }
    }

    /// Empties the arena. Values are `Copy`, so nothing needs to be dropped.
    pub fn reset(&mut self) {
        self.cursor.reset();
    }
}

impl<T> std::fmt::Debug for SlotArena<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotArena")
            .field("capacity", &self.slots.len())
            .field("claims", &self.cursor.claims())
            .finish()
    }
}
