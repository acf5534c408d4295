//! Packed phase word for the loader.
//!
//! The state is a single `AtomicU32` with the following layout:
//! - Bit 0: PRODUCING - A production cycle is in flight
//! - Bit 1: SETTLED - The cached value is written and final
//! - Bits 2-31: ATTEMPTS - Number of production cycles started
//!
//! Every transition happens while the loader's wait list lock is held, so the
//! atomic only exists to give readers a lock-free view of the phase. The one
//! ordering that matters is `settle` (Release) against `is_settled` (Acquire):
//! it publishes the cached value to readers that skip the lock.

use core::sync::atomic::{AtomicU32, Ordering};

/// Observable phase of a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
   /// No cycle in flight and nothing cached. Also the phase after a failure.
   Idle,
   /// A production cycle is in flight.
   Producing,
   /// A cycle succeeded; the value is cached for good.
   Settled,
}

#[repr(transparent)]
pub(crate) struct LoadState(AtomicU32);

impl LoadState {
   /// Bit flag: a production cycle is in flight.
   const PRODUCING: u32 = 1;
   /// Bit flag: the value is cached.
   const SETTLED: u32 = 2;
   /// One unit of the attempts counter.
   const ATTEMPT_1: u32 = 4;
   /// Mask for the attempts counter.
   const ATTEMPT_MASK: u32 = !(Self::PRODUCING | Self::SETTLED);

   #[inline]
   pub(crate) const fn new() -> Self {
      Self(AtomicU32::new(0))
   }

   #[inline]
   pub(crate) fn phase(&self) -> Phase {
      Self::decode(self.0.load(Ordering::Acquire))
   }

   #[inline(always)]
   const fn decode(word: u32) -> Phase {
      if word & Self::SETTLED != 0 {
         Phase::Settled
      } else if word & Self::PRODUCING != 0 {
         Phase::Producing
      } else {
         Phase::Idle
      }
   }

   /// Checks if the SETTLED flag is set.
   #[inline]
   pub(crate) fn is_settled(&self, ordering: Ordering) -> bool {
      self.0.load(ordering) & Self::SETTLED != 0
   }

   /// Number of production cycles started so far.
   #[inline]
   pub(crate) fn attempts(&self) -> u32 {
      (self.0.load(Ordering::Relaxed) & Self::ATTEMPT_MASK) / Self::ATTEMPT_1
   }

   /// Idle -> Producing, bumping the attempts counter.
   ///
   /// Returns the attempt number of the new cycle, or `None` if the loader was
   /// not idle. Callers hold the wait list lock.
   #[inline]
   pub(crate) fn begin(&self) -> Option<u32> {
      let current = self.0.load(Ordering::Relaxed);
      if Self::decode(current) != Phase::Idle {
         return None;
      }
      let next = (current & Self::ATTEMPT_MASK).wrapping_add(Self::ATTEMPT_1) | Self::PRODUCING;
      self.0.store(next, Ordering::Relaxed);
      Some(next / Self::ATTEMPT_1)
   }

   /// Producing -> Settled.
   ///
   /// Release ordering makes the value write that precedes this call visible to
   /// any thread observing SETTLED with Acquire.
   #[inline]
   pub(crate) fn settle(&self) {
      let current = self.0.load(Ordering::Relaxed);
      debug_assert_eq!(Self::decode(current), Phase::Producing);
      self.0.store((current & Self::ATTEMPT_MASK) | Self::SETTLED, Ordering::Release);
   }

   /// Producing -> Idle, keeping the attempts counter.
   #[inline]
   pub(crate) fn reset(&self) {
      let current = self.0.load(Ordering::Relaxed);
      debug_assert_eq!(Self::decode(current), Phase::Producing);
      self.0.store(current & Self::ATTEMPT_MASK, Ordering::Release);
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn starts_idle() {
      let state = LoadState::new();
      assert_eq!(state.phase(), Phase::Idle);
      assert_eq!(state.attempts(), 0);
      assert!(!state.is_settled(Ordering::Relaxed));
   }

   #[test]
   fn begin_only_from_idle() {
      let state = LoadState::new();
      assert_eq!(state.begin(), Some(1));
      assert_eq!(state.phase(), Phase::Producing);
      assert_eq!(state.begin(), None);
      assert_eq!(state.attempts(), 1);
   }

   #[test]
   fn reset_keeps_attempts() {
      let state = LoadState::new();
      state.begin();
      state.reset();
      assert_eq!(state.phase(), Phase::Idle);
      assert_eq!(state.begin(), Some(2));
      assert_eq!(state.attempts(), 2);
   }

   #[test]
   fn settled_is_terminal() {
      let state = LoadState::new();
      state.begin();
      state.settle();
      assert_eq!(state.phase(), Phase::Settled);
      assert!(state.is_settled(Ordering::Acquire));
      assert_eq!(state.begin(), None);
      assert_eq!(state.attempts(), 1);
   }
}
