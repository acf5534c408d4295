//! FIFO list of callers suspended on the current production cycle.

use std::mem;

use tokio::sync::oneshot;

/// Receiving half of a waiter's completion channel.
pub(crate) type Ticket<T, E> = oneshot::Receiver<Result<T, E>>;

/// Pending completion channels, in arrival order.
pub(crate) struct WaitList<T, E> {
   queue: Vec<oneshot::Sender<Result<T, E>>>,
}

impl<T, E> WaitList<T, E> {
   #[inline]
   pub(crate) const fn new() -> Self {
      Self { queue: Vec::new() }
   }

   #[cfg(test)]
   pub(crate) fn len(&self) -> usize {
      self.queue.len()
   }

   #[inline]
   pub(crate) fn is_empty(&self) -> bool {
      self.queue.is_empty()
   }

   /// Appends a waiter and returns the end it will be resolved through.
   pub(crate) fn push(&mut self) -> Ticket<T, E> {
      let (tx, rx) = oneshot::channel();
      self.queue.push(tx);
      rx
   }

   /// Empties the list, handing back every waiter in arrival order.
   ///
   /// Called under the loader lock together with the phase transition; the
   /// returned [`Drain`] is dispatched after the lock is released.
   #[inline]
   pub(crate) fn take(&mut self) -> Drain<T, E> {
      Drain {
         queue: mem::take(&mut self.queue),
      }
   }
}

/// Waiters detached from a finished cycle, not yet resolved.
#[must_use = "waiters are only resolved when the drain is dispatched"]
pub(crate) struct Drain<T, E> {
   queue: Vec<oneshot::Sender<Result<T, E>>>,
}

impl<T: Clone, E: Clone> Drain<T, E> {
   #[cfg_attr(not(any(test, feature = "tracing")), allow(dead_code))]
   #[inline]
   pub(crate) fn len(&self) -> usize {
      self.queue.len()
   }

   /// Resolves every waiter with a clone of `outcome`, first come first served.
   ///
   /// `send` never runs the waiter's code inline: it stores the result and
   /// wakes the waiting task, which resumes as its own unit of work. A waiter
   /// whose request was dropped has closed its receiver and is skipped.
   pub(crate) fn dispatch(self, outcome: Result<&T, &E>) {
      for tx in self.queue {
         let _ = tx.send(outcome.map(T::clone).map_err(E::clone));
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn take_leaves_list_empty() {
      let mut list: WaitList<u32, ()> = WaitList::new();
      let _a = list.push();
      let _b = list.push();
      assert_eq!(list.len(), 2);

      let drain = list.take();
      assert!(list.is_empty());
      assert_eq!(drain.len(), 2);
   }

   #[test]
   fn dispatch_reaches_every_waiter() {
      let mut list: WaitList<&str, &str> = WaitList::new();
      let mut tickets = vec![list.push(), list.push(), list.push()];
      list.take().dispatch(Err(&"boom"));

      for ticket in &mut tickets {
         assert_eq!(ticket.try_recv(), Ok(Err("boom")));
      }
   }

   #[test]
   fn dispatch_skips_dropped_waiters() {
      let mut list: WaitList<u32, ()> = WaitList::new();
      let gone = list.push();
      let mut kept = list.push();
      drop(gone);

      list.take().dispatch(Ok(&5));
      assert_eq!(kept.try_recv(), Ok(Ok(5)));
   }
}
