//! The deduplicating lazy initializer.
//!
//! This module provides [`LazyLoader<P>`], a handle to one shared slot that is
//! filled by running a [`Producer`] at most once at a time. Every caller that
//! arrives while a production cycle is in flight waits on that cycle; once a
//! cycle succeeds the value is cached for the lifetime of the loader.
//!
//! The settled fast path is a single atomic load. Everything else (phase
//! checks that lead to an enqueue, and transitions out of a cycle together
//! with the drain of its waiters) runs under one short `parking_lot` lock, so
//! no caller can slip into the wait list of a cycle that has already drained.

use core::cell::UnsafeCell;
use core::sync::atomic::Ordering;
use core::{fmt, mem};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::producer::Producer;
use crate::request::Request;
use crate::state::{LoadState, Phase};
use crate::waiters::{Ticket, WaitList};

/// A deduplicating, memoizing asynchronous initializer.
///
/// Wraps a [`Producer`] and hands out its result through [`request`](Self::request):
///
/// - While nothing is cached, the first request starts a production cycle and
///   every request made before that cycle finishes shares its outcome.
/// - A successful cycle caches the value forever. Later requests resolve
///   immediately without touching the producer.
/// - A failed cycle hands its error to the requests attached to it and leaves
///   nothing behind; the next request starts a fresh cycle.
///
/// Cloning a `LazyLoader` yields another handle to the same slot.
///
/// # Examples
///
/// ```rust
/// use lazy_loader::LazyLoader;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let loader = LazyLoader::new(|| async { Ok::<_, String>("config".to_string()) });
///
/// let (a, b) = tokio::join!(loader.request(), loader.request());
/// assert_eq!(a.as_deref(), Ok("config"));
/// assert_eq!(b.as_deref(), Ok("config"));
/// assert_eq!(loader.attempts(), 1);
/// # }
/// ```
pub struct LazyLoader<P: Producer> {
   shared: Arc<Shared<P>>,
}

impl<P: Producer> LazyLoader<P> {
   /// Creates an idle loader. The producer is not called until the first request.
   ///
   /// Production cycles are spawned on the runtime of the task that calls
   /// [`request`](Self::request).
   #[inline]
   #[must_use]
   pub fn new(producer: P) -> Self {
      Self::build(producer, None)
   }

   /// Creates an idle loader whose production cycles run on `handle`.
   ///
   /// With an explicit handle, [`request`](Self::request) may be called from
   /// threads that are not inside a Tokio runtime.
   #[inline]
   #[must_use]
   pub fn with_handle(handle: Handle, producer: P) -> Self {
      Self::build(producer, Some(handle))
   }

   fn build(producer: P, handle: Option<Handle>) -> Self {
      Self {
         shared: Arc::new(Shared {
            state: LoadState::new(),
            value: UnsafeCell::new(mem::MaybeUninit::uninit()),
            waiters: Mutex::new(WaitList::new()),
            producer,
            handle,
         }),
      }
   }

   /// Requests the value.
   ///
   /// Registration happens now, not when the returned future is first polled:
   ///
   /// - If a value is cached, the future is already complete.
   /// - If a cycle is in flight, the caller joins its wait list.
   /// - Otherwise a new cycle starts: the producer is called once and its
   ///   caller joins the wait list behind anything the producer itself
   ///   requested, then the producer's future is spawned as its own task.
   ///
   /// The production cycle does not depend on the returned future; dropping it
   /// only gives up this caller's interest in the outcome.
   ///
   /// # Panics
   ///
   /// Panics if a cycle has to be started, the loader was built with
   /// [`new`](Self::new), and the caller is not inside a Tokio runtime.
   #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
   pub fn request(&self) -> Request<P> {
      Request::new(&self.shared)
   }

   /// Returns the cached value, if a cycle has succeeded.
   ///
   /// This method never blocks.
   #[inline]
   pub fn get(&self) -> Option<&P::Output> {
      self.shared.get()
   }

   /// Returns the current phase. This method never blocks.
   #[inline]
   pub fn phase(&self) -> Phase {
      self.shared.state.phase()
   }

   /// Checks whether a value is cached.
   #[inline]
   pub fn is_settled(&self) -> bool {
      self.shared.state.is_settled(Ordering::Acquire)
   }

   /// Checks whether a production cycle is in flight.
   #[inline]
   pub fn is_producing(&self) -> bool {
      self.phase() == Phase::Producing
   }

   /// Number of production cycles started so far, successful or not.
   #[inline]
   pub fn attempts(&self) -> u32 {
      self.shared.state.attempts()
   }
}

impl<P: Producer> Clone for LazyLoader<P> {
   /// Returns another handle to the same slot.
   #[inline]
   fn clone(&self) -> Self {
      Self {
         shared: Arc::clone(&self.shared),
      }
   }
}

impl<P: Producer> fmt::Debug for LazyLoader<P>
where
   P::Output: fmt::Debug,
{
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let mut d = f.debug_struct("LazyLoader");
      d.field("phase", &self.phase());
      d.field("attempts", &self.attempts());
      match self.get() {
         Some(v) => d.field("value", v),
         None => d.field("value", &format_args!("<unset>")),
      };
      d.finish()
   }
}

/// Outcome of registering a request.
pub(crate) enum Registration<T, E> {
   /// The value was already cached.
   Ready(T),
   /// The caller is queued on a production cycle.
   Waiting(Ticket<T, E>),
}

/// State shared by every handle to one loader and by its in-flight cycle.
pub(crate) struct Shared<P: Producer> {
   state: LoadState,
   value: UnsafeCell<mem::MaybeUninit<P::Output>>,
   waiters: Mutex<WaitList<P::Output, P::Error>>,
   producer: P,
   handle: Option<Handle>,
}

impl<P: Producer> Shared<P> {
   #[inline]
   fn get(&self) -> Option<&P::Output> {
      if self.state.is_settled(Ordering::Acquire) {
         // SAFETY: SETTLED is only set after the value is written, with Release
         // ordering, and the slot is never written again.
         Some(unsafe { (*self.value.get()).assume_init_ref() })
      } else {
         None
      }
   }

   /// Resolves from the cache or joins the wait list, starting a cycle if idle.
   pub(crate) fn register(self: &Arc<Self>) -> Registration<P::Output, P::Error> {
      if let Some(value) = self.get() {
         return Registration::Ready(value.clone());
      }

      let mut waiters = self.waiters.lock();
      // The cycle may have settled between the fast path and the lock.
      if let Some(value) = self.get() {
         return Registration::Ready(value.clone());
      }
      let Some(attempt) = self.state.begin() else {
         return Registration::Waiting(waiters.push());
      };
      debug_assert!(waiters.is_empty(), "idle loader with queued waiters");
      drop(waiters);
      Registration::Waiting(self.start(attempt))
   }

   /// Invokes the producer, enqueues the caller that started the cycle, then
   /// spawns the cycle.
   fn start(self: &Arc<Self>, attempt: u32) -> Ticket<P::Output, P::Error> {
      #[cfg(feature = "tracing")]
      tracing::debug!(attempt, "starting production cycle");

      // Armed before the producer runs: a panic here resets the loader.
      let guard = CycleGuard {
         shared: Arc::clone(self),
         attempt,
         armed: true,
      };
      // Outside the lock, so the producer may request from this loader.
      let cycle = self.producer.produce();
      // Nothing drains before the cycle is spawned, so this still joins it.
      let ticket = self.waiters.lock().push();

      let task = async move {
         let outcome = cycle.await;
         guard.finish(outcome);
      };
      match &self.handle {
         Some(handle) => drop(handle.spawn(task)),
         None => drop(tokio::spawn(task)),
      }
      ticket
   }
}

impl<P: Producer> Drop for Shared<P> {
   fn drop(&mut self) {
      if self.state.is_settled(Ordering::Relaxed) {
         // SAFETY: We have exclusive access and the value is initialized.
         unsafe { self.value.get_mut().assume_init_drop() };
      }
   }
}

// SAFETY:
// The value slot is written once, by the single in-flight cycle, before SETTLED
// is published; afterwards it is only read. `Producer` requires the output to
// be `Send + Sync` and the error to be `Send`, so sharing `&Shared` across
// threads only ever shares `&P::Output` and moves values through channels.
unsafe impl<P: Producer> Sync for Shared<P> {}

/// Ownership of one production cycle.
///
/// Consumed by [`finish`](Self::finish) when the producer yields an outcome. If
/// it is dropped while still armed (the producer panicked, or the runtime
/// dropped the task), the loader goes back to idle and the cycle's waiters
/// see their channels close. Nothing is retried until the next request.
struct CycleGuard<P: Producer> {
   shared: Arc<Shared<P>>,
   #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
   attempt: u32,
   armed: bool,
}

impl<P: Producer> CycleGuard<P> {
   fn finish(mut self, outcome: Result<P::Output, P::Error>) {
      self.armed = false;
      let shared = &*self.shared;
      let mut waiters = shared.waiters.lock();
      let drain = waiters.take();

      match outcome {
         Ok(value) => {
            // SAFETY: The phase is Producing and this guard owns the cycle, so
            // nothing else reads or writes the slot until `settle` publishes it.
            unsafe { (*shared.value.get()).write(value) };
            shared.state.settle();
            drop(waiters);
            // SAFETY: Settled above; from here on the slot is only read.
            let value = unsafe { (*shared.value.get()).assume_init_ref() };

            #[cfg(feature = "tracing")]
            tracing::debug!(attempt = self.attempt, waiters = drain.len(), "production cycle settled");
            drain.dispatch(Ok(value));
         }
         Err(err) => {
            shared.state.reset();
            drop(waiters);

            #[cfg(feature = "tracing")]
            tracing::debug!(attempt = self.attempt, waiters = drain.len(), "production cycle failed");
            drain.dispatch(Err(&err));
         }
      }
   }
}

impl<P: Producer> Drop for CycleGuard<P> {
   fn drop(&mut self) {
      if !self.armed {
         return;
      }
      let mut waiters = self.shared.waiters.lock();
      self.shared.state.reset();
      let drain = waiters.take();
      drop(waiters);

      #[cfg(feature = "tracing")]
      tracing::debug!(attempt = self.attempt, waiters = drain.len(), "production cycle abandoned");
      // Dropping the senders closes every ticket of this cycle; each request
      // attached to it panics instead of resolving.
      drop(drain);
   }
}
