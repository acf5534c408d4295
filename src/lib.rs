//! A deduplicating, memoizing asynchronous initializer.
//!
//! [`LazyLoader<P>`] wraps an expensive, fallible, asynchronous [`Producer`] and
//! makes sure it runs at most once at a time:
//!
//! - **Deduplication**: every request made while a production cycle is in flight
//!   shares that cycle's outcome. The producer is never called twice concurrently.
//! - **Memoization**: the first successful value is cached for the lifetime of
//!   the loader. Later requests resolve immediately, without locking.
//! - **Retry on failure**: a failure reaches every request attached to that
//!   cycle and is then forgotten; the next request starts a fresh cycle.
//! - **Fair fan-out**: waiters of one cycle are resolved in arrival order, each
//!   through its own one-shot channel.
//!
//! Production cycles run as spawned Tokio tasks, so a caller that stops waiting
//! never cancels work other callers depend on.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! use lazy_loader::LazyLoader;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let calls = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&calls);
//! let loader = LazyLoader::new(move || {
//!    counter.fetch_add(1, Ordering::SeqCst);
//!    async { Ok::<_, &'static str>(42) }
//! });
//!
//! // Three callers, one production cycle
//! let (a, b, c) = tokio::join!(loader.request(), loader.request(), loader.request());
//! assert_eq!((a, b, c), (Ok(42), Ok(42), Ok(42)));
//! assert_eq!(calls.load(Ordering::SeqCst), 1);
//!
//! // Cached from now on
//! assert_eq!(loader.request().await, Ok(42));
//! assert_eq!(loader.get(), Some(&42));
//! # }
//! ```
//!
//! # Features
//!
//! - `tracing` (default): emits `debug`-level events for production cycles.

/// The loader and its production cycle.
mod loader;

/// Producer abstraction.
mod producer;

/// Request future.
mod request;

/// Packed phase word.
mod state;

/// Waiter queue.
mod waiters;

pub use loader::LazyLoader;
pub use producer::Producer;
pub use request::Request;
pub use state::Phase;

/// Shorthand for [`LazyLoader::new`].
#[inline]
#[must_use]
pub fn lazy<P: Producer>(producer: P) -> LazyLoader<P> {
   LazyLoader::new(producer)
}
