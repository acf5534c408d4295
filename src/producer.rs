//! The production function a loader wraps.

use core::future::Future;

/// A zero-argument asynchronous operation that yields a value or fails.
///
/// Each call to [`produce`](Producer::produce) starts one production cycle. The
/// returned future is spawned onto a Tokio runtime, so it must be `Send` and
/// `'static`. Values and errors are cloned once per waiter.
///
/// Any `Fn() -> Fut` closure whose future resolves to a `Result` implements
/// this trait, so most callers never name it:
///
/// ```rust
/// use lazy_loader::LazyLoader;
///
/// let loader = LazyLoader::new(|| async { Ok::<_, String>(7u32) });
/// # drop(loader);
/// ```
pub trait Producer: Send + Sync + 'static {
   /// The value cached on success.
   type Output: Clone + Send + Sync + 'static;
   /// The error handed to every waiter of a failed cycle.
   type Error: Clone + Send + 'static;
   /// The in-flight production cycle.
   type Future: Future<Output = Result<Self::Output, Self::Error>> + Send + 'static;

   /// Starts a production cycle.
   fn produce(&self) -> Self::Future;
}

impl<F, Fut, T, E> Producer for F
where
   F: Fn() -> Fut + Send + Sync + 'static,
   Fut: Future<Output = Result<T, E>> + Send + 'static,
   T: Clone + Send + Sync + 'static,
   E: Clone + Send + 'static,
{
   type Output = T;
   type Error = E;
   type Future = Fut;

   #[inline]
   fn produce(&self) -> Fut {
      self()
   }
}
