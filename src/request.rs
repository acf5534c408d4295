//! The future handed out by [`LazyLoader::request`](crate::LazyLoader::request).

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::sync::Arc;

use crate::loader::{Registration, Shared};
use crate::producer::Producer;

/// A pending request for a loader's value.
///
/// Resolves to the cached value, or to the outcome of the production cycle it
/// was registered on. An error is the producer's own error, unchanged.
///
/// # Panics
///
/// Panics when polled if its production cycle ended without an outcome: the
/// producer panicked, or the runtime dropped the cycle's task. Every request
/// of that cycle panics once; the loader is idle again afterwards.
#[must_use = "futures do nothing unless polled; the production cycle runs regardless"]
pub struct Request<P: Producer> {
   registration: Option<Registration<P::Output, P::Error>>,
}

impl<P: Producer> Request<P> {
   pub(crate) fn new(shared: &Arc<Shared<P>>) -> Self {
      Self {
         registration: Some(shared.register()),
      }
   }
}

// The value is moved out, never pinned in place.
impl<P: Producer> Unpin for Request<P> {}

impl<P: Producer> Future for Request<P> {
   type Output = Result<P::Output, P::Error>;

   fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
      let this = self.get_mut();
      let mut ticket = match this.registration.take() {
         Some(Registration::Ready(value)) => return Poll::Ready(Ok(value)),
         Some(Registration::Waiting(ticket)) => ticket,
         None => panic!("`Request` polled after completion"),
      };
      match Pin::new(&mut ticket).poll(cx) {
         Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
         // The cycle ended without an outcome. Only a later `request()` may
         // start another one.
         Poll::Ready(Err(_)) => panic!("production cycle panicked or was dropped by its runtime"),
         Poll::Pending => {
            this.registration = Some(Registration::Waiting(ticket));
            Poll::Pending
         }
      }
   }
}

impl<P: Producer> fmt::Debug for Request<P> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let state = match &self.registration {
         Some(Registration::Ready(_)) => "ready",
         Some(Registration::Waiting(_)) => "waiting",
         None => "done",
      };
      f.debug_struct("Request").field("state", &format_args!("{state}")).finish()
   }
}
