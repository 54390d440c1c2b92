use core::{
  future::Future,
  pin::Pin,
  task::{Context, Poll, ready},
};

use futures::future::{AbortHandle, Abortable, Aborted, BoxFuture};

use crate::{ResolveError, ResolvedEntry};

/// The result handed to the completion of an asynchronous resolution.
pub type Completion<E> = Result<Vec<ResolvedEntry>, ResolveError<E>>;

type Callback<'a, E> = Box<dyn FnOnce(Completion<E>) + Send + 'a>;

enum State<'a, E> {
  Complete,
  Pending(Abortable<BoxFuture<'a, Completion<E>>>),
}

/// An asynchronous resolution whose completion callback runs exactly once.
///
/// A `Resolution` is returned by the `async_resolve` family of methods. It is
/// a future the caller's event loop drives to completion; when it resolves,
/// the completion callback has been invoked.
///
/// - Literal address endpoints complete before `async_resolve` returns: the
///   callback has already run and the returned `Resolution` is inert.
/// - Hostname endpoints complete when the resolver does. [`Resolution::cancel`]
///   (or a detached [`CancelHandle`]) aborts the in-flight lookup, and the
///   callback then receives [`ResolveError::Cancelled`].
/// - Dropping a pending `Resolution` cancels it; the callback still receives
///   [`ResolveError::Cancelled`] from the drop.
#[must_use = "a pending resolution does nothing unless polled"]
pub struct Resolution<'a, E> {
  state: State<'a, E>,
  on_complete: Option<Callback<'a, E>>,
  handle: Option<AbortHandle>,
}

impl<E> core::fmt::Debug for Resolution<'_, E> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("Resolution")
      .field("complete", &self.is_complete())
      .finish()
  }
}

impl<'a, E> Resolution<'a, E> {
  /// Runs the completion in place and returns an already completed resolution.
  pub(crate) fn ready<F>(result: Completion<E>, on_complete: F) -> Self
  where
    F: FnOnce(Completion<E>) + Send + 'a,
  {
    on_complete(result);
    Self {
      state: State::Complete,
      on_complete: None,
      handle: None,
    }
  }

  pub(crate) fn pending<Fut, F>(fut: Fut, on_complete: F) -> Self
  where
    Fut: Future<Output = Completion<E>> + Send + 'a,
    F: FnOnce(Completion<E>) + Send + 'a,
  {
    let (handle, registration) = AbortHandle::new_pair();
    let fut: BoxFuture<'a, Completion<E>> = Box::pin(fut);
    Self {
      state: State::Pending(Abortable::new(fut, registration)),
      on_complete: Some(Box::new(on_complete)),
      handle: Some(handle),
    }
  }

  /// Returns `true` once the completion callback has run.
  #[inline]
  pub fn is_complete(&self) -> bool {
    self.on_complete.is_none()
  }

  /// Cancels the in-flight resolution.
  ///
  /// The resolver's outstanding operation is dropped on the next poll and
  /// the completion receives [`ResolveError::Cancelled`]. Has no effect on a
  /// completed resolution.
  pub fn cancel(&self) {
    if let Some(handle) = &self.handle {
      handle.abort();
    }
  }

  /// Returns a handle which can cancel this resolution from elsewhere, e.g.
  /// while the event loop owns the `Resolution`.
  pub fn cancel_handle(&self) -> CancelHandle {
    CancelHandle(self.handle.clone())
  }

  fn complete(&mut self, result: Completion<E>) {
    self.state = State::Complete;
    self.handle = None;
    if let Some(on_complete) = self.on_complete.take() {
      on_complete(result);
    }
  }
}

impl<E> Future for Resolution<'_, E> {
  type Output = ();

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.get_mut();
    let result = match &mut this.state {
      State::Complete => return Poll::Ready(()),
      State::Pending(fut) => match ready!(Pin::new(fut).poll(cx)) {
        Ok(result) => result,
        Err(Aborted) => {
          #[cfg(feature = "tracing")]
          tracing::debug!(target = "peercraft.completion", "resolution cancelled");
          Err(ResolveError::Cancelled)
        }
      },
    };

    this.complete(result);
    Poll::Ready(())
  }
}

impl<E> Drop for Resolution<'_, E> {
  fn drop(&mut self) {
    if let Some(on_complete) = self.on_complete.take() {
      #[cfg(feature = "tracing")]
      tracing::debug!(
        target = "peercraft.completion",
        "pending resolution dropped, delivering cancellation"
      );
      on_complete(Err(ResolveError::Cancelled));
    }
  }
}

/// A detached handle cancelling a [`Resolution`].
#[derive(Debug, Clone)]
pub struct CancelHandle(Option<AbortHandle>);

impl CancelHandle {
  /// Cancels the resolution this handle belongs to.
  pub fn cancel(&self) {
    if let Some(handle) = &self.0 {
      handle.abort();
    }
  }

  /// Returns `true` once cancellation was requested through this handle or
  /// through [`Resolution::cancel`].
  ///
  /// A request that arrives after the resolution completed is still reported
  /// here, but does not change the outcome: the completion already received
  /// its result. Handles taken from a completed [`Resolution`] never report
  /// cancellation.
  pub fn is_cancelled(&self) -> bool {
    self.0.as_ref().is_some_and(AbortHandle::is_aborted)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use std::{
    net::Ipv4Addr,
    sync::{
      Arc,
      atomic::{AtomicUsize, Ordering},
    },
  };

  use crate::TransportEndpoint;

  type Calls = Arc<std::sync::Mutex<Vec<Completion<()>>>>;

  fn recorder() -> (Calls, impl FnOnce(Completion<()>) + Send + 'static) {
    let calls = Calls::default();
    let c = calls.clone();
    (calls, move |res| c.lock().unwrap().push(res))
  }

  fn entry() -> ResolvedEntry {
    ResolvedEntry::literal(TransportEndpoint::from((Ipv4Addr::new(9, 0, 0, 1), 5000)))
  }

  #[test]
  fn test_ready_runs_in_place() {
    let (calls, cb) = recorder();
    let res = Resolution::ready(Ok(vec![entry()]), cb);
    assert!(res.is_complete());
    assert_eq!(calls.lock().unwrap().len(), 1);
    res.cancel();
    drop(res);
    assert_eq!(calls.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_pending_completes_once() {
    let (calls, cb) = recorder();
    let res = Resolution::pending(async { Ok(vec![entry()]) }, cb);
    assert!(!res.is_complete());
    assert!(calls.lock().unwrap().is_empty());
    res.await;
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].as_ref().unwrap()[0], entry());
  }

  #[tokio::test]
  async fn test_cancel_before_poll() {
    let (calls, cb) = recorder();
    let res = Resolution::pending(async { Ok(vec![entry()]) }, cb);
    let handle = res.cancel_handle();
    handle.cancel();
    assert!(handle.is_cancelled());
    res.await;
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].as_ref().unwrap_err().is_cancelled());
  }

  #[tokio::test]
  async fn test_cancel_after_complete() {
    let (calls, cb) = recorder();
    let mut res = Resolution::pending(async { Ok(vec![entry()]) }, cb);
    let early = res.cancel_handle();
    (&mut res).await;
    assert!(res.is_complete());

    res.cancel();
    let late = res.cancel_handle();
    late.cancel();
    assert!(!late.is_cancelled());

    early.cancel();
    assert!(early.is_cancelled());
    drop(res);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].as_ref().unwrap()[0], entry());
  }

  #[test]
  fn test_drop_delivers_cancellation() {
    let (calls, cb) = recorder();
    let res = Resolution::pending(futures::future::pending(), cb);
    drop(res);
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].as_ref().unwrap_err().is_cancelled());
  }

  #[tokio::test]
  async fn test_poll_after_complete() {
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    let mut res = Resolution::<()>::pending(async { Ok(Vec::new()) }, move |_| {
      c.fetch_add(1, Ordering::SeqCst);
    });
    (&mut res).await;
    (&mut res).await;
    drop(res);
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }
}
