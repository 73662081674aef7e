use std::{
    future::Future,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};

use crossbeam_utils::sync::{Parker, Unparker};
use futures_timer::Delay;
use futures_util::{
    future::{select, Either},
    pin_mut,
    task::ArcWake,
};

// ===============================================================================================
// Futures
// ===============================================================================================
/// Extension trait for efficiently blocking on a future.
///
/// The future is polled on the calling thread, which is parked between wake-ups. No async
/// runtime is required, so this can be used from plain `#[test]` functions.
#[doc(hidden)]
pub trait Join: Future {
    fn join(self) -> <Self as Future>::Output;
}

impl<F: Future> Join for F {
    fn join(self) -> <Self as Future>::Output {
        struct ThreadWaker(Unparker);

        impl ArcWake for ThreadWaker {
            fn wake_by_ref(arc_self: &Arc<Self>) {
                arc_self.0.unpark();
            }
        }

        let parker = Parker::new();
        let waker = futures_util::task::waker(Arc::new(ThreadWaker(parker.unparker().clone())));
        let mut context = Context::from_waker(&waker);

        let future = self;
        pin_mut!(future);

        loop {
            match future.as_mut().poll(&mut context) {
                Poll::Ready(output) => return output,
                Poll::Pending => parker.park(),
            }
        }
    }
}

/// Resolves to `Some(output)` if `future` completes within `timeout`, `None` otherwise.
pub(crate) async fn with_timeout<F: Future>(timeout: Duration, future: F) -> Option<F::Output> {
    let delay = Delay::new(timeout);
    pin_mut!(future);
    pin_mut!(delay);

    match select(future, delay).await {
        Either::Left((output, _)) => Some(output),
        Either::Right(_) => None,
    }
}
