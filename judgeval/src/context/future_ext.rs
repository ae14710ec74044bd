use super::Context;
use futures_util::stream::Stream;
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

/// Carries a [`Context`] across `.await` suspension points.
///
/// `tokio::spawn` and friends start a fresh task that does not inherit the
/// spawning task's thread-local context stack. Wrapping the spawned future
/// with `.with_current_context()` re-attaches the context on every poll, so
/// a span opened before `spawn` remains active inside it.
pub trait FutureExt: Sized {
    /// Wraps `self` so that `cx` is attached for the duration of every poll.
    fn with_context(self, cx: Context) -> WithContext<Self> {
        WithContext { inner: self, cx }
    }

    /// Wraps `self` so that the context active at the call site is attached
    /// for the duration of every poll.
    fn with_current_context(self) -> WithContext<Self> {
        let cx = Context::current();
        self.with_context(cx)
    }
}

impl<T: Sized> FutureExt for T {}

pin_project! {
    /// See [`FutureExt::with_context`].
    pub struct WithContext<T> {
        #[pin]
        inner: T,
        cx: Context,
    }
}

impl<T: std::future::Future> std::future::Future for WithContext<T> {
    type Output = T::Output;

    fn poll(self: Pin<&mut Self>, task_cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _guard = this.cx.clone().attach();
        this.inner.poll(task_cx)
    }
}

impl<T: Stream> Stream for WithContext<T> {
    type Item = T::Item;

    fn poll_next(self: Pin<&mut Self>, task_cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let _guard = this.cx.clone().attach();
        T::poll_next(this.inner, task_cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker(&'static str);

    #[tokio::test]
    async fn with_current_context_survives_spawn() {
        let cx = Context::new().with_value(Marker("outer"));
        let _guard = cx.attach();
        let fut = async { Context::current().get::<Marker>().map(|m| m.0) }.with_current_context();
        let seen = tokio::spawn(fut).await.unwrap();
        assert_eq!(seen, Some("outer"));
    }

    #[tokio::test]
    async fn with_context_is_restored_after_await() {
        let cx = Context::new().with_value(Marker("inner"));
        let fut = async {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            Context::current().get::<Marker>().map(|m| m.0)
        }
        .with_context(cx);
        assert!(Context::current().get::<Marker>().is_none());
        let seen = fut.await;
        assert_eq!(seen, Some("inner"));
        assert!(Context::current().get::<Marker>().is_none());
    }
}
