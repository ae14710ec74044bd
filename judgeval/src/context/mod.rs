//! Task-local propagation of the active [`Context`].
//!
//! A [`Context`] is an immutable, value-typed map. Entering a span via the
//! base tracer's `with`/`observe` derives a new `Context` with that span
//! installed as active and attaches it for the duration of the call; child
//! tasks spawned during that dynamic extent inherit it through the
//! `thread_local` stack below, exactly as the active span would via a plain
//! thread-local, but without ever exposing a mutable global cursor.

use crate::trace::SynchronizedSpan;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasherDefault, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

mod future_ext;
pub use future_ext::{FutureExt, WithContext};

thread_local! {
    static CURRENT_CONTEXT: RefCell<ContextStack> = RefCell::new(ContextStack::default());
}

type EntryMap = HashMap<TypeId, Arc<dyn Any + Sync + Send>, BuildHasherDefault<IdHasher>>;

/// An immutable, task-local bag of values, plus (optionally) the active span.
///
/// Write operations (`with_value`, `with_span`) always return a *new*
/// `Context`; nothing mutates in place. The bridge between a `Context` value
/// and "the context currently governing this task" is [`Context::attach`].
#[derive(Clone, Default)]
pub struct Context {
    pub(crate) span: Option<Arc<SynchronizedSpan>>,
    entries: Option<Arc<EntryMap>>,
}

impl Context {
    /// An empty context with no active span and no values.
    pub fn new() -> Self {
        Context::default()
    }

    /// Snapshot of the context active on this task right now.
    pub fn current() -> Self {
        Self::map_current(|cx| cx.clone())
    }

    /// Applies `f` to the current context without cloning it.
    pub fn map_current<T>(f: impl FnOnce(&Context) -> T) -> T {
        CURRENT_CONTEXT.with(|cx| cx.borrow().map_current_cx(f))
    }

    /// Looks up a value of type `T` previously stored with [`Context::with_value`].
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.entries
            .as_ref()?
            .get(&TypeId::of::<T>())?
            .downcast_ref()
    }

    /// Returns a copy of this context with `value` additionally set.
    pub fn with_value<T: 'static + Send + Sync>(&self, value: T) -> Self {
        let entries = if let Some(current) = &self.entries {
            let mut inner = (**current).clone();
            inner.insert(TypeId::of::<T>(), Arc::new(value));
            Some(Arc::new(inner))
        } else {
            let mut entries = EntryMap::default();
            entries.insert(TypeId::of::<T>(), Arc::new(value));
            Some(Arc::new(entries))
        };
        Context {
            entries,
            span: self.span.clone(),
        }
    }

    pub(crate) fn with_synchronized_span(&self, span: SynchronizedSpan) -> Self {
        Context {
            entries: self.entries.clone(),
            span: Some(Arc::new(span)),
        }
    }

    /// Installs this context as active on the current task. The returned
    /// [`ContextGuard`] restores the previous context when dropped.
    pub fn attach(self) -> ContextGuard {
        let pos = CURRENT_CONTEXT.with(|cx| cx.borrow_mut().push(self));
        ContextGuard {
            pos,
            _not_send: PhantomData,
        }
    }

    /// Runs `f` with `self` installed as the active context for `f`'s
    /// dynamic extent, restoring the previous context on return (including
    /// on unwind).
    pub fn with<F: FnOnce() -> R, R>(self, f: F) -> R {
        let _guard = self.attach();
        f()
    }

    /// Returns a closure that re-installs `self` around every invocation of
    /// `f`. Unlike [`Context::with`], the context is bound once and reused
    /// across many calls; useful for handing a context-carrying callback to
    /// code that does not itself know about `Context`.
    pub fn bind<A, R, F: FnMut(A) -> R>(self, mut f: F) -> impl FnMut(A) -> R {
        move |arg| self.clone().with(|| f(arg))
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Context");
        let mut count = self.entries.as_ref().map_or(0, |e| e.len());
        if let Some(span) = &self.span {
            dbg.field("span", &span.span_context());
            count += 1;
        } else {
            dbg.field("span", &"none");
        }
        dbg.field("entries", &count).finish()
    }
}

/// Restores the previous [`Context`] when dropped.
///
/// Must not be sent across threads: it records a position in *this* task's
/// context stack and is meaningless anywhere else.
#[derive(Debug)]
pub struct ContextGuard {
    pos: u16,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let pos = self.pos;
        if pos > ContextStack::BASE_POS && pos < ContextStack::MAX_POS {
            CURRENT_CONTEXT.with(|stack| stack.borrow_mut().pop_id(pos));
        }
    }
}

#[derive(Clone, Default, Debug)]
struct IdHasher(u64);

impl Hasher for IdHasher {
    fn write(&mut self, _: &[u8]) {
        unreachable!("TypeId hashing only ever calls write_u64")
    }
    #[inline]
    fn write_u64(&mut self, id: u64) {
        self.0 = id;
    }
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}

/// Per-task stack of attached contexts, supporting out-of-order drop of
/// [`ContextGuard`]s (a guard created before an inner one may legitimately
/// be dropped after it, e.g. when futures are dropped in a different order
/// than they were polled).
struct ContextStack {
    current: Context,
    stack: Vec<Option<Context>>,
    _not_send: PhantomData<*const ()>,
}

impl ContextStack {
    const BASE_POS: u16 = 0;
    const MAX_POS: u16 = u16::MAX;

    fn push(&mut self, cx: Context) -> u16 {
        let next = self.stack.len() + 1;
        if next < ContextStack::MAX_POS as usize {
            let prev = std::mem::replace(&mut self.current, cx);
            self.stack.push(Some(prev));
            next as u16
        } else {
            tracing::warn!(
                target: "judgeval",
                "context stack exhausted ({} entries); Context::current() left unchanged",
                ContextStack::MAX_POS
            );
            ContextStack::MAX_POS
        }
    }

    fn pop_id(&mut self, pos: u16) {
        if pos == ContextStack::BASE_POS || pos == ContextStack::MAX_POS {
            return;
        }
        let len = self.stack.len() as u16;
        if pos == len {
            while let Some(None) = self.stack.last() {
                let _ = self.stack.pop();
            }
            if let Some(Some(next)) = self.stack.pop() {
                self.current = next;
            }
        } else if pos < len {
            let _ = self.stack[pos as usize].take();
        }
    }

    fn map_current_cx<T>(&self, f: impl FnOnce(&Context) -> T) -> T {
        f(&self.current)
    }
}

impl Default for ContextStack {
    fn default() -> Self {
        ContextStack {
            current: Context::default(),
            stack: Vec::with_capacity(8),
            _not_send: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ValueA(&'static str);

    #[test]
    fn attach_and_restore() {
        assert!(Context::current().get::<ValueA>().is_none());
        let cx = Context::new().with_value(ValueA("a"));
        {
            let _guard = cx.attach();
            assert_eq!(Context::current().get::<ValueA>().unwrap().0, "a");
        }
        assert!(Context::current().get::<ValueA>().is_none());
    }

    #[test]
    fn with_runs_and_restores_on_panic() {
        let cx = Context::new().with_value(ValueA("a"));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            cx.with(|| {
                assert_eq!(Context::current().get::<ValueA>().unwrap().0, "a");
                panic!("boom");
            })
        }));
        assert!(result.is_err());
        assert!(Context::current().get::<ValueA>().is_none());
    }

    #[test]
    fn out_of_order_drop() {
        let outer = Context::new().with_value(ValueA("outer"));
        let inner = Context::new().with_value(ValueA("inner"));
        let outer_guard = outer.attach();
        let inner_guard = inner.attach();
        assert_eq!(Context::current().get::<ValueA>().unwrap().0, "inner");
        drop(outer_guard);
        assert_eq!(Context::current().get::<ValueA>().unwrap().0, "inner");
        drop(inner_guard);
        assert!(Context::current().get::<ValueA>().is_none());
    }
}
