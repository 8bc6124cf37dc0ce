//! Onion-model composition.
//!
//! [`compose`] folds an ordered [`Chain`] into one [`Composed`] middleware.
//! Running it calls the first unit with a [`Next`] pointing at the second,
//! and so on; the last unit's `Next` points at whatever continuation the
//! composed unit itself was given. Code a unit runs after `next.run().await`
//! therefore executes on the way back out, innermost first:
//!
//! ```text
//!  request ─▶ mw[0] ─▶ mw[1] ─▶ … ─▶ mw[n-1] ─▶ outer next
//!  outcome ◀─ mw[0] ◀─ mw[1] ◀─ … ◀─ mw[n-1] ◀─┘
//! ```
//!
//! Each invocation of a `Composed` owns a fresh [`Cursor`]. A continuation
//! may only move the cursor forward; calling `next.run()` twice, or after a
//! later unit has already run, fails with [`Error::MultipleNext`].

use std::future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Error;
use crate::handler::{BoxFuture, BoxedMiddleware, Middleware};
use crate::request::Request;

// ── Chain ─────────────────────────────────────────────────────────────────────

/// An ordered list of middleware, built once at startup.
///
/// ```rust
/// use kumi::{Chain, Error, Next, Request, Router, compose};
///
/// async fn log(req: Request, next: Next) -> Result<(), Error> {
///     tracing::info!(url = %req.url(), "request");
///     next.run().await
/// }
///
/// let app = compose(
///     Chain::new()
///         .with(log)
///         .with(Router::new().routes()),
/// );
/// ```
#[derive(Clone, Default)]
pub struct Chain {
    entries: Vec<BoxedMiddleware>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `mw` to the end of the chain. Returns `self` for chaining.
    pub fn with(mut self, mw: impl Middleware) -> Self {
        self.entries.push(Arc::new(mw));
        self
    }

    /// Builds a chain from optional entries, e.g. units toggled by
    /// configuration.
    ///
    /// Every slot must be filled: the first `None` is rejected with
    /// [`Error::InvalidChain`] carrying its position.
    pub fn from_slots<I>(slots: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = Option<BoxedMiddleware>>,
    {
        let entries = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(Error::InvalidChain { index }))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<BoxedMiddleware> for Chain {
    fn from_iter<T: IntoIterator<Item = BoxedMiddleware>>(iter: T) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

/// Composes `chain` into a single middleware that runs its entries in order.
pub fn compose(chain: Chain) -> Composed {
    Composed { entries: chain.entries.into() }
}

/// The middleware produced by [`compose`].
///
/// Cheap to clone; the entries are shared and never change.
#[derive(Clone)]
pub struct Composed {
    entries: Arc<[BoxedMiddleware]>,
}

impl Composed {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Middleware for Composed {
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        dispatch(Arc::clone(&self.entries), 0, Arc::new(Cursor::new()), req, next)
    }
}

// ── Cursor ────────────────────────────────────────────────────────────────────

/// Furthest step reached by one dispatch.
///
/// Stores `index + 1` of the furthest step so that zero means "nothing ran
/// yet". Only ever moves forward.
#[derive(Debug, Default)]
pub(crate) struct Cursor(AtomicUsize);

impl Cursor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records that step `index` is about to run.
    ///
    /// Fails if `index` is not strictly past every step recorded so far.
    pub(crate) fn advance(&self, index: usize) -> Result<(), Error> {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |reached| {
                (index >= reached).then_some(index + 1)
            })
            .map(drop)
            .map_err(|_| Error::MultipleNext { index: index.saturating_sub(1) })
    }
}

// ── Next ──────────────────────────────────────────────────────────────────────

/// The continuation handed to every middleware.
///
/// `next.run()` runs the rest of the chain and resolves to its outcome.
/// Cloning is allowed, but within one dispatch each step may only be
/// entered once.
#[derive(Clone, Default)]
pub struct Next {
    step: Option<Arc<Step>>,
}

struct Step {
    entries: Arc<[BoxedMiddleware]>,
    index: usize,
    cursor: Arc<Cursor>,
    req: Request,
    outer: Next,
}

impl Next {
    /// A continuation that does nothing and succeeds.
    ///
    /// Pass this when invoking a composed chain that has no terminal
    /// handler of its own.
    pub fn end() -> Self {
        Self::default()
    }

    /// Runs the remainder of the chain.
    pub fn run(&self) -> BoxFuture {
        match &self.step {
            None => Box::pin(future::ready(Ok(()))),
            Some(step) => dispatch(
                Arc::clone(&step.entries),
                step.index,
                Arc::clone(&step.cursor),
                step.req.clone(),
                step.outer.clone(),
            ),
        }
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.step {
            None => f.write_str("Next::end"),
            Some(step) => f.debug_struct("Next")
                .field("index", &step.index)
                .field("len", &step.entries.len())
                .finish_non_exhaustive(),
        }
    }
}

/// Runs step `index` of `entries`, or `outer` once the chain is exhausted.
fn dispatch(
    entries: Arc<[BoxedMiddleware]>,
    index: usize,
    cursor: Arc<Cursor>,
    req: Request,
    outer: Next,
) -> BoxFuture {
    if let Err(e) = cursor.advance(index) {
        return Box::pin(future::ready(Err(e)));
    }

    if index == entries.len() {
        return outer.run();
    }

    let mw = Arc::clone(&entries[index]);
    let next = Next {
        step: Some(Arc::new(Step {
            entries,
            index: index + 1,
            cursor,
            req: req.clone(),
            outer,
        })),
    };
    mw.call(req, next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_only_moves_forward() {
        let cursor = Cursor::new();
        assert!(cursor.advance(0).is_ok());
        assert!(cursor.advance(1).is_ok());
        assert!(cursor.advance(3).is_ok());
        assert!(matches!(cursor.advance(3), Err(Error::MultipleNext { index: 2 })));
        assert!(matches!(cursor.advance(1), Err(Error::MultipleNext { index: 0 })));
        assert!(cursor.advance(4).is_ok());
    }

    #[test]
    fn from_slots_reports_first_gap() {
        let unit: BoxedMiddleware = Arc::new(|_req: Request, next: Next| async move { next.run().await });
        let err = Chain::from_slots([Some(unit.clone()), None, Some(unit.clone()), None])
            .err()
            .expect("gap rejected");
        assert!(matches!(err, Error::InvalidChain { index: 1 }));

        let chain = Chain::from_slots([Some(unit.clone()), Some(unit)]).expect("no gaps");
        assert_eq!(chain.len(), 2);
    }

    #[tokio::test]
    async fn empty_chain_without_terminal_succeeds() {
        let app = compose(Chain::new());
        assert!(app.is_empty());
        assert!(app.call(Request::new("GET", "/"), Next::end()).await.is_ok());
    }
}
