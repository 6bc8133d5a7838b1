use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::core::{Family, Interceptor, ShortCircuit};
use crate::server::Request;

/// Ordered interceptors of one handler.
///
/// Insertion order is `before` order; `after` runs in exact reverse over the
/// interceptors whose `before` ran.
pub struct InterceptorChain<F: Family> {
    interceptors: Vec<Arc<dyn Interceptor<F>>>,
}

/// What happened during one [`InterceptorChain::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainOutcome {
    /// Interceptors whose `before` ran; exactly these received `after`.
    pub entered: usize,
    /// Index of the interceptor whose `before` decided the response.
    pub short_circuited_at: Option<usize>,
    /// Whether the handler dispatch step ran.
    pub dispatched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainState {
    RunningBefore(usize),
    Dispatching,
    /// Number of interceptors still owed an `after` call.
    RunningAfter(usize),
    Done,
}

impl<F: Family> InterceptorChain<F> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            interceptors: Vec::new(),
        }
    }

    /// Append an interceptor, builder style.
    #[must_use]
    pub fn with<I>(mut self, interceptor: I) -> Self
    where
        I: Interceptor<F> + 'static,
    {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Append an interceptor instance shared with other chains.
    #[must_use]
    pub fn with_shared(mut self, interceptor: Arc<dyn Interceptor<F>>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn push(&mut self, interceptor: Arc<dyn Interceptor<F>>) {
        self.interceptors.push(interceptor);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Run `before` hooks, the dispatch step and `after` hooks against `res`.
    ///
    /// After each `before` the family's short-circuit predicate is checked.
    /// When it fires at index `k`, dispatch is skipped and `after` runs for
    /// `k, k-1, .., 0` only; the deciding interceptor's `after` still fires.
    /// Interceptors past `k` see neither hook.
    ///
    /// The caller commits `res` once this returns.
    pub fn run<'a, D>(&self, res: &mut F::Response<'a>, req: &Request, dispatch: D) -> ChainOutcome
    where
        D: FnOnce(&mut F::Response<'a>),
    {
        let total = self.interceptors.len();
        let mut active = total;
        let mut dispatch = Some(dispatch);
        let mut outcome = ChainOutcome {
            entered: 0,
            short_circuited_at: None,
            dispatched: false,
        };

        let mut state = ChainState::RunningBefore(0);
        loop {
            state = match state {
                ChainState::RunningBefore(k) if k >= total => ChainState::Dispatching,
                ChainState::RunningBefore(k) => {
                    self.interceptors[k].before(res, req);
                    if res.should_short_circuit() {
                        active = k + 1;
                        outcome.short_circuited_at = Some(k);
                        debug!(
                            family = F::NAME,
                            interceptor = k,
                            chain_len = total,
                            "Chain short-circuited in before hook"
                        );
                        ChainState::RunningAfter(active)
                    } else {
                        ChainState::RunningBefore(k + 1)
                    }
                }
                ChainState::Dispatching => {
                    if let Some(dispatch) = dispatch.take() {
                        dispatch(res);
                    }
                    outcome.dispatched = true;
                    ChainState::RunningAfter(active)
                }
                ChainState::RunningAfter(0) => ChainState::Done,
                ChainState::RunningAfter(remaining) => {
                    self.interceptors[remaining - 1].after(res, req);
                    ChainState::RunningAfter(remaining - 1)
                }
                ChainState::Done => break,
            };
        }

        outcome.entered = active;
        outcome
    }
}

impl<F: Family> Default for InterceptorChain<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Family> Clone for InterceptorChain<F> {
    fn clone(&self) -> Self {
        Self {
            interceptors: self.interceptors.iter().map(Arc::clone).collect(),
        }
    }
}

impl<F: Family> fmt::Debug for InterceptorChain<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("family", &F::NAME)
            .field("len", &self.interceptors.len())
            .finish()
    }
}

impl<F: Family> FromIterator<Arc<dyn Interceptor<F>>> for InterceptorChain<F> {
    fn from_iter<T: IntoIterator<Item = Arc<dyn Interceptor<F>>>>(iter: T) -> Self {
        Self {
            interceptors: iter.into_iter().collect(),
        }
    }
}
