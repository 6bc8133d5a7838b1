use crate::server::Request;

/// A handler family: page rendering or raw API.
///
/// The family fixes the per-request response object interceptors and
/// handlers operate on, and through [`ShortCircuit`] the rule by which a
/// `before` hook preempts the handler.
pub trait Family: 'static {
    /// Per-request response object, borrowing the output sink for `'a`.
    type Response<'a>: ShortCircuit;

    /// Label used in logs and spans.
    const NAME: &'static str;
}

/// Short-circuit predicate evaluated after every `before` hook.
pub trait ShortCircuit {
    /// `true` once the response has been decided and the handler must be skipped.
    fn should_short_circuit(&self) -> bool;
}

/// Cross-cutting hooks around a handler invocation.
///
/// Both hooks default to no-ops. Implementations must not rely on instance
/// identity; chains may hold fresh or shared instances.
pub trait Interceptor<F: Family>: Send + Sync {
    fn before(&self, _res: &mut F::Response<'_>, _req: &Request) {}
    fn after(&self, _res: &mut F::Response<'_>, _req: &Request) {}
}
