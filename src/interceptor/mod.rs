mod chain;
mod core;
mod guard;
mod tracing;

pub use chain::{ChainOutcome, InterceptorChain};
pub use core::{Family, Interceptor, ShortCircuit};
pub use guard::RequireHeader;
pub use tracing::TracingInterceptor;
