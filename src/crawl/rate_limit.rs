//! Global request rate cap shared by every worker

use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::trace;

/// Rate limiter for all outbound requests of one fetcher
#[derive(Clone)]
pub struct GlobalRateLimiter {
    limiter: Arc<
        RateLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,
}

impl GlobalRateLimiter {
    /// Create a new global rate limiter
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(nonzero!(1u32));
        let quota = Quota::per_second(rps);
        let limiter = Arc::new(RateLimiter::direct(quota));

        Self { limiter }
    }

    /// Wait until a request is allowed
    pub async fn wait(&self) {
        trace!("Waiting for rate limiter");
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for GlobalRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalRateLimiter").finish_non_exhaustive()
    }
}
