//! The request execution layer: transports, retry state, and the executor that ties them together.

mod executor;
mod list;
mod state;
mod transport;

pub use executor::Executor;
pub use list::ListResponse;
pub use state::{
    DEFAULT_DOWNLOAD_TIMEOUT, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT, RetryConfig, State,
};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Sleeper, ThreadSleeper, Transport};
