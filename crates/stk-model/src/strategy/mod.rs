mod algorithm;
pub use algorithm::BackoffAlgorithm;

mod backoff;
pub use backoff::BackoffOptions;

mod polling;
pub use polling::PollingConfig;
