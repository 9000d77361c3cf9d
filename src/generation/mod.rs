pub mod backoff;
pub mod client;
pub mod request;

pub use backoff::RetryPolicy;
pub use client::GenerationClient;
pub use request::{GenerationPhase, GenerationRequest, GenerationSnapshot, RequestStatus};
