//! Repository layer
//!
//! The job record store plus thin adapters over the external services the
//! dispatcher talks to. Every seam is a trait so services can be tested
//! against fakes.

mod artifact;
mod compute;
mod job;
mod memory;
mod metrics;
mod network;

// Re-export traits
pub use artifact::ArtifactRepository;
pub use compute::{ComputeError, ComputeRepository};
pub use job::{Claim, JobStore, StoreError, StoreResult, Transition};
pub use metrics::MetricsRepository;
pub use network::NetworkRepository;

// Re-export implementations
pub use artifact::HttpArtifactRepository;
pub use compute::HttpComputeRepository;
pub use job::PgJobStore;
pub use memory::InMemoryJobStore;
pub use metrics::{HttpMetricsRepository, LogMetricsRepository};
pub use network::HttpNetworkRepository;
