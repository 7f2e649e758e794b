//! Dev server liveness subsystem.
//!
//! # Data Flow
//! ```text
//! dev_server_running()
//!     → policy.rs (proxying disabled? answer false, no network)
//!     → probe.rs (lock the cache)
//!         → state.rs fresh? answer from cache
//!         → otherwise one GET to {scheme}://{host}:{port}/{public_output_dir}
//!         → record Up/Down with timestamp
//! ```
//!
//! # Design Decisions
//! - Probe failures are absorbed and cached as Down; rendering never breaks
//!   because the dev server is stopped
//! - No retries inside a window; a failed probe is retried once it expires
//! - The cache lock is held across the request so concurrent callers share
//!   a single outbound probe

pub mod policy;
pub mod probe;
pub mod state;

pub use policy::should_proxy;
pub use probe::{LivenessProbe, PROBE_WINDOW};
pub use state::{ProbeCache, ProbeState};
