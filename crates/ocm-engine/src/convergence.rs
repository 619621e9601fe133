//! Convergence waiting
//!
//! After a bundle is created the hub needs a moment before its work agent
//! reports anything. The waiter polls until the bundle carries at least one
//! status condition.

use crate::control_plane::ControlPlane;
use crate::crd::ManifestWork;
use crate::error::EngineError;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

/// Timing of the convergence poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvergenceConfig {
    /// Total time allowed, measured from the start of the wait
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl ConvergenceConfig {
    pub fn from_millis(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            poll_interval: Duration::from_millis(poll_interval_ms),
        }
    }
}

/// Poll `namespace/name` until it reports a condition or the deadline passes
///
/// Fetch errors are logged and polling continues. A fetch still in flight
/// at the deadline is abandoned, and no fetch is issued after it.
pub async fn wait_for_convergence(
    plane: &dyn ControlPlane,
    namespace: &str,
    name: &str,
    config: &ConvergenceConfig,
) -> Result<ManifestWork, EngineError> {
    let deadline = Instant::now() + config.timeout;
    let mut attempt = 0u32;

    loop {
        if Instant::now() >= deadline {
            break;
        }

        attempt += 1;
        let fetched = match time::timeout_at(deadline, plane.get_work(namespace, name)).await {
            Ok(fetched) => fetched,
            Err(_) => {
                warn!(namespace, name, attempt, "ManifestWork fetch still pending at deadline");
                break;
            }
        };
        match fetched {
            Ok(Some(work)) if !work.conditions().is_empty() => {
                debug!(namespace, name, attempt, "ManifestWork reported status");
                return Ok(work);
            }
            Ok(Some(_)) => debug!(namespace, name, attempt, "ManifestWork has no conditions yet"),
            Ok(None) => debug!(namespace, name, attempt, "ManifestWork not visible yet"),
            Err(e) => warn!(namespace, name, attempt, error = %e, "Error fetching ManifestWork status"),
        }

        tokio::select! {
            biased;
            _ = time::sleep_until(deadline) => break,
            _ = time::sleep(config.poll_interval) => {}
        }
    }

    Err(EngineError::ConvergenceTimeout {
        namespace: namespace.to_string(),
        name: name.to_string(),
    })
}
