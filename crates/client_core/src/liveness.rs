use std::fmt;

use tracing::{info, warn};

use crate::backend::BackendApi;

/// Advisory backend reachability; never gates connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LivenessStatus {
    #[default]
    Pending,
    Ok,
    Error,
}

impl LivenessStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Checking API...",
            Self::Ok => "OK",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LivenessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub struct LivenessProbe;

impl LivenessProbe {
    pub async fn check(backend: &dyn BackendApi) -> LivenessStatus {
        match backend.check_health().await {
            Ok(()) => {
                info!("liveness: backend reachable");
                LivenessStatus::Ok
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "liveness: backend unreachable");
                LivenessStatus::Error
            }
        }
    }
}
