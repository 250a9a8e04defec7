use aviatron_types::{Credentials, GateConfig, ValidationError};
use tracing::{info, warn};

/// Downstream credentials released by a successful activation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unlocked {
    pub account_id: Option<String>,
    pub api_key: Option<String>,
}

/// Validates credentials before the rest of the system unlocks.
///
/// Stateless beyond the pass/fail decision: a failed validation mutates
/// nothing and is terminal until the caller resubmits.
pub struct ActivationGate {
    config: GateConfig,
    unlocked: bool,
}

impl ActivationGate {
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            unlocked: false,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn activate(&mut self, credentials: &Credentials) -> Result<Unlocked, ValidationError> {
        if let Err(err) = credentials.validate(&self.config) {
            warn!(%err, "activation rejected");
            return Err(err);
        }
        self.unlocked = true;
        let unlocked = Unlocked {
            account_id: (!credentials.account_id.is_empty())
                .then(|| credentials.account_id.clone()),
            api_key: (!credentials.api_key.is_empty()).then(|| credentials.api_key.clone()),
        };
        info!(
            account = unlocked.account_id.as_deref().unwrap_or("<none>"),
            "activated"
        );
        Ok(unlocked)
    }
}
