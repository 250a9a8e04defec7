use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use super::MIN_ACTIVATION_CODE_LEN;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid activation code (len={len}, min={min})")]
    InvalidCode { len: usize, min: usize },
    #[error("account id is required but missing")]
    MissingAccountId,
    #[error("api key is required but missing")]
    MissingApiKey,
}

/// Which optional credential fields the gate requires.
///
/// Both switches are independently toggleable; by default neither the
/// account id nor the api key is required.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default)]
    pub require_account_id: bool,
    #[serde(default)]
    pub require_api_key: bool,
}

impl GateConfig {
    pub fn new(require_account_id: bool, require_api_key: bool) -> Self {
        Self {
            require_account_id,
            require_api_key,
        }
    }
}

/// Credentials collected before the rest of the system unlocks.
///
/// Created once at activation and immutable thereafter (process lifetime).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub activation_code: String,
    pub account_id: String,
    pub api_key: String,
}

impl Credentials {
    pub fn new(activation_code: String, account_id: String, api_key: String) -> Self {
        Self {
            activation_code,
            account_id,
            api_key,
        }
    }

    /// Check the shape of these credentials against the gate configuration.
    ///
    /// Pure; performs no I/O and mutates nothing.
    pub fn validate(&self, config: &GateConfig) -> Result<(), ValidationError> {
        if self.activation_code.len() < MIN_ACTIVATION_CODE_LEN {
            return Err(ValidationError::InvalidCode {
                len: self.activation_code.len(),
                min: MIN_ACTIVATION_CODE_LEN,
            });
        }
        if config.require_account_id && self.account_id.is_empty() {
            return Err(ValidationError::MissingAccountId);
        }
        if config.require_api_key && self.api_key.is_empty() {
            return Err(ValidationError::MissingApiKey);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(code: &str, account_id: &str, api_key: &str) -> Credentials {
        Credentials::new(code.into(), account_id.into(), api_key.into())
    }

    #[test]
    fn test_short_code_rejected() {
        let creds = credentials("AB", "acct", "key");
        assert_eq!(
            creds.validate(&GateConfig::default()),
            Err(ValidationError::InvalidCode {
                len: 2,
                min: MIN_ACTIVATION_CODE_LEN
            })
        );
    }

    #[test]
    fn test_minimum_code_length_accepted() {
        let creds = credentials("ABCDEFGH", "", "");
        assert_eq!(creds.validate(&GateConfig::default()), Ok(()));
    }

    #[test]
    fn test_required_fields_independently_toggleable() {
        let creds = credentials("XXXX-XXXX-XXXX", "", "");

        assert_eq!(
            creds.validate(&GateConfig::new(true, false)),
            Err(ValidationError::MissingAccountId)
        );
        assert_eq!(
            creds.validate(&GateConfig::new(false, true)),
            Err(ValidationError::MissingApiKey)
        );
        assert_eq!(creds.validate(&GateConfig::new(false, false)), Ok(()));

        let full = credentials("XXXX-XXXX-XXXX", "acct-1", "sk-1");
        assert_eq!(full.validate(&GateConfig::new(true, true)), Ok(()));
    }
}
