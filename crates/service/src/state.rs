use common::crypto::SecretKey;
use common::gate::MemoryKeyGate;
use common::ledger::MemoryNetLedger;

use super::config::Config;

/// Main service state - the shared record this daemon hosts
#[derive(Debug, Clone)]
pub struct State {
    ledger: MemoryNetLedger,
    gate: MemoryKeyGate,
    node_secret: SecretKey,
}

impl State {
    pub fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Resolve the node identity: explicit key, PEM file, or fresh
        let node_secret = match (&config.node_secret, &config.node_secret_path) {
            (Some(secret), _) => secret.clone(),
            (None, Some(path)) => {
                if !path.exists() {
                    return Err(StateSetupError::SecretPathDoesNotExist);
                }
                let pem = std::fs::read_to_string(path)?;
                SecretKey::from_pem(&pem)
                    .map_err(|e| StateSetupError::InvalidSecretPem(e.to_string()))?
            }
            (None, None) => SecretKey::generate(),
        };

        // 2. Fresh shared record and gate
        let ledger = MemoryNetLedger::new();
        let gate = MemoryKeyGate::new();

        tracing::info!("Node id: {}", node_secret.public());

        Ok(Self {
            ledger,
            gate,
            node_secret,
        })
    }

    pub fn ledger(&self) -> &MemoryNetLedger {
        &self.ledger
    }

    pub fn gate(&self) -> &MemoryKeyGate {
        &self.gate
    }

    pub fn node_secret(&self) -> &SecretKey {
        &self.node_secret
    }

    pub fn node_id(&self) -> common::crypto::PublicKey {
        self.node_secret.public()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Node secret path does not exist")]
    SecretPathDoesNotExist,
    #[error("Failed to read node secret: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid node secret PEM: {0}")]
    InvalidSecretPem(String),
}
