//! Exchange environment selection.

use serde::{Deserialize, Serialize};

/// Which exchange host to talk to. Selects the HTTP host used by
/// `ExchangeClient` (see `exchange::host_for`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Demo,
    Prod,
}

impl Environment {
    pub fn host(&self) -> &'static str {
        match self {
            Environment::Demo => "https://demo-api.kalshi.co",
            Environment::Prod => "https://trading-api.kalshi.com",
        }
    }
}
