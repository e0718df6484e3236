//! Console tabs.

use serde::Serialize;

use crate::domain::foundation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Devices,
    Chart,
    ForwarderConfig,
    ServerConfig,
    NodeConfig,
}

impl Tab {
    /// Page number as shown in the tab bar (1-based).
    pub fn number(&self) -> u8 {
        match self {
            Tab::Devices => 1,
            Tab::Chart => 2,
            Tab::ForwarderConfig => 3,
            Tab::ServerConfig => 4,
            Tab::NodeConfig => 5,
        }
    }

    pub fn from_number(n: u8) -> Result<Self, ValidationError> {
        match n {
            1 => Ok(Tab::Devices),
            2 => Ok(Tab::Chart),
            3 => Ok(Tab::ForwarderConfig),
            4 => Ok(Tab::ServerConfig),
            5 => Ok(Tab::NodeConfig),
            other => Err(ValidationError::out_of_range("tab", 1, 5, i64::from(other))),
        }
    }
}
