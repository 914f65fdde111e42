//! Control commands understood by the mock
//!
//! Each command is written as one JSON object per line; the mock answers with
//! one JSON line carrying a `status` and an optional `payload`.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{MockError, MockResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCommand {
    /// Toggle cluster-config-carrier-publication (config pushed over the data connection)
    SetCccp { enabled: bool },
    /// Restrict the SASL mechanisms the mock advertises
    SetSaslMechanisms { mechanisms: Vec<String> },
    /// Ask for the data-service (memcached) ports of a bucket
    GetMemcachedPorts { bucket: String },
}

impl MockCommand {
    pub fn name(&self) -> &'static str {
        match self {
            MockCommand::SetCccp { .. } => "SET_CCCP",
            MockCommand::SetSaslMechanisms { .. } => "SET_SASL_MECHANISMS",
            MockCommand::GetMemcachedPorts { .. } => "GET_MCPORTS",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            MockCommand::SetCccp { enabled } => json!({ "enabled": enabled.to_string() }),
            MockCommand::SetSaslMechanisms { mechanisms } => json!({ "mechs": mechanisms }),
            MockCommand::GetMemcachedPorts { bucket } => json!({ "bucket": bucket }),
        }
    }

    /// Encode as a newline-terminated wire line
    pub fn to_line(&self) -> MockResult<String> {
        let body = json!({
            "command": self.name(),
            "payload": self.payload(),
        });
        let mut line = serde_json::to_string(&body)?;
        line.push('\n');
        Ok(line)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockResponse {
    pub status: String,
    #[serde(default)]
    pub payload: Value,
}

impl MockResponse {
    pub fn parse(line: &str) -> MockResult<Self> {
        Ok(serde_json::from_str(line.trim())?)
    }

    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }

    /// Turn a non-ok status into an error naming the command
    pub fn into_result(self, command: &MockCommand) -> MockResult<Self> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(MockError::CommandFailed {
                command: command.name().to_string(),
                status: self.status,
            })
        }
    }

    /// Interpret the payload as a list of ports
    pub fn ports(&self) -> MockResult<Vec<u16>> {
        let entries = self.payload.as_array().ok_or_else(|| MockError::ProtocolError {
            message: format!("expected a port list, got {}", self.payload),
        })?;

        entries
            .iter()
            .map(|entry| {
                entry
                    .as_u64()
                    .and_then(|port| u16::try_from(port).ok())
                    .ok_or_else(|| MockError::ProtocolError {
                        message: format!("invalid port entry {entry}"),
                    })
            })
            .collect()
    }
}
