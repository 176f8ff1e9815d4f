//! Control-plane request document.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

pub const PUT_VALUE: &str = "dht_putValue";
pub const GET_VALUE: &str = "dht_getValue";

/// Wire form of a request. Field names follow the existing client protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlRequest {
    #[serde(rename = "JSONRPCMethod", default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(rename = "Key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "Value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ControlRequest {
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            method: Some(PUT_VALUE.to_string()),
            key: Some(key.into()),
            value: Some(value.into()),
        }
    }

    pub fn get(key: impl Into<String>) -> Self {
        Self {
            method: Some(GET_VALUE.to_string()),
            key: Some(key.into()),
            value: None,
        }
    }

    /// Decode a request body. Anything that is not a JSON object is malformed.
    pub fn from_body(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| ApiError::Malformed(e.to_string()))
    }

    /// Validate the document into an executable command.
    pub fn into_command(self) -> Result<Command> {
        let method = self.method.ok_or(ApiError::MissingField("JSONRPCMethod"))?;
        match method.as_str() {
            PUT_VALUE => {
                let key = self.key.ok_or(ApiError::MissingField("Key"))?;
                let value = self.value.ok_or(ApiError::MissingField("Value"))?;
                Ok(Command::Put {
                    key,
                    value: Bytes::from(value),
                })
            }
            GET_VALUE => {
                let key = self.key.ok_or(ApiError::MissingField("Key"))?;
                Ok(Command::Get { key })
            }
            _ => Err(ApiError::UnknownMethod(method)),
        }
    }
}

/// A validated control-plane operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Put { key: String, value: Bytes },
    Get { key: String },
}

impl Command {
    pub fn method(&self) -> &'static str {
        match self {
            Command::Put { .. } => PUT_VALUE,
            Command::Get { .. } => GET_VALUE,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Command::Put { key, .. } | Command::Get { key } => key,
        }
    }
}
