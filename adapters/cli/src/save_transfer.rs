#![allow(clippy::missing_errors_doc)]

use std::{collections::BTreeMap, error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

const SAVE_DOMAIN: &str = "geocoin";
const SAVE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded save payload.
pub(crate) const SAVE_HEADER: &str = "geocoin:v1";
/// Delimiter used to separate the prefix, version and payload.
const FIELD_DELIMITER: char = ':';

/// Every storage entry of a save, ready to be moved between machines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SaveSnapshot {
    /// Raw storage values keyed by storage key.
    pub entries: BTreeMap<String, String>,
}

impl SaveSnapshot {
    /// Encodes the snapshot into a single-line string suitable for clipboard transfer.
    pub(crate) fn encode(&self) -> Result<String, SaveTransferError> {
        let json = serde_json::to_vec(self).map_err(SaveTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!("{SAVE_HEADER}:{encoded}"))
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, SaveTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(SaveTransferError::EmptyPayload);
        }

        let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
        let domain = parts.next().ok_or(SaveTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(SaveTransferError::MissingVersion)?;
        let payload = parts.next().ok_or(SaveTransferError::MissingPayload)?;

        if domain != SAVE_DOMAIN {
            return Err(SaveTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SAVE_VERSION {
            return Err(SaveTransferError::UnsupportedVersion(version.to_owned()));
        }

        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(SaveTransferError::InvalidEncoding)?;
        serde_json::from_slice(&bytes).map_err(SaveTransferError::InvalidPayload)
    }
}

/// Errors that can occur while moving saves through strings.
#[derive(Debug)]
pub(crate) enum SaveTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded save.
    MissingPrefix,
    /// The encoded save did not contain a version segment.
    MissingVersion,
    /// The encoded save did not include the payload segment.
    MissingPayload,
    /// The encoded save used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded save used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    InvalidPayload(serde_json::Error),
}

impl fmt::Display for SaveTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "save string was empty"),
            Self::MissingPrefix => write!(f, "save string is missing the prefix"),
            Self::MissingVersion => write!(f, "save string is missing the version"),
            Self::MissingPayload => write!(f, "save string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "save prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "save version '{version}' is not supported")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode save payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not process save payload: {error}")
            }
        }
    }
}

impl Error for SaveTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}
