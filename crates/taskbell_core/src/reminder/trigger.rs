//! Trigger authorization in front of the scan driver.
//!
//! # Invariants
//! - Authorization happens before any storage access: the connection is
//!   only opened once the caller is accepted.
//! - A guard without a configured digest rejects every caller.
//! - Only the SHA-256 digest of the shared secret is ever configured.

use crate::clock::Clock;
use crate::reminder::driver::{PassSummary, ScanDriver};
use crate::reminder::EngineSettings;
use log::warn;
use rusqlite::Connection;
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DIGEST_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerError {
    /// No trigger digest is configured; triggering is disabled.
    NotConfigured,
    /// The caller presented no secret.
    MissingToken,
    /// The presented secret does not match.
    Unauthorized,
    /// The configured digest is not 64 hex characters.
    InvalidDigest(String),
}

impl Display for TriggerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "trigger secret is not configured"),
            Self::MissingToken => write!(f, "trigger token is missing"),
            Self::Unauthorized => write!(f, "trigger token rejected"),
            Self::InvalidDigest(value) => {
                write!(f, "invalid trigger digest `{value}`; expected 64 hex characters")
            }
        }
    }
}

impl Error for TriggerError {}

/// Checks the shared trigger secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerGuard {
    digest: Option<[u8; DIGEST_LEN]>,
}

impl TriggerGuard {
    /// Builds a guard from a hex SHA-256 digest. `None` or a blank value
    /// yields a guard that rejects everything.
    pub fn from_hex_digest(digest: Option<&str>) -> Result<Self, TriggerError> {
        let Some(raw) = digest.map(str::trim).filter(|value| !value.is_empty()) else {
            return Ok(Self { digest: None });
        };
        let bytes =
            hex::decode(raw).map_err(|_| TriggerError::InvalidDigest(raw.to_string()))?;
        let digest: [u8; DIGEST_LEN] = bytes
            .try_into()
            .map_err(|_| TriggerError::InvalidDigest(raw.to_string()))?;
        Ok(Self {
            digest: Some(digest),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.digest.is_some()
    }

    pub fn authorize(&self, presented: Option<&str>) -> Result<(), TriggerError> {
        let Some(expected) = self.digest else {
            return Err(TriggerError::NotConfigured);
        };
        let Some(presented) = presented.filter(|value| !value.is_empty()) else {
            return Err(TriggerError::MissingToken);
        };
        let actual = Sha256::digest(presented.as_bytes());
        if digests_match(&expected, actual.as_slice()) {
            Ok(())
        } else {
            Err(TriggerError::Unauthorized)
        }
    }
}

/// Hex SHA-256 of `secret`, the form stored in configuration.
pub fn hash_token(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Comparison time does not depend on where the digests differ.
fn digests_match(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Authorizes `presented` and, only on success, opens storage through
/// `open` and runs one pass at the clock's current instant.
pub fn run_triggered_pass<E, F>(
    guard: &TriggerGuard,
    presented: Option<&str>,
    clock: &dyn Clock,
    settings: EngineSettings,
    open: F,
) -> Result<PassSummary, E>
where
    E: From<TriggerError>,
    F: FnOnce() -> Result<Connection, E>,
{
    if let Err(err) = guard.authorize(presented) {
        warn!("event=trigger_rejected module=reminder status=rejected reason={err}");
        return Err(err.into());
    }
    let conn = open()?;
    Ok(ScanDriver::new(&conn, settings).run_pass(clock.now()))
}
