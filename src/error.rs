//! Error type shared by every chainkit operation.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ChainKitError>;

/// Represents errors that can occur while generating keys, certificates and chains.
///
/// None of these are retried internally: every failure is a deterministic function of
/// its inputs. Messages never carry private key material.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainKitError {
    /// The cryptography provider rejected an operation: key generation, malformed
    /// PEM/DER input, a key that does not match its certificate.
    #[error("Crypto provider error: {0}")]
    CryptoProviderError(String),

    /// Building or signing a certificate failed, e.g. a subject field or extension
    /// value the grammar rejects.
    #[error("Certificate generation error: {0}")]
    CertGenerationError(String),

    /// The caller handed in an internally inconsistent value. This is a bug in the
    /// caller, not a runtime condition.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl ChainKitError {
    pub(crate) fn generation(msg: impl Into<String>) -> Self {
        ChainKitError::CertGenerationError(msg.into())
    }

    pub(crate) fn provider(msg: impl Into<String>) -> Self {
        ChainKitError::CryptoProviderError(msg.into())
    }

    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!(detail = %msg, "invariant violation");
        ChainKitError::InvariantViolation(msg)
    }

    /// Re-tags a provider failure that happened while producing a certificate.
    pub(crate) fn into_generation(self) -> Self {
        match self {
            ChainKitError::CryptoProviderError(msg) => ChainKitError::CertGenerationError(msg),
            other => other,
        }
    }
}

impl From<der::Error> for ChainKitError {
    /// Converts a `der::Error` into a `ChainKitError`.
    fn from(err: der::Error) -> Self {
        ChainKitError::CryptoProviderError(err.to_string())
    }
}

impl From<pem::PemError> for ChainKitError {
    fn from(err: pem::PemError) -> Self {
        ChainKitError::CryptoProviderError(err.to_string())
    }
}

impl From<pkcs8::Error> for ChainKitError {
    fn from(err: pkcs8::Error) -> Self {
        ChainKitError::CryptoProviderError(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for ChainKitError {
    fn from(err: pkcs8::spki::Error) -> Self {
        ChainKitError::CryptoProviderError(err.to_string())
    }
}

impl From<p256::elliptic_curve::Error> for ChainKitError {
    fn from(err: p256::elliptic_curve::Error) -> Self {
        ChainKitError::CryptoProviderError(err.to_string())
    }
}

impl From<ecdsa::Error> for ChainKitError {
    fn from(err: ecdsa::Error) -> Self {
        ChainKitError::CryptoProviderError(err.to_string())
    }
}
