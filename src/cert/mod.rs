pub mod conf;
pub mod extensions;
pub mod name;
pub mod params;

use der::{Decode, DecodePem, Encode, EncodePem};
use extensions::{ExtensionParam, ToAndFromX509Extension};
use time::OffsetDateTime;
use x509_cert::name::Name;
use x509_cert::time::Time;

use crate::error::{ChainKitError, Result};
use crate::key::{KeyPair, PublicKey};

/// Represents the supported signature algorithms for certificates.
///
/// Only ECDSA over P-256 with SHA-256 is produced or accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with ECDSA.
    Sha256WithECDSA,
}

impl From<SignatureAlgorithm> for x509_cert::spki::AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// ECDSA identifiers carry no parameters (RFC 5758 3.2).
    fn from(value: SignatureAlgorithm) -> Self {
        match value {
            SignatureAlgorithm::Sha256WithECDSA => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
                parameters: None,
            },
        }
    }
}

/// Represents an X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER or PEM formats and
/// read back the fields the chain builder cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: x509_cert::Certificate,
}

impl Certificate {
    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.inner.to_der()?)
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        Ok(self.inner.to_pem(pkcs8::LineEnding::LF)?)
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        Ok(Self {
            inner: x509_cert::Certificate::from_der(der)?,
        })
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        Ok(Self {
            inner: x509_cert::Certificate::from_pem(pem)?,
        })
    }

    pub fn subject(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer(&self) -> &Name {
        &self.inner.tbs_certificate.issuer
    }

    /// First common name of the subject.
    pub fn common_name(&self) -> Option<String> {
        name::common_name(self.subject())
    }

    /// Big-endian serial number bytes, as encoded.
    pub fn serial_number(&self) -> Vec<u8> {
        self.inner
            .tbs_certificate
            .serial_number
            .as_bytes()
            .to_vec()
    }

    /// Serial number as an integer, if it fits.
    pub fn serial_u64(&self) -> Option<u64> {
        let bytes = self.inner.tbs_certificate.serial_number.as_bytes();
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        let significant = &bytes[start..];
        if significant.len() > 8 {
            return None;
        }
        Some(
            significant
                .iter()
                .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)),
        )
    }

    pub fn not_before(&self) -> Result<OffsetDateTime> {
        to_offset_date_time(self.inner.tbs_certificate.validity.not_before)
    }

    pub fn not_after(&self) -> Result<OffsetDateTime> {
        to_offset_date_time(self.inner.tbs_certificate.validity.not_after)
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    /// All extensions, in certificate order.
    pub fn extensions(&self) -> Vec<ExtensionParam> {
        self.inner
            .tbs_certificate
            .extensions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(ExtensionParam::from_x509)
            .collect()
    }

    /// Finds and decodes the extension of type `E`.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<E>> {
        self.extension_param(E::OID)
            .map(|param| param.to_extension())
            .transpose()
    }

    pub fn extension_param(&self, oid: const_oid::ObjectIdentifier) -> Option<ExtensionParam> {
        self.extensions().into_iter().find(|ext| ext.oid == oid)
    }

    /// Checks the certificate signature against `issuer_key`.
    pub fn verify_signed_by(&self, issuer_key: &PublicKey) -> Result<()> {
        let expected: x509_cert::spki::AlgorithmIdentifierOwned =
            SignatureAlgorithm::Sha256WithECDSA.into();
        if self.inner.signature_algorithm != expected {
            return Err(ChainKitError::provider(format!(
                "unsupported signature algorithm {}",
                self.inner.signature_algorithm.oid
            )));
        }
        let tbs = self.inner.tbs_certificate.to_der()?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            ChainKitError::provider("signature bit string has unused bits")
        })?;
        issuer_key.verify(&tbs, signature)
    }

    /// Issuer equals subject and the signature verifies under the embedded key.
    pub fn is_self_signed(&self) -> bool {
        self.issuer() == self.subject()
            && self
                .public_key()
                .and_then(|key| self.verify_signed_by(&key))
                .is_ok()
    }
}

fn to_offset_date_time(time: Time) -> Result<OffsetDateTime> {
    let secs = i64::try_from(time.to_unix_duration().as_secs())
        .map_err(|e| ChainKitError::provider(e.to_string()))?;
    OffsetDateTime::from_unix_timestamp(secs).map_err(|e| ChainKitError::provider(e.to_string()))
}

/// A certificate together with the key pair it attests to.
///
/// The certificate's public key always equals `key`'s public key.
#[derive(Debug, Clone)]
pub struct SignedCert {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl SignedCert {
    /// Pairs a certificate with its private key, rejecting a mismatch.
    pub fn new(cert: Certificate, key: KeyPair) -> Result<Self> {
        if cert.public_key()? != key.public_key() {
            return Err(ChainKitError::provider(
                "certificate public key does not match the private key",
            ));
        }
        Ok(Self { cert, key })
    }
}
