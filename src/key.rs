use std::fmt;

use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::zeroize::Zeroizing;
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rand_core::OsRng;
use sha1::{Digest, Sha1};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::{ChainKitError, Result};

/// PEM label of a PKCS#8 private key.
const PKCS8_LABEL: &str = "PRIVATE KEY";
/// PEM label of a SEC1 `ECPrivateKey`.
const SEC1_LABEL: &str = "EC PRIVATE KEY";

/// An ECDSA P-256 key pair.
///
/// The private half never shows up in `Debug` output, log events or errors.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

/// Binary export of a [`KeyPair`].
pub struct KeyPairDer {
    /// SEC1 `ECPrivateKey` structure, wiped on drop.
    pub private_key_der: Zeroizing<Vec<u8>>,
    /// `SubjectPublicKeyInfo` structure.
    pub public_key_der: Vec<u8>,
}

impl KeyPair {
    /// Generate a fresh key pair on NIST P-256.
    pub fn generate() -> Result<Self> {
        let signing_key = SigningKey::random(&mut OsRng);
        Ok(Self::from_signing_key(signing_key))
    }

    /// Generate a key pair and export it straight away.
    pub fn generate_der() -> Result<KeyPairDer> {
        Self::generate()?.to_der()
    }

    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = *signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.verifying_key)
    }

    /// Exports the private key as SEC1 DER and the public key as SPKI DER.
    pub fn to_der(&self) -> Result<KeyPairDer> {
        let secret = p256::SecretKey::from_bytes(&self.signing_key.to_bytes())?;
        let private_key_der = secret.to_sec1_der()?;
        let public_key_der = self.verifying_key.to_public_key_der()?.into_vec();
        Ok(KeyPairDer {
            private_key_der,
            public_key_der,
        })
    }

    /// Encodes the private key as a PKCS#8 PEM document.
    pub fn to_pkcs8_pem(&self) -> Result<Zeroizing<String>> {
        Ok(self.signing_key.to_pkcs8_pem(LineEnding::LF)?)
    }

    /// Decodes a private key from PEM. Both PKCS#8 (`PRIVATE KEY`) and SEC1
    /// (`EC PRIVATE KEY`) armor are accepted.
    pub fn from_pem(pem_str: &str) -> Result<Self> {
        let block = pem::parse(pem_str)?;
        let signing_key = match block.tag() {
            PKCS8_LABEL => SigningKey::from_pkcs8_der(block.contents())?,
            SEC1_LABEL => SigningKey::from(p256::SecretKey::from_sec1_der(block.contents())?),
            other => {
                return Err(ChainKitError::provider(format!(
                    "unsupported private key label `{other}`"
                )));
            }
        };
        Ok(Self::from_signing_key(signing_key))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// The public half of a [`KeyPair`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(pub VerifyingKey);

impl PublicKey {
    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        Ok(SubjectPublicKeyInfoOwned::from_key(self.0)?)
    }

    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        use der::Encode;
        let der = spki.to_der()?;
        Ok(Self(VerifyingKey::from_public_key_der(&der)?))
    }

    /// Uncompressed SEC1 point, identical to the `subjectPublicKey` bit string.
    pub fn to_sec1_bytes(&self) -> Vec<u8> {
        self.0.to_encoded_point(false).as_bytes().to_vec()
    }

    /// SHA-1 over the `subjectPublicKey` bits (RFC 5280 4.2.1.2, method 1).
    pub fn key_identifier(&self) -> Vec<u8> {
        Sha1::digest(self.to_sec1_bytes()).to_vec()
    }

    /// Checks a DER-encoded ECDSA/SHA-256 signature over `msg`.
    pub fn verify(&self, msg: &[u8], der_signature: &[u8]) -> Result<()> {
        let signature = Signature::from_der(der_signature)?;
        Ok(self.0.verify(msg, &signature)?)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(P-256, ")?;
        for b in self.key_identifier() {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}
