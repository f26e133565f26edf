use der::Encode;
use der::asn1::BitString;
use p256::ecdsa::DerSignature;
use p256::ecdsa::signature::Signer;
use time::OffsetDateTime;
use x509_cert::certificate::CertificateInner;
use x509_cert::ext::Extension;
use x509_cert::serial_number::SerialNumber;

use crate::cert::conf::{ExtensionConf, IssuerContext, IssuerView};
use crate::cert::name::build_name;
use crate::cert::params::CertSpec;
use crate::cert::{Certificate, SignatureAlgorithm, SignedCert};
use crate::error::{ChainKitError, Result};
use crate::key::KeyPair;
use crate::tbs_certificate::TbsCertificate;

/// Represents an entity capable of issuing certificates.
pub trait Issuer {
    /// The issuer's own certificate, `None` when the certificate being issued signs
    /// itself.
    fn certificate(&self) -> Option<&Certificate>;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Issues a certificate for `subject_key` as described by `spec`.
    ///
    /// # Arguments
    /// * `spec` - What to put in the certificate.
    /// * `subject_key` - The key pair the certificate attests to.
    ///
    /// # Returns
    /// The signed certificate. Any failure is a `CertGenerationError`.
    fn issue(&self, spec: &CertSpec, subject_key: &KeyPair) -> Result<Certificate> {
        build_certificate(self.certificate(), self.signing_key(), spec, subject_key).map_err(
            |err| {
                let err = err.into_generation();
                tracing::warn!(error = %err, serial = spec.serial_number, "certificate generation failed");
                err
            },
        )
    }
}

/// Issuer for self-signed certificates.
struct SelfIssuer<'a> {
    key: &'a KeyPair,
}

impl Issuer for SelfIssuer<'_> {
    fn certificate(&self) -> Option<&Certificate> {
        None
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }
}

impl Issuer for SignedCert {
    fn certificate(&self) -> Option<&Certificate> {
        Some(&self.cert)
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }
}

/// Signs a fresh certificate described by `spec`.
///
/// A new key pair is generated for the subject. With no `issuer` the certificate is
/// self-signed: issuer name equals subject name and the fresh key signs it. Otherwise
/// the issuer name is copied from the issuer certificate's subject and the issuer's
/// private key signs.
pub fn sign(spec: &CertSpec, issuer: Option<&SignedCert>) -> Result<SignedCert> {
    let key = KeyPair::generate()?;
    let cert = match issuer {
        None => SelfIssuer { key: &key }.issue(spec, &key)?,
        Some(issuer) => issuer.issue(spec, &key)?,
    };
    tracing::debug!(
        subject = %cert.subject(),
        issuer = %cert.issuer(),
        serial = spec.serial_number,
        self_signed = issuer.is_none(),
        "signed certificate"
    );
    Ok(SignedCert { cert, key })
}

fn build_certificate(
    issuer_cert: Option<&Certificate>,
    signing_key: &KeyPair,
    spec: &CertSpec,
    subject_key: &KeyPair,
) -> Result<Certificate> {
    let subject = build_name(&spec.subject)?;
    let issuer_name = match issuer_cert {
        Some(cert) => cert.subject().clone(),
        None => subject.clone(),
    };
    let serial_number = SerialNumber::new(&spec.serial_number.to_be_bytes())?;
    let subject_public_key = subject_key.public_key();

    let mut extensions: Vec<Extension> = Vec::with_capacity(spec.extensions.len());
    for entry in &spec.extensions {
        let conf = ExtensionConf::parse(&entry.name, &entry.value)?;
        let issuer = match issuer_cert {
            Some(cert) => IssuerView::Certificate(cert),
            None => IssuerView::SelfSigned {
                name: &subject,
                serial_number: &serial_number,
                extensions: &extensions,
            },
        };
        let ctx = IssuerContext {
            subject_key: &subject_public_key,
            issuer,
        };
        let Some(ext) = conf.evaluate(&ctx)? else {
            continue;
        };
        if extensions.iter().any(|e| e.extn_id == ext.extn_id) {
            return Err(ChainKitError::generation(format!(
                "extension `{}` given twice",
                entry.name
            )));
        }
        tracing::trace!(name = %entry.name, value = %entry.value, critical = ext.critical, "applied extension");
        extensions.push(ext);
    }

    let now = OffsetDateTime::now_utc();
    let offset_from_now = |offset: time::Duration| {
        now.checked_add(offset).ok_or_else(|| {
            ChainKitError::generation(format!("validity offset {offset} is out of range"))
        })
    };
    let tbs = TbsCertificate {
        serial_number,
        signature_algorithm: SignatureAlgorithm::Sha256WithECDSA,
        issuer: issuer_name,
        not_before: offset_from_now(spec.not_before_offset)?,
        not_after: offset_from_now(spec.not_after_offset)?,
        subject,
        subject_public_key,
        extensions,
    };
    let tbs_certificate = tbs.to_tbs_certificate_inner()?;

    let signature: DerSignature = signing_key
        .signing_key()
        .try_sign(&tbs_certificate.to_der()?)?;

    Ok(Certificate {
        inner: CertificateInner {
            tbs_certificate,
            signature_algorithm: SignatureAlgorithm::Sha256WithECDSA.into(),
            signature: BitString::from_bytes(signature.as_bytes())?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::extensions::{AuthorityKeyIdentifier, BasicConstraints, SubjectKeyIdentifier};
    use crate::cert::params::{CertKind, ExtensionEntry, SubjectAttribute};

    #[test]
    fn test_self_signed_root() {
        let spec = CertSpec::for_kind(CertKind::ServerRootCA);
        let root = sign(&spec, None).unwrap();
        assert!(root.cert.is_self_signed());
        assert_eq!(root.cert.public_key().unwrap(), root.key.public_key());
        assert_eq!(root.cert.serial_u64(), Some(spec.serial_number));
        let bc: BasicConstraints = root.cert.extension().unwrap().unwrap();
        assert!(bc.is_ca);
        assert!(root.cert.extension::<AuthorityKeyIdentifier>().unwrap().is_none());
    }

    #[test]
    fn test_issued_cert_links_to_issuer() {
        let root = sign(&CertSpec::for_kind(CertKind::ClientRootCA), None).unwrap();
        let leaf = sign(&CertSpec::for_kind(CertKind::ClientLeaf), Some(&root)).unwrap();

        assert_eq!(leaf.cert.issuer(), root.cert.subject());
        leaf.cert.verify_signed_by(&root.key.public_key()).unwrap();
        assert!(leaf.cert.verify_signed_by(&leaf.key.public_key()).is_err());
        assert!(!leaf.cert.is_self_signed());

        let root_ski: SubjectKeyIdentifier = root.cert.extension().unwrap().unwrap();
        let aki: AuthorityKeyIdentifier = leaf.cert.extension().unwrap().unwrap();
        assert_eq!(aki.key_identifier, Some(root_ski.0));
        let ski: SubjectKeyIdentifier = leaf.cert.extension().unwrap().unwrap();
        assert_eq!(ski.0, leaf.key.public_key().key_identifier());
    }

    #[test]
    fn test_validity_offsets_are_applied() {
        let spec = CertSpec::builder()
            .serial_number(5)
            .not_before_offset(time::Duration::hours(-1))
            .not_after_offset(time::Duration::days(2))
            .subject(vec![SubjectAttribute::new("CN", "window")])
            .build();
        let before = OffsetDateTime::now_utc();
        let signed = sign(&spec, None).unwrap();
        let after = OffsetDateTime::now_utc();

        let not_before = signed.cert.not_before().unwrap();
        let not_after = signed.cert.not_after().unwrap();
        assert!(not_before >= before - time::Duration::hours(1) - time::Duration::seconds(1));
        assert!(not_before <= after - time::Duration::hours(1));
        assert_eq!(
            (not_after - not_before).whole_seconds(),
            time::Duration::days(2).whole_seconds() + 3600
        );
    }

    #[test]
    fn test_out_of_range_offsets_are_generation_errors() {
        for (not_before, not_after) in [
            (time::Duration::ZERO, time::Duration::MAX),
            (time::Duration::MIN, time::Duration::days(1)),
        ] {
            let spec = CertSpec::builder()
                .serial_number(9)
                .not_before_offset(not_before)
                .not_after_offset(not_after)
                .subject(vec![SubjectAttribute::new("CN", "far future")])
                .build();
            assert!(matches!(
                sign(&spec, None),
                Err(ChainKitError::CertGenerationError(_))
            ));
        }
    }

    #[test]
    fn test_extension_order_is_preserved() {
        let spec = CertSpec::for_kind(CertKind::ServerLeaf);
        let signed = sign(&spec, None).unwrap();
        let oids: Vec<_> = signed.cert.extensions().iter().map(|e| e.oid).collect();
        assert_eq!(
            oids,
            vec![
                const_oid::db::rfc5280::ID_CE_BASIC_CONSTRAINTS,
                const_oid::db::rfc5280::ID_CE_KEY_USAGE,
                const_oid::db::rfc5280::ID_CE_EXT_KEY_USAGE,
                const_oid::db::rfc5280::ID_CE_SUBJECT_KEY_IDENTIFIER,
                const_oid::db::rfc5280::ID_CE_AUTHORITY_KEY_IDENTIFIER,
            ]
        );
    }

    #[test]
    fn test_rejected_inputs_are_generation_errors() {
        let bad_extension = CertSpec::builder()
            .serial_number(1)
            .subject(vec![SubjectAttribute::new("CN", "x")])
            .extensions(vec![ExtensionEntry::new("basicConstraints", "CA:PERHAPS")])
            .build();
        let bad_subject = CertSpec::builder()
            .serial_number(1)
            .subject(vec![SubjectAttribute::new("CN", vec![0xff, 0xfe])])
            .build();
        let duplicate = CertSpec::builder()
            .serial_number(1)
            .subject(vec![SubjectAttribute::new("CN", "x")])
            .extensions(vec![
                ExtensionEntry::new("subjectKeyIdentifier", "hash"),
                ExtensionEntry::new("subjectKeyIdentifier", "hash"),
            ])
            .build();
        for spec in [bad_extension, bad_subject, duplicate] {
            assert!(matches!(
                sign(&spec, None),
                Err(ChainKitError::CertGenerationError(_))
            ));
        }
    }
}
