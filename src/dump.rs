//! Human readable summaries of PEM certificates and private keys.
//!
//! Private scalars are never written; a key summary shows the public point only.

use std::io::Write;

use crate::cert::Certificate;
use crate::cert::extensions::{
    AltName, AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, ExtensionParam,
    KeyUsage, SubjectAltName, SubjectKeyIdentifier, ToAndFromX509Extension,
};
use crate::error::{ChainKitError, Result};
use crate::key::KeyPair;

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

fn io_error(err: std::io::Error) -> ChainKitError {
    ChainKitError::provider(format!("failed to write summary: {err}"))
}

fn describe_extension(ext: &ExtensionParam) -> Result<(&'static str, String)> {
    Ok(match ext.oid {
        oid if oid == BasicConstraints::OID => {
            let bc: BasicConstraints = ext.to_extension()?;
            let mut text = format!("CA:{}", if bc.is_ca { "TRUE" } else { "FALSE" });
            if let Some(len) = bc.max_path_length {
                text.push_str(&format!(", pathlen:{len}"));
            }
            ("X509v3 Basic Constraints", text)
        }
        oid if oid == KeyUsage::OID => {
            let ku: KeyUsage = ext.to_extension()?;
            let names: Vec<String> = ku.0.into_iter().map(|flag| format!("{flag:?}")).collect();
            ("X509v3 Key Usage", names.join(", "))
        }
        oid if oid == ExtendedKeyUsage::OID => {
            let eku: ExtendedKeyUsage = ext.to_extension()?;
            let names: Vec<&str> = eku.usage.iter().map(|u| u.short_name()).collect();
            ("X509v3 Extended Key Usage", names.join(", "))
        }
        oid if oid == SubjectKeyIdentifier::OID => {
            let ski: SubjectKeyIdentifier = ext.to_extension()?;
            ("X509v3 Subject Key Identifier", hex(&ski.0))
        }
        oid if oid == AuthorityKeyIdentifier::OID => {
            let aki: AuthorityKeyIdentifier = ext.to_extension()?;
            let mut parts = Vec::new();
            if let Some(id) = &aki.key_identifier {
                parts.push(format!("keyid:{}", hex(id)));
            }
            if let Some(name) = &aki.authority_cert_issuer {
                parts.push(format!("DirName:{name}"));
            }
            if let Some(serial) = &aki.authority_cert_serial_number {
                parts.push(format!("serial:{}", hex(serial)));
            }
            ("X509v3 Authority Key Identifier", parts.join(", "))
        }
        oid if oid == SubjectAltName::OID => {
            let san: SubjectAltName = ext.to_extension()?;
            let names: Vec<String> = san
                .names
                .iter()
                .map(|name| match name {
                    AltName::Dns(v) => format!("DNS:{v}"),
                    AltName::Ip(v) => format!("IP:{v}"),
                    AltName::Email(v) => format!("email:{v}"),
                    AltName::Uri(v) => format!("URI:{v}"),
                })
                .collect();
            ("X509v3 Subject Alternative Name", names.join(", "))
        }
        _ => ("Unknown extension", hex(&ext.value)),
    })
}

/// Writes a summary of `cert_pem` to `out`.
pub fn write_cert<W: Write>(out: &mut W, cert_pem: &str) -> Result<()> {
    let cert = Certificate::from_pem(cert_pem)?;
    let public_key = cert.public_key()?;
    let tbs = &cert.inner.tbs_certificate;

    let mut text = String::new();
    text.push_str("Certificate:\n");
    text.push_str(&format!("    Version: {:?}\n", tbs.version));
    match cert.serial_u64() {
        Some(serial) => text.push_str(&format!("    Serial Number: {serial}\n")),
        None => text.push_str(&format!("    Serial Number: {}\n", hex(&cert.serial_number()))),
    }
    text.push_str("    Signature Algorithm: ecdsa-with-SHA256\n");
    text.push_str(&format!("    Issuer: {}\n", cert.issuer()));
    text.push_str(&format!("    Not Before: {}\n", cert.not_before()?));
    text.push_str(&format!("    Not After : {}\n", cert.not_after()?));
    text.push_str(&format!("    Subject: {}\n", cert.subject()));
    text.push_str("    Public Key: id-ecPublicKey (P-256)\n");
    text.push_str(&format!("        pub: {}\n", hex(&public_key.to_sec1_bytes())));
    let extensions = cert.extensions();
    if !extensions.is_empty() {
        text.push_str("    X509v3 extensions:\n");
        for ext in &extensions {
            let (label, value) = describe_extension(ext)?;
            let critical = if ext.critical { " critical" } else { "" };
            text.push_str(&format!("        {label}:{critical}\n            {value}\n"));
        }
    }
    out.write_all(text.as_bytes()).map_err(io_error)
}

/// Writes the public half of `private_key_pem` to `out`.
pub fn write_private_key<W: Write>(out: &mut W, private_key_pem: &str) -> Result<()> {
    let public_key = KeyPair::from_pem(private_key_pem)?.public_key();
    let text = format!(
        "Private-Key: (256 bit)\npriv: <not shown>\npub: {}\nkeyid: {}\nASN1 OID: prime256v1\nNIST CURVE: P-256\n",
        hex(&public_key.to_sec1_bytes()),
        hex(&public_key.key_identifier()),
    );
    out.write_all(text.as_bytes()).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::params::{CertKind, CertSpec};
    use crate::issuer::sign;

    #[test]
    fn test_cert_summary() {
        let spec = CertSpec::for_kind(CertKind::ServerLeaf);
        let pem = sign(&spec, None).unwrap().to_pem().unwrap();
        let mut out = Vec::new();
        write_cert(&mut out, &pem.cert_pem).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(&format!("Serial Number: {}", spec.serial_number)));
        assert!(text.contains("Chainkit Testing Services Server"));
        assert!(text.contains("X509v3 Basic Constraints: critical\n            CA:FALSE"));
        assert!(text.contains("serverAuth, clientAuth"));
    }

    #[test]
    fn test_key_summary_hides_scalar() {
        let key = KeyPair::generate().unwrap();
        let pem = key.to_pkcs8_pem().unwrap();
        let mut out = Vec::new();
        write_private_key(&mut out, &pem).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(&hex(&key.public_key().to_sec1_bytes())));
        assert!(!text.contains(&hex(&key.signing_key().to_bytes())));
    }
}
