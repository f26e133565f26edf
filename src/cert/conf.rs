//! Text grammar for X.509v3 extensions.
//!
//! An extension is given as a name and a comma separated value, the same shape used by
//! common certificate tooling configuration files:
//!
//! | name                     | value                                                   |
//! |--------------------------|---------------------------------------------------------|
//! | `basicConstraints`       | `[critical,] CA:TRUE\|FALSE [, pathlen:N]`              |
//! | `keyUsage`               | `[critical,] digitalSignature, keyCertSign, ...`        |
//! | `extendedKeyUsage`       | `[critical,] serverAuth, clientAuth, ...`               |
//! | `subjectKeyIdentifier`   | `hash` or `none`                                        |
//! | `authorityKeyIdentifier` | `keyid[:always], issuer[:always]`                       |
//! | `subjectAltName`         | `[critical,] DNS:name, IP:addr, email:addr, URI:uri`    |
//!
//! Identifier extensions are evaluated against an [`IssuerContext`], so the same
//! entry yields different bytes depending on who signs the certificate.

use std::net::IpAddr;

use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;

use super::Certificate;
use super::extensions::{
    AltName, AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, ExtendedKeyUsageOption,
    ExtensionParam, FlagSet, KeyUsage, KeyUsages, SubjectAltName, SubjectKeyIdentifier,
    ToAndFromX509Extension,
};
use crate::error::{ChainKitError, Result};
use crate::key::PublicKey;

/// Whether a part of `authorityKeyIdentifier` is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Directive {
    #[default]
    Off,
    /// Include when available.
    On,
    /// Include unconditionally.
    Always,
}

/// A parsed extension entry, not yet bound to any key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionConf {
    BasicConstraints {
        critical: bool,
        value: BasicConstraints,
    },
    KeyUsage {
        critical: bool,
        value: KeyUsage,
    },
    ExtendedKeyUsage {
        critical: bool,
        value: ExtendedKeyUsage,
    },
    /// `hash` when `enabled`, `none` otherwise.
    SubjectKeyIdentifier { enabled: bool },
    AuthorityKeyIdentifier { keyid: Directive, issuer: Directive },
    SubjectAltName {
        critical: bool,
        value: SubjectAltName,
    },
}

/// Who signs the certificate being built, as seen by extension evaluation.
pub enum IssuerView<'a> {
    /// The certificate signs itself. `extensions` holds what has been produced so far.
    SelfSigned {
        name: &'a Name,
        serial_number: &'a SerialNumber,
        extensions: &'a [Extension],
    },
    Certificate(&'a Certificate),
}

/// Borrowed view handed to extension evaluation for the duration of one signing call.
pub struct IssuerContext<'a> {
    pub subject_key: &'a PublicKey,
    pub issuer: IssuerView<'a>,
}

impl IssuerContext<'_> {
    fn issuer_key_identifier(&self) -> Result<Vec<u8>> {
        let existing = match &self.issuer {
            IssuerView::SelfSigned { extensions, .. } => extensions
                .iter()
                .find(|ext| ext.extn_id == SubjectKeyIdentifier::OID)
                .map(|ext| SubjectKeyIdentifier::from_x509_extension_value(ext.extn_value.as_bytes()))
                .transpose()?,
            IssuerView::Certificate(cert) => cert.extension::<SubjectKeyIdentifier>()?,
        };
        match existing {
            Some(ski) => Ok(ski.0),
            None => match &self.issuer {
                IssuerView::SelfSigned { .. } => Ok(self.subject_key.key_identifier()),
                IssuerView::Certificate(cert) => Ok(cert.public_key()?.key_identifier()),
            },
        }
    }

    /// Name and serial number of the issuer's own certificate.
    fn issuer_identity(&self) -> (Name, Vec<u8>) {
        match &self.issuer {
            IssuerView::SelfSigned {
                name,
                serial_number,
                ..
            } => ((*name).clone(), serial_number.as_bytes().to_vec()),
            IssuerView::Certificate(cert) => (cert.issuer().clone(), cert.serial_number()),
        }
    }
}

fn split_values(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|part| !part.is_empty())
}

/// Splits a leading `critical` marker off the value list.
fn take_critical(value: &str) -> (bool, Vec<&str>) {
    let mut parts: Vec<&str> = split_values(value).collect();
    let critical = parts.first().is_some_and(|p| *p == "critical");
    if critical {
        parts.remove(0);
    }
    (critical, parts)
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_uppercase().as_str() {
        "TRUE" | "YES" | "Y" => Ok(true),
        "FALSE" | "NO" | "N" => Ok(false),
        _ => Err(rejected(name, raw)),
    }
}

fn rejected(name: &str, part: &str) -> ChainKitError {
    ChainKitError::generation(format!("extension `{name}`: unrecognised value `{part}`"))
}

fn forbid_critical(name: &str, critical: bool) -> Result<()> {
    if critical {
        Err(ChainKitError::generation(format!(
            "extension `{name}` must not be critical"
        )))
    } else {
        Ok(())
    }
}

fn key_usage_flag(name: &str) -> Option<KeyUsages> {
    Some(match name {
        "digitalSignature" => KeyUsages::DigitalSignature,
        "nonRepudiation" | "contentCommitment" => KeyUsages::NonRepudiation,
        "keyEncipherment" => KeyUsages::KeyEncipherment,
        "dataEncipherment" => KeyUsages::DataEncipherment,
        "keyAgreement" => KeyUsages::KeyAgreement,
        "keyCertSign" => KeyUsages::KeyCertSign,
        "cRLSign" => KeyUsages::CRLSign,
        "encipherOnly" => KeyUsages::EncipherOnly,
        "decipherOnly" => KeyUsages::DecipherOnly,
        _ => return None,
    })
}

impl ExtensionConf {
    /// Parses one `name = value` entry.
    pub fn parse(name: &str, value: &str) -> Result<Self> {
        match name {
            "basicConstraints" => {
                let (critical, parts) = take_critical(value);
                let mut bc = BasicConstraints::default();
                for part in parts {
                    match part.split_once(':').map(|(k, v)| (k.trim(), v.trim())) {
                        Some(("CA", v)) => bc.is_ca = parse_bool(name, v)?,
                        Some(("pathlen", v)) => {
                            bc.max_path_length = Some(v.parse().map_err(|_| rejected(name, part))?)
                        }
                        _ => return Err(rejected(name, part)),
                    }
                }
                if bc.max_path_length.is_some() && !bc.is_ca {
                    return Err(ChainKitError::generation(
                        "basicConstraints: pathlen requires CA:TRUE",
                    ));
                }
                Ok(ExtensionConf::BasicConstraints {
                    critical,
                    value: bc,
                })
            }
            "keyUsage" => {
                let (critical, parts) = take_critical(value);
                let mut flags: FlagSet<KeyUsages> = FlagSet::default();
                for part in parts {
                    flags |= key_usage_flag(part).ok_or_else(|| rejected(name, part))?;
                }
                if flags.is_empty() {
                    return Err(ChainKitError::generation("keyUsage: no usages given"));
                }
                Ok(ExtensionConf::KeyUsage {
                    critical,
                    value: KeyUsage(flags),
                })
            }
            "extendedKeyUsage" => {
                let (critical, parts) = take_critical(value);
                let usage = parts
                    .into_iter()
                    .map(|part| {
                        ExtendedKeyUsageOption::ALL
                            .into_iter()
                            .find(|option| option.short_name() == part)
                            .ok_or_else(|| rejected(name, part))
                    })
                    .collect::<Result<Vec<_>>>()?;
                if usage.is_empty() {
                    return Err(ChainKitError::generation("extendedKeyUsage: no usages given"));
                }
                Ok(ExtensionConf::ExtendedKeyUsage {
                    critical,
                    value: ExtendedKeyUsage { usage },
                })
            }
            "subjectKeyIdentifier" => {
                let (critical, parts) = take_critical(value);
                forbid_critical(name, critical)?;
                match parts.as_slice() {
                    ["hash"] => Ok(ExtensionConf::SubjectKeyIdentifier { enabled: true }),
                    ["none"] => Ok(ExtensionConf::SubjectKeyIdentifier { enabled: false }),
                    _ => Err(rejected(name, value)),
                }
            }
            "authorityKeyIdentifier" => {
                let (critical, parts) = take_critical(value);
                forbid_critical(name, critical)?;
                let mut keyid = Directive::Off;
                let mut issuer = Directive::Off;
                for part in parts {
                    let (key, always) = match part.split_once(':') {
                        Some((key, "always")) => (key, true),
                        Some(_) => return Err(rejected(name, part)),
                        None => (part, false),
                    };
                    let directive = if always {
                        Directive::Always
                    } else {
                        Directive::On
                    };
                    match key {
                        "keyid" => keyid = directive,
                        "issuer" => issuer = directive,
                        _ => return Err(rejected(name, part)),
                    }
                }
                if keyid == Directive::Off && issuer == Directive::Off {
                    return Err(rejected(name, value));
                }
                Ok(ExtensionConf::AuthorityKeyIdentifier { keyid, issuer })
            }
            "subjectAltName" => {
                let (critical, parts) = take_critical(value);
                let names = parts
                    .into_iter()
                    .map(|part| match part.split_once(':') {
                        Some(("DNS", v)) => Ok(AltName::Dns(v.to_string())),
                        Some(("email", v)) => Ok(AltName::Email(v.to_string())),
                        Some(("URI", v)) => Ok(AltName::Uri(v.to_string())),
                        Some(("IP", v)) => v
                            .parse::<IpAddr>()
                            .map(AltName::Ip)
                            .map_err(|_| rejected(name, part)),
                        _ => Err(rejected(name, part)),
                    })
                    .collect::<Result<Vec<_>>>()?;
                if names.is_empty() {
                    return Err(ChainKitError::generation("subjectAltName: no names given"));
                }
                Ok(ExtensionConf::SubjectAltName {
                    critical,
                    value: SubjectAltName { names },
                })
            }
            other => Err(ChainKitError::generation(format!(
                "unknown extension `{other}`"
            ))),
        }
    }

    /// Produces the DER extension, or `None` when the entry asks for nothing.
    pub fn evaluate(&self, ctx: &IssuerContext<'_>) -> Result<Option<Extension>> {
        let param = match self {
            ExtensionConf::BasicConstraints { critical, value } => {
                ExtensionParam::from_extension(value, *critical)?
            }
            ExtensionConf::KeyUsage { critical, value } => {
                ExtensionParam::from_extension(value, *critical)?
            }
            ExtensionConf::ExtendedKeyUsage { critical, value } => {
                ExtensionParam::from_extension(value, *critical)?
            }
            ExtensionConf::SubjectAltName { critical, value } => {
                ExtensionParam::from_extension(value, *critical)?
            }
            ExtensionConf::SubjectKeyIdentifier { enabled: false } => return Ok(None),
            ExtensionConf::SubjectKeyIdentifier { enabled: true } => {
                let ski = SubjectKeyIdentifier(ctx.subject_key.key_identifier());
                ExtensionParam::from_extension(&ski, false)?
            }
            ExtensionConf::AuthorityKeyIdentifier { keyid, issuer } => {
                let mut aki = AuthorityKeyIdentifier::default();
                if *keyid != Directive::Off {
                    aki.key_identifier = Some(ctx.issuer_key_identifier()?);
                }
                if *issuer == Directive::Always
                    || (*issuer == Directive::On && aki.key_identifier.is_none())
                {
                    let (name, serial) = ctx.issuer_identity();
                    aki.authority_cert_issuer = Some(name);
                    aki.authority_cert_serial_number = Some(serial);
                }
                ExtensionParam::from_extension(&aki, false)?
            }
        };
        Ok(Some(param.to_x509()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::name::build_name;
    use crate::cert::params::SubjectAttribute;
    use crate::key::KeyPair;

    #[test]
    fn test_parse_basic_constraints() {
        assert_eq!(
            ExtensionConf::parse("basicConstraints", "critical, CA:TRUE").unwrap(),
            ExtensionConf::BasicConstraints {
                critical: true,
                value: BasicConstraints {
                    is_ca: true,
                    max_path_length: None
                }
            }
        );
        assert_eq!(
            ExtensionConf::parse("basicConstraints", "CA:true,pathlen:2").unwrap(),
            ExtensionConf::BasicConstraints {
                critical: false,
                value: BasicConstraints {
                    is_ca: true,
                    max_path_length: Some(2)
                }
            }
        );
    }

    #[test]
    fn test_parse_key_usages() {
        let conf =
            ExtensionConf::parse("keyUsage", "critical, digitalSignature, keyCertSign, cRLSign")
                .unwrap();
        assert_eq!(
            conf,
            ExtensionConf::KeyUsage {
                critical: true,
                value: KeyUsage(
                    KeyUsages::DigitalSignature | KeyUsages::KeyCertSign | KeyUsages::CRLSign
                )
            }
        );
        let conf = ExtensionConf::parse("extendedKeyUsage", "serverAuth, clientAuth").unwrap();
        assert_eq!(
            conf,
            ExtensionConf::ExtendedKeyUsage {
                critical: false,
                value: ExtendedKeyUsage {
                    usage: vec![
                        ExtendedKeyUsageOption::ServerAuth,
                        ExtendedKeyUsageOption::ClientAuth
                    ]
                }
            }
        );
    }

    #[test]
    fn test_parse_authority_key_identifier() {
        assert_eq!(
            ExtensionConf::parse("authorityKeyIdentifier", "keyid, issuer").unwrap(),
            ExtensionConf::AuthorityKeyIdentifier {
                keyid: Directive::On,
                issuer: Directive::On
            }
        );
        assert_eq!(
            ExtensionConf::parse("authorityKeyIdentifier", "keyid:always,issuer:always").unwrap(),
            ExtensionConf::AuthorityKeyIdentifier {
                keyid: Directive::Always,
                issuer: Directive::Always
            }
        );
    }

    #[test]
    fn test_rejects_malformed_entries() {
        for (name, value) in [
            ("basicConstraints", "critical, CA:MAYBE"),
            ("basicConstraints", "CA:FALSE, pathlen:1"),
            ("keyUsage", "critical, everything"),
            ("keyUsage", "critical"),
            ("extendedKeyUsage", "serverAuth, mining"),
            ("subjectKeyIdentifier", "md5"),
            ("subjectKeyIdentifier", "critical, hash"),
            ("authorityKeyIdentifier", "keyid:sometimes"),
            ("authorityKeyIdentifier", ""),
            ("subjectAltName", "IP:not-an-ip"),
            ("nameConstraints", "permitted;DNS:example.com"),
        ] {
            assert!(
                matches!(
                    ExtensionConf::parse(name, value),
                    Err(ChainKitError::CertGenerationError(_))
                ),
                "{name} = {value}"
            );
        }
    }

    #[test]
    fn test_self_signed_aki_reuses_pending_ski() {
        let key = KeyPair::generate().unwrap().public_key();
        let name = build_name(&[SubjectAttribute::new("CN", "self")]).unwrap();
        let serial = SerialNumber::new(&[0x2a]).unwrap();

        let ski = ExtensionConf::parse("subjectKeyIdentifier", "hash").unwrap();
        let aki = ExtensionConf::parse("authorityKeyIdentifier", "keyid, issuer").unwrap();

        let mut produced = Vec::new();
        let ctx = IssuerContext {
            subject_key: &key,
            issuer: IssuerView::SelfSigned {
                name: &name,
                serial_number: &serial,
                extensions: &produced,
            },
        };
        let ski_ext = ski.evaluate(&ctx).unwrap().unwrap();
        produced.push(ski_ext);

        let ctx = IssuerContext {
            subject_key: &key,
            issuer: IssuerView::SelfSigned {
                name: &name,
                serial_number: &serial,
                extensions: &produced,
            },
        };
        let aki_ext = aki.evaluate(&ctx).unwrap().unwrap();
        let decoded =
            AuthorityKeyIdentifier::from_x509_extension_value(aki_ext.extn_value.as_bytes())
                .unwrap();
        assert_eq!(decoded.key_identifier, Some(key.key_identifier()));
        assert_eq!(decoded.authority_cert_issuer, None);

        let always = ExtensionConf::parse("authorityKeyIdentifier", "issuer:always").unwrap();
        let ext = always.evaluate(&ctx).unwrap().unwrap();
        let decoded =
            AuthorityKeyIdentifier::from_x509_extension_value(ext.extn_value.as_bytes()).unwrap();
        assert_eq!(decoded.key_identifier, None);
        assert_eq!(decoded.authority_cert_issuer, Some(name.clone()));
        assert_eq!(decoded.authority_cert_serial_number, Some(vec![0x2a]));
    }

    #[test]
    fn test_ski_none_produces_nothing() {
        let key = KeyPair::generate().unwrap().public_key();
        let name = build_name(&[SubjectAttribute::new("CN", "self")]).unwrap();
        let serial = SerialNumber::new(&[1]).unwrap();
        let ctx = IssuerContext {
            subject_key: &key,
            issuer: IssuerView::SelfSigned {
                name: &name,
                serial_number: &serial,
                extensions: &[],
            },
        };
        let conf = ExtensionConf::parse("subjectKeyIdentifier", "none").unwrap();
        assert_eq!(conf.evaluate(&ctx).unwrap(), None);
    }
}
