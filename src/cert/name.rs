use std::str::FromStr;

use const_oid::ObjectIdentifier;
use der::asn1::{Any, Ia5StringRef, PrintableStringRef, SetOfVec};
use der::Tag;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use super::params::SubjectAttribute;
use crate::error::{ChainKitError, Result};

const COUNTRY_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
const STATE_OR_PROVINCE_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
const LOCALITY_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
const ORGANIZATION_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
const ORGANIZATIONAL_UNIT_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
const COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
const SERIAL_NUMBER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.5");
const EMAIL_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");

/// String type an attribute value is encoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Printable,
    Ia5,
    Utf8,
}

/// Long name, short name, OID and value encoding of every attribute the subject
/// builder knows by name.
const FIELDS: &[(&str, &str, ObjectIdentifier, ValueKind)] = &[
    ("countryName", "C", COUNTRY_NAME, ValueKind::Printable),
    ("stateOrProvinceName", "ST", STATE_OR_PROVINCE_NAME, ValueKind::Utf8),
    ("localityName", "L", LOCALITY_NAME, ValueKind::Utf8),
    ("organizationName", "O", ORGANIZATION_NAME, ValueKind::Utf8),
    ("organizationalUnitName", "OU", ORGANIZATIONAL_UNIT_NAME, ValueKind::Utf8),
    ("commonName", "CN", COMMON_NAME, ValueKind::Utf8),
    ("serialNumber", "serialNumber", SERIAL_NUMBER, ValueKind::Printable),
    ("emailAddress", "emailAddress", EMAIL_ADDRESS, ValueKind::Ia5),
];

fn lookup(field: &str) -> Result<(ObjectIdentifier, ValueKind)> {
    if let Some((_, _, oid, kind)) = FIELDS
        .iter()
        .find(|(long, short, _, _)| *long == field || *short == field)
    {
        return Ok((*oid, *kind));
    }
    ObjectIdentifier::from_str(field)
        .map(|oid| (oid, ValueKind::Utf8))
        .map_err(|_| ChainKitError::generation(format!("unknown subject field `{field}`")))
}

fn encode_value(field: &str, kind: ValueKind, oid: ObjectIdentifier, bytes: &[u8]) -> Result<Any> {
    if bytes.is_empty() {
        return Err(ChainKitError::generation(format!(
            "subject field `{field}` is empty"
        )));
    }
    let text = std::str::from_utf8(bytes)
        .ok()
        .filter(|s| s.is_ascii())
        .ok_or_else(|| {
            ChainKitError::generation(format!("subject field `{field}` is not ASCII"))
        })?;
    if oid == COUNTRY_NAME && text.len() != 2 {
        return Err(ChainKitError::generation(format!(
            "countryName must be two letters, got `{text}`"
        )));
    }
    let invalid = |e: der::Error| {
        ChainKitError::generation(format!("subject field `{field}` rejected: {e}"))
    };
    match kind {
        ValueKind::Printable => {
            PrintableStringRef::new(text).map_err(invalid)?;
            Any::new(Tag::PrintableString, bytes).map_err(invalid)
        }
        ValueKind::Ia5 => {
            Ia5StringRef::new(text).map_err(invalid)?;
            Any::new(Tag::Ia5String, bytes).map_err(invalid)
        }
        ValueKind::Utf8 => Any::new(Tag::Utf8String, bytes).map_err(invalid),
    }
}

/// Builds a name with one single-valued RDN per attribute, in the given order.
pub fn build_name(attributes: &[SubjectAttribute]) -> Result<Name> {
    let mut rdns = Vec::with_capacity(attributes.len());
    for attribute in attributes {
        let (oid, kind) = lookup(&attribute.field)?;
        let value = encode_value(&attribute.field, kind, oid, &attribute.value)?;
        let mut set = SetOfVec::new();
        set.insert(AttributeTypeAndValue { oid, value })
            .map_err(|e| ChainKitError::generation(e.to_string()))?;
        rdns.push(RelativeDistinguishedName::from(set));
    }
    Ok(RdnSequence(rdns))
}

/// Returns the first common name of `name`, if it has one.
pub fn common_name(name: &Name) -> Option<String> {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .find(|atv| atv.oid == COMMON_NAME)
        .and_then(|atv| std::str::from_utf8(atv.value.value()).ok())
        .map(str::to_string)
}
