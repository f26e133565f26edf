use crate::cert::SignedCert;
use crate::cert::params::{CertKind, CertSpec, Side, SpecProfile};
use crate::codec::{self, CertAndKeyPem};
use crate::error::{ChainKitError, Result};
use crate::issuer::sign;

/// Certificates of one trust chain in PEM form. Index 0 is the leaf, the last entry
/// is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertChain {
    entries: Vec<CertAndKeyPem>,
}

impl CertChain {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn leaf(&self) -> Option<&CertAndKeyPem> {
        self.entries.first()
    }

    pub fn root(&self) -> Option<&CertAndKeyPem> {
        self.entries.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CertAndKeyPem> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[CertAndKeyPem] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<CertAndKeyPem> {
        self.entries
    }

    /// All certificates concatenated, leaf first.
    pub fn to_bundle(&self) -> Vec<u8> {
        codec::concat_chain(self)
    }
}

impl From<Vec<CertAndKeyPem>> for CertChain {
    fn from(entries: Vec<CertAndKeyPem>) -> Self {
        Self { entries }
    }
}

impl<'a> IntoIterator for &'a CertChain {
    type Item = &'a CertAndKeyPem;
    type IntoIter = std::slice::Iter<'a, CertAndKeyPem>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Signs `specs` (leaf first, root last) into a linked chain.
///
/// Without `root_authority` (or with one whose fields are both empty) the last spec
/// becomes a self-signed root and the chain has `specs.len()` entries. With one, the supplied pair is appended unchanged as the
/// root, signs the last spec, and the chain has `specs.len() + 1` entries. Every other
/// spec is signed by the entry right after it. Nothing is returned unless every
/// certificate was produced.
pub fn build_chain(specs: &[CertSpec], root_authority: Option<&CertAndKeyPem>) -> Result<CertChain> {
    let Some((last, rest)) = specs.split_last() else {
        return Err(ChainKitError::invariant(
            "a chain needs at least one certificate spec",
        ));
    };

    let decoded_root = codec::decode(root_authority)?;
    let external_root = decoded_root.is_some();
    let (mut issuer, mut entries, to_sign): (SignedCert, Vec<CertAndKeyPem>, &[CertSpec]) =
        match decoded_root {
            None => {
                let root = sign(last, None)?;
                let entries = vec![root.to_pem()?];
                (root, entries, rest)
            }
            Some(root) => {
                let entries = root_authority.cloned().into_iter().collect();
                (root, entries, specs)
            }
        };

    for spec in to_sign.iter().rev() {
        let signed = sign(spec, Some(&issuer))?;
        entries.push(signed.to_pem()?);
        issuer = signed;
    }
    entries.reverse();

    tracing::debug!(
        length = entries.len(),
        external_root,
        "assembled certificate chain"
    );
    Ok(CertChain { entries })
}

/// Specs for a chain of `length` certificates on `side`: a leaf at position 0, a root
/// CA at the last position and intermediates in between, each tagged with its
/// distance from the leaf.
pub fn build_chain_spec(length: usize, side: Side) -> Vec<CertSpec> {
    build_chain_spec_with_profile(length, side, &SpecProfile::default())
}

pub fn build_chain_spec_with_profile(
    length: usize,
    side: Side,
    profile: &SpecProfile,
) -> Vec<CertSpec> {
    (0..length)
        .map(|position| {
            let kind = if position == 0 {
                CertKind::leaf(side)
            } else if position == length - 1 {
                CertKind::root_ca(side)
            } else {
                CertKind::intermediate_ca(side, position as u32)
            };
            profile.spec_for(kind)
        })
        .collect()
}

/// Builds a self-signed chain of `length` certificates on `side`. A zero length gives
/// an empty chain.
pub fn generate_chain(length: usize, side: Side) -> Result<CertChain> {
    if length == 0 {
        return Ok(CertChain::default());
    }
    build_chain(&build_chain_spec(length, side), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common_names(specs: &[CertSpec]) -> Vec<String> {
        specs
            .iter()
            .map(|spec| {
                let cn = spec
                    .subject
                    .iter()
                    .find(|a| a.field == "commonName")
                    .unwrap();
                String::from_utf8(cn.value.clone()).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_chain_spec_roles() {
        let specs = build_chain_spec(4, Side::Client);
        assert_eq!(
            common_names(&specs),
            vec![
                "Chainkit Testing Services Client",
                "Chainkit Testing Services Client Intermediate CA 1",
                "Chainkit Testing Services Client Intermediate CA 2",
                "Chainkit Testing Services Client Root CA",
            ]
        );
        assert!(specs[3].extension("authorityKeyIdentifier").is_none());
        assert!(specs[1].extension("authorityKeyIdentifier").is_some());
    }

    #[test]
    fn test_chain_spec_short_lengths() {
        assert!(build_chain_spec(0, Side::Server).is_empty());
        let single = build_chain_spec(1, Side::Server);
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].extension("basicConstraints"), Some("critical, CA:FALSE"));
    }

    #[test]
    fn test_empty_specs_are_rejected() {
        assert!(matches!(
            build_chain(&[], None),
            Err(ChainKitError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_empty_root_authority_builds_self_signed_chain() {
        let empty = CertAndKeyPem {
            cert_pem: String::new(),
            private_key_pem: String::new(),
        };
        let specs = [CertSpec::for_kind(CertKind::ServerLeaf)];
        let chain = build_chain(&specs, Some(&empty)).unwrap();
        assert_eq!(chain.len(), 1);
        let leaf = codec::decode(chain.leaf()).unwrap().unwrap();
        assert!(leaf.cert.is_self_signed());
    }

    #[test]
    fn test_generate_zero_length() {
        assert!(generate_chain(0, Side::Client).unwrap().is_empty());
    }

    #[test]
    fn test_failure_aborts_whole_chain() {
        let mut specs = build_chain_spec(3, Side::Server);
        specs[0]
            .extensions
            .push(crate::cert::params::ExtensionEntry::new("keyUsage", "bogus"));
        assert!(matches!(
            build_chain(&specs, None),
            Err(ChainKitError::CertGenerationError(_))
        ));
    }
}
