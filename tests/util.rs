#![allow(dead_code)]

use chainkit::cert::SignedCert;
use chainkit::cert::params::{CertKind, CertSpec};
use chainkit::chain::{CertChain, build_chain};
use chainkit::codec::{self, CertAndKeyPem};
use chainkit::issuer::sign;

pub fn generate_root_ca(kind: CertKind) -> SignedCert {
    sign(&CertSpec::for_kind(kind), None).unwrap()
}

/// A single self-signed root in portable form, ready to be passed as an external
/// root authority.
pub fn generate_root_pem(kind: CertKind) -> CertAndKeyPem {
    let chain = build_chain(&[CertSpec::for_kind(kind)], None).unwrap();
    chain.root().unwrap().clone()
}

pub fn decode_all(chain: &CertChain) -> Vec<SignedCert> {
    chain
        .iter()
        .map(|entry| codec::decode(Some(entry)).unwrap().unwrap())
        .collect()
}

/// Writes `contents` under `.debug_certs/` for manual inspection.
pub fn write_debug_file(name: &str, contents: &[u8]) {
    std::fs::create_dir_all(".debug_certs").unwrap();
    std::fs::write(format!(".debug_certs/{name}"), contents).unwrap();
}
