use botan::Certificate as BotanCertificate;

use chainkit::cert::params::{CertKind, CertSpec, Side};
use chainkit::chain::generate_chain;
use chainkit::issuer::sign;
use chainkit::key::KeyPair;

fn check_cert(cert_der: &[u8]) {
    // Use botan crate to parse the DER and assert it succeeds
    BotanCertificate::load(cert_der).expect("Botan failed to parse certificate");
}

#[test]
#[ignore]
fn test_botan_self_signed_leaf() {
    let signed = sign(&CertSpec::for_kind(CertKind::ServerLeaf), None).unwrap();
    check_cert(&signed.cert.to_der().unwrap());
}

#[test]
#[ignore]
fn test_botan_chain() {
    let chain = generate_chain(3, Side::Client).unwrap();
    for entry in &chain {
        BotanCertificate::load(entry.cert_pem.as_bytes()).expect("Botan failed to parse PEM");
    }
}

#[test]
#[ignore]
fn test_botan_private_key() {
    let key = KeyPair::generate().unwrap();
    let der = key.to_der().unwrap();
    botan::Pubkey::load_der(&der.public_key_der).expect("Botan failed to parse public key");
    botan::Privkey::load_pem(&key.to_pkcs8_pem().unwrap()).expect("Botan failed to parse private key");
}
