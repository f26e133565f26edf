//! # ChainKit - Synthetic Certificate Chains for TLS Testing
//!
//! ChainKit generates X.509 certificate chains and ECDSA P-256 key pairs for testing
//! TLS-capable components. It is built entirely with rustcrypto libraries: self-signed
//! root authorities, intermediate CAs and server/client leaf certificates, each linked
//! by issuer/subject names, key identifiers and role-specific extension policy.
//!
//! ## Key Features
//!
//! - **Role-based specs**: [`cert::params::CertKind`] turns a chain position into a
//!   declarative [`cert::params::CertSpec`]
//! - **Chain assembly**: leaf-to-root chains with a fresh or an externally supplied root
//! - **Extension grammar**: extensions are written as `name = value` strings, e.g.
//!   `basicConstraints = critical, CA:TRUE`
//! - **Portable output**: PEM certificates and PKCS#8 keys, DER key export, chain
//!   bundles
//!
//! ## Quick Start
//!
//! ### Generating a Server Chain
//!
//! ```rust,no_run
//! use chainkit::{chain, cert::params::Side};
//!
//! # fn main() -> Result<(), chainkit::error::ChainKitError> {
//! // leaf, one intermediate, self-signed root
//! let chain = chain::generate_chain(3, Side::Server)?;
//!
//! let leaf = chain.leaf().unwrap();
//! println!("Leaf certificate:\n{}", leaf.cert_pem);
//!
//! // everything in one file, leaf first
//! std::fs::write("chain.pem", chain.to_bundle()).unwrap();
//! # Ok(())
//! # }
//! ```
//!
//! ### Signing Under an Existing Root
//!
//! ```rust,no_run
//! use chainkit::{
//!     chain::build_chain,
//!     cert::params::{CertKind, CertSpec},
//! };
//!
//! # fn main() -> Result<(), chainkit::error::ChainKitError> {
//! let root = build_chain(&[CertSpec::for_kind(CertKind::ClientRootCA)], None)?;
//! let root_pem = root.root().unwrap();
//!
//! let chain = build_chain(&[CertSpec::for_kind(CertKind::ClientLeaf)], Some(root_pem))?;
//! assert_eq!(chain.len(), 2);
//! assert_eq!(chain.root(), Some(root_pem));
//! # Ok(())
//! # }
//! ```
//!
//! ### Custom Certificate Specs
//!
//! ```rust,no_run
//! use chainkit::{
//!     cert::params::{CertSpec, ExtensionEntry, SubjectAttribute},
//!     issuer::sign,
//! };
//!
//! # fn main() -> Result<(), chainkit::error::ChainKitError> {
//! let spec = CertSpec::builder()
//!     .serial_number(42)
//!     .not_after_offset(time::Duration::days(7))
//!     .subject(vec![SubjectAttribute::new("commonName", "localhost")])
//!     .extensions(vec![
//!         ExtensionEntry::new("basicConstraints", "critical, CA:FALSE"),
//!         ExtensionEntry::new("subjectAltName", "DNS:localhost, IP:127.0.0.1"),
//!         ExtensionEntry::new("subjectKeyIdentifier", "hash"),
//!     ])
//!     .build();
//!
//! let signed = sign(&spec, None)?;
//! println!("{}", signed.to_pem()?.cert_pem);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use chainkit::{codec::{self, CertAndKeyPem}, error::ChainKitError};
//!
//! let pair = CertAndKeyPem { cert_pem: "garbage".into(), private_key_pem: "garbage".into() };
//! match codec::decode(Some(&pair)) {
//!     Ok(_) => println!("decoded"),
//!     Err(ChainKitError::CryptoProviderError(msg)) => println!("Failed to decode: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`key`]: P-256 key generation and import/export
//! - [`cert`]: Certificates, specs, names and extensions
//! - [`issuer`]: Signing a spec into a certificate
//! - [`chain`]: Assembling chains of certificates
//! - [`codec`]: PEM encoding of certificates, keys and chain bundles
//! - [`dump`]: Human readable summaries
//! - [`error`]: Error types
//! - [`tbs_certificate`]: Low-level certificate structure construction

pub mod cert;
pub mod chain;
pub mod codec;
pub mod dump;
pub mod error;
pub mod issuer;
pub mod key;
pub mod tbs_certificate;
