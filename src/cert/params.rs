use bon::Builder;
use rand::Rng;
use time::Duration;

/// One subject name component, e.g. `("commonName", b"example")`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectAttribute {
    pub field: String,
    pub value: Vec<u8>,
}

impl SubjectAttribute {
    pub fn new(field: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// One extension in configuration syntax, e.g. `("basicConstraints", "critical, CA:TRUE")`.
///
/// See [`crate::cert::conf`] for the accepted names and values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionEntry {
    pub name: String,
    pub value: String,
}

impl ExtensionEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Declarative description of one certificate to be issued.
///
/// Holds no key material. Offsets are relative to the moment the certificate is
/// signed.
///
/// # Fields
/// * `serial_number` - The certificate serial number.
/// * `not_before_offset` - Start of validity relative to signing time.
/// * `not_after_offset` - End of validity relative to signing time.
/// * `subject` - Subject name components, in order.
/// * `extensions` - X.509v3 extensions, applied in order.
#[derive(Clone, Debug, PartialEq, Eq, Builder)]
pub struct CertSpec {
    pub serial_number: u64,
    #[builder(default = Duration::ZERO)]
    pub not_before_offset: Duration,
    #[builder(default = DEFAULT_VALIDITY)]
    pub not_after_offset: Duration,
    #[builder(default)]
    pub subject: Vec<SubjectAttribute>,
    #[builder(default)]
    pub extensions: Vec<ExtensionEntry>,
}

impl CertSpec {
    /// Builds the spec for `kind` with the default [`SpecProfile`].
    pub fn for_kind(kind: CertKind) -> Self {
        SpecProfile::default().spec_for(kind)
    }

    /// Returns the value of the first extension called `name`.
    pub fn extension(&self, name: &str) -> Option<&str> {
        self.extensions
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value.as_str())
    }
}

/// Which end of a TLS connection a chain authenticates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Server,
    Client,
}

/// Role of a certificate within a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CertKind {
    ServerLeaf,
    ClientLeaf,
    ServerRootCA,
    ClientRootCA,
    /// `depth` is the distance from the leaf.
    ServerIntermediateCA {
        depth: u32,
    },
    ClientIntermediateCA {
        depth: u32,
    },
}

impl CertKind {
    pub fn leaf(side: Side) -> Self {
        match side {
            Side::Server => CertKind::ServerLeaf,
            Side::Client => CertKind::ClientLeaf,
        }
    }

    pub fn root_ca(side: Side) -> Self {
        match side {
            Side::Server => CertKind::ServerRootCA,
            Side::Client => CertKind::ClientRootCA,
        }
    }

    pub fn intermediate_ca(side: Side, depth: u32) -> Self {
        match side {
            Side::Server => CertKind::ServerIntermediateCA { depth },
            Side::Client => CertKind::ClientIntermediateCA { depth },
        }
    }

    pub fn side(&self) -> Side {
        match self {
            CertKind::ServerLeaf
            | CertKind::ServerRootCA
            | CertKind::ServerIntermediateCA { .. } => Side::Server,
            CertKind::ClientLeaf
            | CertKind::ClientRootCA
            | CertKind::ClientIntermediateCA { .. } => Side::Client,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, CertKind::ServerLeaf | CertKind::ClientLeaf)
    }

    pub fn is_ca(&self) -> bool {
        !self.is_leaf()
    }

    pub fn is_root_ca(&self) -> bool {
        matches!(self, CertKind::ServerRootCA | CertKind::ClientRootCA)
    }

    /// Common name for this role, unique per role and intermediate depth.
    pub fn common_name(&self, prefix: &str) -> String {
        let side = match self.side() {
            Side::Server => "Server",
            Side::Client => "Client",
        };
        match self {
            CertKind::ServerLeaf | CertKind::ClientLeaf => format!("{prefix} {side}"),
            CertKind::ServerRootCA | CertKind::ClientRootCA => format!("{prefix} {side} Root CA"),
            CertKind::ServerIntermediateCA { depth } | CertKind::ClientIntermediateCA { depth } => {
                format!("{prefix} {side} Intermediate CA {depth}")
            }
        }
    }
}

const DEFAULT_VALIDITY: Duration = Duration::days(365);
const DEFAULT_SERIAL_UPPER_BOUND: u64 = 10_000_000_000;

/// Subject defaults and numeric policy used when turning a [`CertKind`] into a
/// [`CertSpec`].
#[derive(Clone, Debug, Builder)]
pub struct SpecProfile {
    #[builder(into, default = "US".to_string())]
    pub country: String,
    #[builder(into, default = "San Francisco".to_string())]
    pub locality: String,
    #[builder(into, default = "Chainkit".to_string())]
    pub organization: String,
    #[builder(into, default = "Chainkit Testing Services".to_string())]
    pub common_name_prefix: String,
    #[builder(default = DEFAULT_VALIDITY)]
    pub validity: Duration,
    /// Serial numbers are drawn from `[0, serial_upper_bound)`.
    #[builder(default = DEFAULT_SERIAL_UPPER_BOUND)]
    pub serial_upper_bound: u64,
}

impl Default for SpecProfile {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SpecProfile {
    pub fn spec_for(&self, kind: CertKind) -> CertSpec {
        self.spec_for_with_rng(kind, &mut rand::rng())
    }

    /// Same as [`SpecProfile::spec_for`] with an explicit randomness source for the
    /// serial number. Serials are not checked for collisions.
    pub fn spec_for_with_rng<R: Rng>(&self, kind: CertKind, rng: &mut R) -> CertSpec {
        let serial_number = rng.random_range(0..self.serial_upper_bound.max(1));

        let subject = vec![
            SubjectAttribute::new("countryName", self.country.as_str()),
            SubjectAttribute::new("localityName", self.locality.as_str()),
            SubjectAttribute::new("organizationName", self.organization.as_str()),
            SubjectAttribute::new("commonName", kind.common_name(&self.common_name_prefix)),
        ];

        let mut extensions = if kind.is_ca() {
            vec![
                ExtensionEntry::new("basicConstraints", "critical, CA:TRUE"),
                ExtensionEntry::new("keyUsage", "critical, digitalSignature, keyCertSign, cRLSign"),
            ]
        } else {
            vec![
                ExtensionEntry::new("basicConstraints", "critical, CA:FALSE"),
                ExtensionEntry::new("keyUsage", "critical, digitalSignature, keyEncipherment"),
                ExtensionEntry::new("extendedKeyUsage", "serverAuth, clientAuth"),
            ]
        };
        extensions.push(ExtensionEntry::new("subjectKeyIdentifier", "hash"));
        if !kind.is_root_ca() {
            extensions.push(ExtensionEntry::new("authorityKeyIdentifier", "keyid, issuer"));
        }

        CertSpec {
            serial_number,
            not_before_offset: Duration::ZERO,
            not_after_offset: self.validity,
            subject,
            extensions,
        }
    }
}
