//! Writes a server chain and a client chain under one shared root to `./certs`.

use std::fs;
use std::path::Path;

use chainkit::cert::params::{CertKind, CertSpec, Side};
use chainkit::chain::{CertChain, build_chain, build_chain_spec};
use chainkit::dump;

fn write_chain(dir: &Path, name: &str, chain: &CertChain) -> std::io::Result<()> {
    fs::write(dir.join(format!("{name}-chain.pem")), chain.to_bundle())?;
    if let Some(leaf) = chain.leaf() {
        fs::write(dir.join(format!("{name}.pem")), &leaf.cert_pem)?;
        fs::write(dir.join(format!("{name}-key.pem")), &leaf.private_key_pem)?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = Path::new("certs");
    fs::create_dir_all(dir)?;

    let root = build_chain(&[CertSpec::for_kind(CertKind::ServerRootCA)], None)?;
    let root_pem = root.root().ok_or("root chain is empty")?;
    fs::write(dir.join("root.pem"), &root_pem.cert_pem)?;

    // leaf and one intermediate under the shared root
    let mut server_specs = build_chain_spec(3, Side::Server);
    server_specs.pop();
    let server = build_chain(&server_specs, Some(root_pem))?;
    write_chain(dir, "server", &server)?;

    let client = build_chain(&[CertSpec::for_kind(CertKind::ClientLeaf)], Some(root_pem))?;
    write_chain(dir, "client", &client)?;

    let mut stdout = std::io::stdout();
    for entry in &server {
        dump::write_cert(&mut stdout, &entry.cert_pem)?;
    }
    if let Some(leaf) = server.leaf() {
        dump::write_private_key(&mut stdout, &leaf.private_key_pem)?;
    }
    Ok(())
}
