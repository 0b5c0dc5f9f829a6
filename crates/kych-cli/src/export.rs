//! On-disk export of recovered certificates and private keys.
//!
//! The export root is an explicit argument: no process-global paths.
//! Certificates land in `<root>/certs/<N>.crt` (DER as stored) and
//! recovered private keys in `<root>/keys/<N>.key` (unwrapped material).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kych::Dump;

/// Paths written by one export pass.
#[derive(Debug, Default)]
pub struct Exported {
    pub certificates: Vec<PathBuf>,
    pub keys: Vec<PathBuf>,
}

/// Writes every certificate and every recovered private key under `root`.
pub fn write(root: &Path, dump: &Dump) -> Result<Exported> {
    let mut exported = Exported::default();

    let certs_dir = root.join("certs");
    for (index, record) in dump.certificates.iter().enumerate() {
        if record.certificate.is_empty() {
            continue;
        }
        fs::create_dir_all(&certs_dir)
            .with_context(|| format!("failed to create {}", certs_dir.display()))?;
        let path = certs_dir.join(format!("{}.crt", index + 1));
        fs::write(&path, &record.certificate)
            .with_context(|| format!("failed to write {}", path.display()))?;
        exported.certificates.push(path);
    }

    let keys_dir = root.join("keys");
    for (index, record) in dump.private_keys.iter().enumerate() {
        let Some(material) = &record.key_material else {
            continue;
        };
        fs::create_dir_all(&keys_dir)
            .with_context(|| format!("failed to create {}", keys_dir.display()))?;
        let path = keys_dir.join(format!("{}.key", index + 1));
        fs::write(&path, material.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
        exported.keys.push(path);
    }

    Ok(exported)
}
