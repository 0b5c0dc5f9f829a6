//! Pairs exported certificates with exported private keys.
//!
//! A pair matches when the certificate's `SubjectPublicKeyInfo` carries the
//! same RSA modulus as the private key: a direct cryptographic comparison,
//! no trial signing. Matched pairs are copied into `<root>/associated/<n>/`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::der;
use crate::export::Exported;

/// Compares every exported certificate against every exported key and
/// copies matched pairs into numbered `associated/` subdirectories.
/// Returns the matched `(certificate, key)` path pairs.
pub fn associate(root: &Path, exported: &Exported) -> Result<Vec<(PathBuf, PathBuf)>> {
    let keys: Vec<(PathBuf, Vec<u8>)> = exported
        .keys
        .iter()
        .filter_map(|path| {
            let data = fs::read(path).ok()?;
            let modulus = der::private_key_rsa_modulus(&data)?;
            Some((path.clone(), modulus))
        })
        .collect();

    let mut pairs = Vec::new();
    for cert_path in &exported.certificates {
        let data = match fs::read(cert_path) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(path = %cert_path.display(), %err, "unreadable exported cert");
                continue;
            }
        };
        let Some(cert_modulus) = der::certificate_rsa_modulus(&data) else {
            tracing::debug!(path = %cert_path.display(), "no RSA modulus in certificate");
            continue;
        };
        for (key_path, key_modulus) in &keys {
            if *key_modulus == cert_modulus {
                pairs.push((cert_path.clone(), key_path.clone()));
            }
        }
    }

    for (index, (cert_path, key_path)) in pairs.iter().enumerate() {
        let dir = root.join("associated").join((index + 1).to_string());
        fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
        for source in [cert_path, key_path] {
            let name = source.file_name().context("exported path has a file name")?;
            fs::copy(source, dir.join(name))
                .with_context(|| format!("failed to copy {}", source.display()))?;
        }
    }

    Ok(pairs)
}
