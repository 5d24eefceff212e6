//! PEM loading for TLS certificates and keys.
//!
//! The server reads its certificate chain and key; the client reads the CA
//! it trusts. Both go through these functions so errors look the same.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use thiserror::Error;

/// Reads every certificate from a PEM file.
///
/// A file with no certificates in it is an error.
pub fn load_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>, PemError> {
    let certificate_error = |error: String| PemError::Certificate {
        path: path.display().to_string(),
        error,
    };

    let file = File::open(path).map_err(|e| certificate_error(e.to_string()))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| certificate_error(e.to_string()))?;

    if certs.is_empty() {
        return Err(certificate_error("no certificates found".to_string()));
    }
    Ok(certs)
}

/// Reads the first private key from a PEM file.
pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, PemError> {
    let key_error = |error: String| PemError::PrivateKey {
        path: path.display().to_string(),
        error,
    };

    let file = File::open(path).map_err(|e| key_error(e.to_string()))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|e| key_error(e.to_string()))?
        .ok_or_else(|| key_error("no private key found".to_string()))
}

/// Errors from reading PEM files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PemError {
    #[error("Failed to load certificate {path}: {error}")]
    Certificate { path: String, error: String },

    #[error("Failed to load private key {path}: {error}")]
    PrivateKey { path: String, error: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file() {
        let err = load_certificates(Path::new("/nonexistent/ca.pem")).unwrap_err();
        assert!(matches!(err, PemError::Certificate { .. }));
    }

    #[test]
    fn test_file_without_certificates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not a pem file\n").unwrap();
        let err = load_certificates(file.path()).unwrap_err();
        assert!(err.to_string().contains("no certificates found"));
    }

    #[test]
    fn test_file_without_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"# empty\n").unwrap();
        let err = load_private_key(file.path()).unwrap_err();
        assert_eq!(
            err,
            PemError::PrivateKey {
                path: file.path().display().to_string(),
                error: "no private key found".to_string(),
            }
        );
    }
}
