use std::{
    fs,
    io::{BufRead, BufReader},
    path::Path,
};

use md5::Md5;
use sha2::{Digest, Sha256};

use crate::errors::Result;

/// Digest algorithms offered by file probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algo {
    Md5,
    Sha256,
}

/// Streams the file at `path` through `algo` and returns the
/// lowercase hex encoding of the digest.
///
/// The handle is scoped to this call and closed on every exit
/// path. Output depends on byte content only, never on metadata.
pub fn hash_file<P: AsRef<Path>>(path: P, algo: Algo) -> Result<String> {
    log::debug!(
        "computing {:?} digest of {:?}",
        algo,
        path.as_ref()
    );

    let file = fs::File::open(path.as_ref())?;
    let mut reader = BufReader::new(file);
    match algo {
        Algo::Md5 => stream(&mut reader, Md5::new()),
        Algo::Sha256 => stream(&mut reader, Sha256::new()),
    }
}

fn stream<R: BufRead, D: Digest>(
    reader: &mut R,
    mut hasher: D,
) -> Result<String> {
    loop {
        let consumed = {
            let chunk = reader.fill_buf()?;
            if chunk.is_empty() {
                break;
            }
            hasher.update(chunk);
            chunk.len()
        };
        reader.consume(consumed);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    fn fixture(dir: &TempDir, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join("fixture");
        fs::File::create(&path)
            .unwrap()
            .write_all(content)
            .unwrap();
        path
    }

    #[rstest]
    #[case(Algo::Md5, "5eb63bbbe01eeed093cb22bb8f5acdc3")]
    #[case(
        Algo::Sha256,
        "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    )]
    fn known_vectors(#[case] algo: Algo, #[case] expected: &str) {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, b"hello world");
        assert_eq!(hash_file(&path, algo).unwrap(), expected);
    }

    #[test]
    fn digest_is_deterministic_and_content_sensitive() {
        let dir = TempDir::new().unwrap();
        let path = fixture(&dir, b"hello world");
        let first = hash_file(&path, Algo::Sha256).unwrap();
        let second = hash_file(&path, Algo::Sha256).unwrap();
        assert_eq!(first, second);

        let changed = fixture(&dir, b"hello worle");
        assert_ne!(
            hash_file(&changed, Algo::Sha256).unwrap(),
            first
        );
    }

    #[test]
    fn missing_file_propagates_open_error() {
        let dir = TempDir::new().unwrap();
        let err = hash_file(dir.path().join("absent"), Algo::Md5)
            .unwrap_err();
        assert!(err.to_string().contains("IO error"));
    }
}
