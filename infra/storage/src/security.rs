use crate::error::StorageError;
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};

pub(crate) const BLOB_EXTENSION: &str = "blob";

/// Collapse `.` / `..` lexically; any attempt to climb above the root is rejected.
fn normalize_relative(path: &Path) -> Result<PathBuf, StorageError> {
    let mut out = PathBuf::new();

    for c in path.components() {
        match c {
            Component::CurDir => {},
            Component::Normal(seg) => out.push(seg),
            Component::ParentDir => {
                if !out.pop() {
                    return Err(StorageError::InvalidIdentifier {
                        message: path.display().to_string().into(),
                        context: Some("Path attempted to escape sandbox via '..'".into()),
                    });
                }
            },
            Component::RootDir | Component::Prefix(_) => {
                return Err(StorageError::InvalidIdentifier {
                    message: path.display().to_string().into(),
                    context: Some("Absolute paths are not allowed in sandbox".into()),
                });
            },
        }
    }

    Ok(out)
}

/// Joins a relative path to the root and verifies the result stays inside it.
pub(crate) fn resolve_path(root: &Path, path: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
    let safe_rel = normalize_relative(path.as_ref())?;
    let joined = root.join(safe_rel);

    match joined.canonicalize() {
        Ok(canonical) => validate_canonical(root, canonical),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => validate_ancestors(root, &joined),
        Err(e) => Err(StorageError::Io { source: e, context: None }),
    }
}

/// Identifiers up to this many bytes are hex-named, which keeps file names under the
/// common 255-byte limit. Longer identifiers are named by digest.
pub(crate) const MAX_HEX_NAMED_LEN: usize = 120;

const DIGEST_PREFIX: &str = "h_";

/// How a blob file name maps back to its identifier.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum BlobName {
    /// Hex-encoded identifier.
    Encoded(String),
    /// `h_<sha256>`; the identifier is in the record header.
    Digest,
}

/// Maps an object identifier to `<root>/<s0>/<s1>/<name>.blob`.
///
/// Hex encoding keeps arbitrary identifiers (slashes, colons, unicode) out of path syntax.
pub(crate) fn object_path(root: &Path, id: &str) -> Result<PathBuf, StorageError> {
    let name = if id.len() <= MAX_HEX_NAMED_LEN {
        hex::encode(id.as_bytes())
    } else {
        format!("{DIGEST_PREFIX}{}", hex::encode(Sha256::digest(id.as_bytes())))
    };
    let shard = name.strip_prefix(DIGEST_PREFIX).unwrap_or(&name);

    let mut rel = PathBuf::new();
    if shard.len() >= 4 {
        rel.push(&shard[0..2]);
        rel.push(&shard[2..4]);
    }
    rel.push(format!("{name}.{BLOB_EXTENSION}"));

    resolve_path(root, rel)
}

/// Classifies a blob file name, ignoring foreign files.
pub(crate) fn blob_name(path: &Path) -> Option<BlobName> {
    if path.extension().and_then(|e| e.to_str()) != Some(BLOB_EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if let Some(digest) = stem.strip_prefix(DIGEST_PREFIX) {
        let valid = digest.len() == 64 && digest.bytes().all(|b| b.is_ascii_hexdigit());
        return valid.then_some(BlobName::Digest);
    }
    let bytes = hex::decode(stem).ok()?;
    String::from_utf8(bytes).ok().map(BlobName::Encoded)
}

fn validate_canonical(root: &Path, canonical: PathBuf) -> Result<PathBuf, StorageError> {
    if canonical.starts_with(root) {
        Ok(canonical)
    } else {
        Err(StorageError::InvalidIdentifier {
            message: canonical.display().to_string().into(),
            context: Some("Resolved path is outside the sandbox".into()),
        })
    }
}

/// Validates a path that doesn't exist yet through its first existing ancestor,
/// which must canonicalize inside the root (symlinked shard directories are refused).
fn validate_ancestors(root: &Path, joined: &Path) -> Result<PathBuf, StorageError> {
    let mut current = Some(joined);

    while let Some(path) = current {
        if path == root {
            return Ok(joined.to_path_buf());
        }

        if path.exists() {
            return match path.canonicalize() {
                Ok(canonical) if canonical.starts_with(root) => Ok(joined.to_path_buf()),
                Ok(canonical) => Err(StorageError::InvalidIdentifier {
                    message: canonical.display().to_string().into(),
                    context: Some("Existing parent directory is a symlink outside sandbox".into()),
                }),
                Err(e) => Err(StorageError::Io {
                    source: e,
                    context: Some("Failed to verify parent directory".into()),
                }),
            };
        }

        current = path.parent();
    }

    Err(StorageError::InvalidIdentifier {
        message: joined.display().to_string().into(),
        context: Some("No valid parent directory found within sandbox".into()),
    })
}
