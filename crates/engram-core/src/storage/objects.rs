use git2::{Oid, Repository};
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Serialize a record to pretty JSON and write it as a blob.
pub fn write_json_blob<T: serde::Serialize>(repo: &Repository, value: &T) -> Result<Oid, CoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let oid = repo
        .blob(&bytes)
        .map_err(|e| CoreError::StorageWriteFailure(e.to_string()))?;
    Ok(oid)
}

/// Read a blob back into a typed record.
pub fn read_json_blob<T: serde::de::DeserializeOwned>(
    repo: &Repository,
    oid: Oid,
) -> Result<T, CoreError> {
    let blob = repo.find_blob(oid)?;
    Ok(serde_json::from_slice(blob.content())?)
}

/// SHA-256 of a serialized payload, hex encoded. Used to detect
/// byte-identical duplicate creation against the same explicit id.
pub fn content_hash<T: serde::Serialize>(value: &T) -> Result<String, CoreError> {
    let bytes = serde_json::to_vec(value)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{digest:x}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_blob_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let repo = Repository::init(tmp.path()).unwrap();

        let value = vec!["a".to_string(), "b".to_string()];
        let oid = write_json_blob(&repo, &value).unwrap();
        let loaded: Vec<String> = read_json_blob(&repo, oid).unwrap();
        assert_eq!(value, loaded);
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = content_hash(&("x", 1)).unwrap();
        let b = content_hash(&("x", 1)).unwrap();
        let c = content_hash(&("x", 2)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
