use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::SecretStore;
use crate::types::{CredentialRecord, OtpPayload, PersistentRef};

const RECORDS_DIR: &str = "records";
const ORDER_FILE: &str = "order.json";

/// Filesystem-backed store using one JSON file per record.
///
/// Record files live under `records/`, named by the URL-safe base64 encoding
/// of the record's reference bytes. The reference list is a JSON array at
/// `order.json`, replaced via temp-file rename so readers never observe a
/// partial write. Enumeration sorts by encoded reference, so the relative
/// order of lost records during reconciliation is stable across runs.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Construct a store rooted at `root`. Directories are created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn records_dir(&self) -> PathBuf {
        self.root.join(RECORDS_DIR)
    }

    fn record_path(&self, reference: &PersistentRef) -> PathBuf {
        self.records_dir()
            .join(URL_SAFE_NO_PAD.encode(reference.as_bytes()))
    }

    fn order_path(&self) -> PathBuf {
        self.root.join(ORDER_FILE)
    }

    fn write_json(path: &Path, data: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(Error::storage)?;
        }
        // Write-then-rename keeps the previous content intact if the
        // process dies mid-write.
        let tmp = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp).map_err(Error::storage)?;
        file.write_all(data)
            .and_then(|_| file.sync_all())
            .map_err(Error::storage)?;
        fs::rename(&tmp, path).map_err(Error::storage)
    }

    fn read_record(&self, path: &Path) -> Result<CredentialRecord> {
        let bytes = fs::read(path).map_err(Error::storage)?;
        serde_json::from_slice(&bytes).map_err(Error::storage)
    }
}

impl SecretStore for FileStore {
    fn enumerate(&self) -> Result<Vec<CredentialRecord>> {
        let dir = self.records_dir();
        if !dir.exists() {
            return Ok(vec![]);
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(&dir).map_err(Error::storage)? {
            let entry = entry.map_err(Error::storage)?;
            let path = entry.path();
            if path.extension().map(|ext| ext == "tmp").unwrap_or(false) {
                continue;
            }
            paths.push(path);
        }
        paths.sort();

        let mut records = Vec::with_capacity(paths.len());
        for path in &paths {
            records.push(self.read_record(path)?);
        }
        debug!(count = records.len(), "enumerated records from disk");
        Ok(records)
    }

    fn read_ref_list(&self) -> Result<Vec<PersistentRef>> {
        match fs::read(self.order_path()) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(Error::storage),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(vec![]),
            Err(err) => Err(Error::storage(err)),
        }
    }

    fn write_ref_list(&self, refs: &[PersistentRef]) -> Result<()> {
        let data = serde_json::to_vec(refs).map_err(Error::storage)?;
        Self::write_json(&self.order_path(), &data)
    }

    fn create(&self, payload: OtpPayload) -> Result<CredentialRecord> {
        let reference = PersistentRef::new(Uuid::new_v4().as_bytes().to_vec());
        let record = CredentialRecord::with_reference(reference.clone(), payload);
        let data = serde_json::to_vec(&record).map_err(Error::storage)?;
        Self::write_json(&self.record_path(&reference), &data)?;
        Ok(record)
    }

    fn update(&self, reference: &PersistentRef, payload: OtpPayload) -> Result<()> {
        let path = self.record_path(reference);
        if !path.exists() {
            return Err(Error::NotFound {
                entity: format!("{reference:?}"),
            });
        }
        let record = CredentialRecord::with_reference(reference.clone(), payload);
        let data = serde_json::to_vec(&record).map_err(Error::storage)?;
        Self::write_json(&path, &data)
    }

    fn delete(&self, reference: &PersistentRef) -> Result<()> {
        match fs::remove_file(self.record_path(reference)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound {
                entity: format!("{reference:?}"),
            }),
            Err(err) => Err(Error::storage(err)),
        }
    }
}
