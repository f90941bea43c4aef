use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Storage, StoreError};

/// One kind of persisted row. Each implementor owns a named collection in
/// the durable key space; the collection is always read and written as the
/// full array of rows.
pub trait Record: Clone + Serialize + DeserializeOwned {
    const COLLECTION: &'static str;

    fn id(&self) -> Uuid;
}

impl Storage {
    /// Loads the full collection. A collection that has never been written
    /// reads back empty.
    pub fn load_all<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        let path = self.collection_path(R::COLLECTION);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    /// Rewrites the full collection. The document is staged next to its
    /// final path and moved into place so readers never observe a torn
    /// write.
    pub fn persist_all<R: Record>(&self, rows: &[R]) -> Result<(), StoreError> {
        let path = self.collection_path(R::COLLECTION);
        let staged = path.with_extension("json.tmp");
        let raw = serde_json::to_string_pretty(rows)?;
        std::fs::write(&staged, raw)?;
        std::fs::rename(&staged, &path)?;
        Ok(())
    }

    pub fn find_by_id<R: Record>(&self, id: Uuid) -> Result<Option<R>, StoreError> {
        let rows = self.load_all::<R>()?;
        Ok(rows.into_iter().find(|row| row.id() == id))
    }

    pub fn insert<R: Record>(&self, row: R) -> Result<R, StoreError> {
        let mut rows = self.load_all::<R>()?;
        rows.push(row.clone());
        self.persist_all(&rows)?;
        Ok(row)
    }

    /// Replaces the row with the same id. An absent id is a quiet miss: no
    /// rows match, nothing is written, and `None` is returned.
    pub fn replace<R: Record>(&self, row: R) -> Result<Option<R>, StoreError> {
        let mut rows = self.load_all::<R>()?;
        let Some(slot) = rows.iter_mut().find(|existing| existing.id() == row.id()) else {
            tracing::debug!(
                collection = R::COLLECTION,
                id = %row.id(),
                "replace matched no rows"
            );
            return Ok(None);
        };
        *slot = row.clone();
        self.persist_all(&rows)?;
        Ok(Some(row))
    }

    /// Removes the row with the given id, reporting how many rows went
    /// away. An absent id removes nothing.
    pub fn remove<R: Record>(&self, id: Uuid) -> Result<u64, StoreError> {
        let mut rows = self.load_all::<R>()?;
        let before = rows.len();
        rows.retain(|row| row.id() != id);
        if rows.len() == before {
            return Ok(0);
        }
        self.persist_all(&rows)?;
        Ok((before - rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Probe {
        id: Uuid,
        label: String,
        created_at: DateTime<Utc>,
    }

    impl Record for Probe {
        const COLLECTION: &'static str = "probes";

        fn id(&self) -> Uuid {
            self.id
        }
    }

    fn probe(label: &str) -> Probe {
        Probe {
            id: Uuid::new_v4(),
            label: label.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn unwritten_collection_reads_back_empty() {
        let dir = test_support::tmp_data_dir();
        let storage = Storage::open(dir.path()).unwrap();

        let rows: Vec<Probe> = storage.load_all().unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn round_trip_preserves_every_field() {
        let dir = test_support::tmp_data_dir();
        let storage = Storage::open(dir.path()).unwrap();

        let first = storage.insert(probe("first")).unwrap();
        let second = storage.insert(probe("second")).unwrap();

        // Reopen from the same root to force a fresh read of the document.
        let reopened = Storage::open(dir.path()).unwrap();
        let rows: Vec<Probe> = reopened.load_all().unwrap();
        assert_eq!(rows, vec![first.clone(), second]);
        assert_eq!(rows[0].created_at, first.created_at);
    }

    #[test]
    fn replace_of_absent_id_is_a_quiet_miss() {
        let dir = test_support::tmp_data_dir();
        let storage = Storage::open(dir.path()).unwrap();

        storage.insert(probe("kept")).unwrap();
        let ghost = probe("ghost");
        assert!(storage.replace(ghost).unwrap().is_none());

        let rows: Vec<Probe> = storage.load_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "kept");
    }

    #[test]
    fn remove_reports_affected_rows() {
        let dir = test_support::tmp_data_dir();
        let storage = Storage::open(dir.path()).unwrap();

        let row = storage.insert(probe("doomed")).unwrap();
        assert_eq!(storage.remove::<Probe>(row.id).unwrap(), 1);
        assert_eq!(storage.remove::<Probe>(row.id).unwrap(), 0);
    }

    #[test]
    fn rapid_creation_yields_unique_ids() {
        let dir = test_support::tmp_data_dir();
        let storage = Storage::open(dir.path()).unwrap();

        let mut seen = std::collections::HashSet::new();
        for n in 0..200 {
            let row = storage.insert(probe(&format!("probe-{n}"))).unwrap();
            assert!(seen.insert(row.id));
        }
    }
}
