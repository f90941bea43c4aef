use tempfile::TempDir;

/// Creates a throwaway directory that doubles as a storage root for tests.
/// The directory is removed when the returned guard drops.
pub fn tmp_data_dir() -> TempDir {
    TempDir::new().expect("failed to create temp data dir")
}
