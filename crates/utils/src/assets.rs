use directories::ProjectDirs;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");
const DATA_DIR_ENV: &str = "WORKHUB_DATA_DIR";

/// Root of the durable key space. Resolution order: explicit env
/// override, a repo-local `dev_assets` folder in debug builds, then the
/// platform data directory.
pub fn data_dir() -> std::path::PathBuf {
    if let Ok(override_dir) = std::env::var(DATA_DIR_ENV) {
        let override_dir = override_dir.trim();
        if !override_dir.is_empty() {
            let path = std::path::PathBuf::from(override_dir);
            ensure_exists(&path);
            return path;
        }
    }

    let path = if cfg!(debug_assertions) {
        std::path::PathBuf::from(PROJECT_ROOT).join("../../dev_assets")
    } else {
        ProjectDirs::from("dev", "workhub", "workhub")
            .expect("OS didn't give us a home directory")
            .data_dir()
            .to_path_buf()
    };
    ensure_exists(&path);
    path
}

pub fn config_path() -> std::path::PathBuf {
    data_dir().join("config.json")
}

fn ensure_exists(path: &std::path::Path) {
    if !path.exists() {
        std::fs::create_dir_all(path).expect("Failed to create data directory");
    }
}
