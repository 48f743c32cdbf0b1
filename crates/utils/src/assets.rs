use std::{env, path::PathBuf};

use directories::ProjectDirs;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");
const ASSET_DIR_ENV: &str = "TODO_ASSET_DIR";

/// Directory holding the SQLite database and other runtime state.
///
/// `TODO_ASSET_DIR` wins when set. Debug builds use `dev_assets/` at the
/// workspace root; release builds use the platform data directory:
/// * macOS → ~/Library/Application Support/TodoEvolve
/// * Linux → ~/.local/share/todoevolve (respects XDG_DATA_HOME)
/// * Windows → %APPDATA%\TodoEvolve
pub fn asset_dir() -> PathBuf {
    if let Ok(custom_dir) = env::var(ASSET_DIR_ENV) {
        return PathBuf::from(custom_dir);
    }

    if cfg!(debug_assertions) {
        return PathBuf::from(PROJECT_ROOT).join("../../dev_assets");
    }

    match ProjectDirs::from("dev", "todoevolve", "todoevolve") {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        None => {
            tracing::warn!("No home directory available, storing assets in ./data");
            PathBuf::from("data")
        }
    }
}

/// Creates the asset directory if it does not exist yet.
pub fn ensure_asset_dir() -> std::io::Result<PathBuf> {
    let path = asset_dir();
    if !path.exists() {
        std::fs::create_dir_all(&path)?;
        tracing::info!("Created asset directory: {}", path.display());
    }
    Ok(path)
}

pub fn database_path() -> PathBuf {
    asset_dir().join("todo.sqlite")
}
