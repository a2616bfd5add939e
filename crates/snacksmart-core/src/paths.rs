use anyhow::Result;
use std::path::PathBuf;

const SNACKSMART_DIR: &str = ".snacksmart";
const DB_FILE: &str = "snacksmart.db";
const KNOWLEDGE_DIR: &str = "knowledge";

/// Environment variable to override the SnackSmart directory.
pub const SNACKSMART_DIR_ENV: &str = "SNACKSMART_DIR";

/// Resolve the SnackSmart data directory.
/// Priority: SNACKSMART_DIR env var > ~/.snacksmart/
pub fn resolve_snacksmart_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(SNACKSMART_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(SNACKSMART_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// Ensure the SnackSmart directory exists and return its path.
pub fn ensure_snacksmart_dir() -> Result<PathBuf> {
    let dir = resolve_snacksmart_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Get the database path: ~/.snacksmart/snacksmart.db
pub fn database_path() -> Result<PathBuf> {
    Ok(resolve_snacksmart_dir()?.join(DB_FILE))
}

/// Database path as a UTF-8 string, creating the parent directory.
pub fn ensure_database_path_string() -> Result<String> {
    Ok(ensure_snacksmart_dir()?
        .join(DB_FILE)
        .to_string_lossy()
        .into_owned())
}

/// Default knowledge base directory: ~/.snacksmart/knowledge/
pub fn knowledge_dir() -> Result<PathBuf> {
    Ok(resolve_snacksmart_dir()?.join(KNOWLEDGE_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_share_base_dir() {
        let base = resolve_snacksmart_dir().unwrap();
        assert_eq!(database_path().unwrap(), base.join(DB_FILE));
        assert_eq!(knowledge_dir().unwrap(), base.join(KNOWLEDGE_DIR));
    }
}
