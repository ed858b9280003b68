use std::fs;
use std::path::{Path, PathBuf};

use crate::{ClientError, ClientResult};

pub const HOME_ENV_VAR: &str = "TALLYBOOK_HOME";

const DEFAULT_DIR_NAME: &str = ".tallybook";
const STORE_FILE_NAME: &str = "tallybook.db";
const CONFIG_FILE_NAME: &str = "config.toml";

/// The directory that holds the store database and the optional `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataHome {
    root: PathBuf,
}

impl DataHome {
    /// Explicit override, then `TALLYBOOK_HOME`, then `~/.tallybook`. The result is
    /// always absolute.
    pub fn locate(home_override: Option<&Path>) -> ClientResult<Self> {
        let root = home_override
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(HOME_ENV_VAR).map(PathBuf::from))
            .or_else(|| home::home_dir().map(|dir| dir.join(DEFAULT_DIR_NAME)))
            .ok_or_else(|| {
                ClientError::store_unavailable(
                    Path::new("."),
                    "Could not resolve a home directory for the data store.",
                )
            })?;

        if root.is_absolute() {
            return Ok(Self { root });
        }
        let cwd = std::env::current_dir()
            .map_err(|error| ClientError::store_unavailable(&root, &error.to_string()))?;
        Ok(Self {
            root: cwd.join(root),
        })
    }

    /// Creates the directory when missing. On unix it is made owner-only.
    pub fn create(&self) -> ClientResult<()> {
        fs::create_dir_all(&self.root)
            .map_err(|error| ClientError::store_unavailable(&self.root, &error.to_string()))?;
        restrict_to_owner(&self.root);
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store_path(&self) -> PathBuf {
        self.root.join(STORE_FILE_NAME)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(error) = fs::set_permissions(path, fs::Permissions::from_mode(0o700)) {
        tracing::debug!(path = %path.display(), %error, "could not restrict data home");
    }
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) {}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::tempdir;

    use super::DataHome;

    #[test]
    fn explicit_override_wins_and_is_absolute() {
        let located = DataHome::locate(Some(Path::new("relative-home")));
        assert!(located.is_ok());
        if let Ok(home) = located {
            assert!(home.root().is_absolute());
            assert!(home.root().ends_with("relative-home"));
            assert!(home.store_path().ends_with("relative-home/tallybook.db"));
            assert!(home.config_path().ends_with("relative-home/config.toml"));
        }
    }

    #[test]
    fn create_makes_nested_directories() {
        let dir = tempdir();
        assert!(dir.is_ok());
        if let Ok(dir) = dir {
            let nested = dir.path().join("a").join("b");
            let home = DataHome::locate(Some(&nested));
            assert!(home.is_ok());
            if let Ok(home) = home {
                assert!(home.create().is_ok());
                assert!(nested.is_dir());
                assert!(home.create().is_ok());
            }
        }
    }
}
