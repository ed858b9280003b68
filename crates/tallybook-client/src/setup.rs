use std::path::Path;

use tracing::debug;

use crate::ClientResult;
use crate::config::{ClientConfig, load_config};
use crate::logging;
use crate::state::DataHome;
use crate::store::SqliteStore;

/// An opened data home: its configuration and a migrated, verified store.
pub struct SetupContext {
    pub home: DataHome,
    pub config: ClientConfig,
    pub store: SqliteStore,
}

pub fn ensure_initialized() -> ClientResult<SetupContext> {
    ensure_initialized_with_home_override(None)
}

pub fn ensure_initialized_at(home_override: &Path) -> ClientResult<SetupContext> {
    ensure_initialized_with_home_override(Some(home_override))
}

pub(crate) fn ensure_initialized_with_home_override(
    home_override: Option<&Path>,
) -> ClientResult<SetupContext> {
    let home = DataHome::locate(home_override)?;
    home.create()?;
    let config = load_config(&home)?;

    let store = SqliteStore::open(&home.store_path(), &config.use_case)?;
    store.verify_schema()?;
    debug!(
        home = %home.root().display(),
        use_case = config.use_case.as_str(),
        "data home ready"
    );

    Ok(SetupContext {
        home,
        config,
        store,
    })
}

/// Installs logging using the `log_filter` of the resolved data home's configuration.
pub fn init_logging(home_override: Option<&Path>) -> ClientResult<bool> {
    let home = DataHome::locate(home_override)?;
    let config = load_config(&home)?;
    Ok(logging::init(&config.log_filter))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::ensure_initialized_at;

    #[test]
    fn first_run_creates_home_and_store() {
        let dir = tempdir();
        assert!(dir.is_ok());
        if let Ok(dir) = dir {
            let home = dir.path().join("tally-home");
            let context = ensure_initialized_at(&home);
            assert!(context.is_ok());
            if let Ok(context) = context {
                assert_eq!(context.config.use_case, "expenses");
                assert_eq!(context.home.root(), home.as_path());
                assert!(context.store.db_path().exists());
            }
        }
    }

    #[test]
    fn invalid_config_blocks_setup() {
        let dir = tempdir();
        assert!(dir.is_ok());
        if let Ok(dir) = dir {
            assert!(fs::write(dir.path().join("config.toml"), "use_case = [1]\n").is_ok());
            let context = ensure_initialized_at(dir.path());
            assert!(context.is_err());
            if let Err(error) = context {
                assert_eq!(error.code, "config_invalid");
            }
        }
    }
}
