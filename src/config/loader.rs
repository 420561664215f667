use super::{default_config_path, ConfigFile, Overrides, RunConfig};
use crate::error::{ErrorCode, ParsumError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Read and parse one config file.
pub async fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path).await.map_err(|e| {
        let code = if e.kind() == std::io::ErrorKind::NotFound {
            ErrorCode::CONFIG_NOT_FOUND
        } else {
            ErrorCode::CONFIG_GENERIC
        };
        ParsumError::config_with_code(code, format!("cannot read {}", path.display()))
            .with_source(e)
    })?;

    toml::from_str(&content)
        .map_err(|e| ParsumError::from(e).with_context(path.display()))
}

/// Resolve the run configuration from every layer, reading the process
/// environment.
pub async fn resolve(
    exponent: u32,
    config_path: Option<&Path>,
    overrides: &Overrides,
) -> Result<RunConfig> {
    resolve_with_env(exponent, config_path, overrides, |key| std::env::var(key).ok()).await
}

/// Like [`resolve`], with an explicit environment lookup.
///
/// An explicit `config_path` must exist. Without one, the default location is
/// used only if a file is there.
pub async fn resolve_with_env<F>(
    exponent: u32,
    config_path: Option<&Path>,
    overrides: &Overrides,
    lookup: F,
) -> Result<RunConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = RunConfig::new(exponent);

    if let Some(path) = config_file_to_load(config_path).await {
        debug!("Loading configuration from {}", path.display());
        config.apply_file(&load_config_file(&path).await?);
    }

    config.merge_env_vars_from(lookup);
    config.apply_overrides(overrides);
    config.validate()?;

    debug!(?config, "resolved configuration");
    Ok(config)
}

async fn config_file_to_load(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let path = default_config_path()?;
    fs::try_exists(&path).await.ok()?.then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_config_file() {
        let file = write_config("iterations = 1000\nworkers = 3\n");
        let config = load_config_file(file.path()).await.unwrap();

        assert_eq!(config.iterations, Some(1000));
        assert_eq!(config.workers, Some(3));
        assert_eq!(config.coordinator, None);
    }

    #[tokio::test]
    async fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        let err = resolve_with_env(2, Some(&missing), &Overrides::default(), no_env)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_toml() {
        let file = write_config("iterations = \"lots\"\n");
        let err = load_config_file(file.path()).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_TOML);
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[tokio::test]
    async fn test_resolve_all_layers() {
        let file = write_config("iterations = 1000\nworkers = 3\ncoordinator = 2\n");
        let overrides = Overrides {
            workers: Some(5),
            ..Default::default()
        };
        let env = |key: &str| (key == crate::config::ENV_ITERATIONS).then(|| "2000".to_string());

        let config = resolve_with_env(4, Some(file.path()), &overrides, env)
            .await
            .unwrap();

        assert_eq!(
            config,
            RunConfig {
                exponent: 4,
                total_iterations: 2000,
                workers: 5,
                coordinator: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_validates() {
        let file = write_config("workers = 2\ncoordinator = 7\n");
        let err = resolve_with_env(2, Some(file.path()), &Overrides::default(), no_env)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::VALIDATION_RANK_OUT_OF_RANGE);
    }
}
