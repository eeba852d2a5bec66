use std::path::{Path, PathBuf};

use iuic_lib::{CompareMode, Config, HarnessError};

/// CLI flags that override config values when present.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub root: Option<PathBuf>,
    pub lib: Option<PathBuf>,
    pub tolerance: Option<u8>,
    pub min_similarity: Option<f64>,
}

/// Load config from a TOML file, `./iuic.toml`, or return defaults.
/// Priority: explicit path > ./iuic.toml > defaults
pub fn load_config(path: Option<&Path>) -> Result<Config, HarnessError> {
    let cfg = Config::load(path).map_err(|e| {
        let loc = path
            .map(|p| p.display().to_string())
            .or_else(|| Config::implicit_path().map(|p| p.display().to_string()))
            .unwrap_or_else(|| "defaults".to_string());
        HarnessError::Config(format!("Failed to read config {}: {}", loc, e))
    })?;

    cfg.validate().map_err(|e| {
        let prefix = path
            .map(|p| format!("Invalid config ({}): {}", p.display(), e))
            .unwrap_or_else(|| format!("Invalid config: {}", e));
        HarnessError::Config(prefix)
    })?;
    Ok(cfg)
}

/// Merge CLI flags into the loaded config, preferring the CLI when a flag is set.
pub fn apply_overrides(mut config: Config, overrides: &CliOverrides) -> Result<Config, HarnessError> {
    if let Some(root) = &overrides.root {
        config.paths.root = root.clone();
    }
    if let Some(lib) = &overrides.lib {
        config.paths.library = Some(lib.clone());
    }
    if let Some(tolerance) = overrides.tolerance {
        config.visual.tolerance = tolerance;
    }
    if let Some(floor) = overrides.min_similarity {
        if !(0.0..=100.0).contains(&floor) {
            return Err(HarnessError::Config(format!(
                "--min-similarity must be within 0..=100 (got {floor})"
            )));
        }
        config.visual.min_similarity = Some(floor);
    }
    Ok(config)
}

/// Strict unless a similarity floor is configured.
pub fn compare_mode(config: &Config) -> CompareMode {
    config
        .visual
        .min_similarity
        .map(CompareMode::MinSimilarity)
        .unwrap_or_default()
}

/// Log effective config (visible with `--verbose`).
pub fn log_effective_config(config: &Config, config_source: Option<&Path>) {
    tracing::debug!("{}", format_effective_config(config, config_source));
}

/// Format effective config as a single-line string.
pub fn format_effective_config(config: &Config, config_source: Option<&Path>) -> String {
    let source = config_source
        .map(|p| p.display().to_string())
        .or_else(|| Config::implicit_path().map(|p| p.display().to_string()))
        .unwrap_or_else(|| "defaults".to_string());
    let min_similarity = config
        .visual
        .min_similarity
        .map(|floor| format!("{floor:.1}%"))
        .unwrap_or_else(|| "exact".to_string());
    format!(
        "Effective config [{source}]: root={}, lib={}, compiler={}, timeouts: process={}s, build={}s, visual: tolerance={}, min_similarity={}",
        config.paths.root.display(),
        config.paths.library().display(),
        config.compiler,
        config.timeouts.process.as_secs(),
        config.timeouts.build.as_secs(),
        config.visual.tolerance,
        min_similarity
    )
}
