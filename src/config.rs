use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::compare::DEFAULT_TOLERANCE;
use crate::error::Result;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "iuic.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub paths: Paths,
    pub compiler: String,
    pub timeouts: Timeouts,
    pub visual: VisualConfig,
}

/// Project layout. Unset entries are derived from `root`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Paths {
    pub root: PathBuf,
    pub library: Option<PathBuf>,
    pub build_dir: Option<PathBuf>,
    pub golden_dir: Option<PathBuf>,
    pub dsl: Option<PathBuf>,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            library: None,
            build_dir: None,
            golden_dir: None,
            dsl: None,
        }
    }
}

impl Paths {
    pub fn library(&self) -> PathBuf {
        self.library
            .clone()
            .unwrap_or_else(|| self.root.join("libiui.a"))
    }

    pub fn build_dir(&self) -> PathBuf {
        self.build_dir
            .clone()
            .unwrap_or_else(|| self.root.join("build"))
    }

    pub fn golden_dir(&self) -> PathBuf {
        self.golden_dir
            .clone()
            .unwrap_or_else(|| self.root.join("tests").join("golden"))
    }

    pub fn dsl(&self) -> PathBuf {
        self.dsl
            .clone()
            .unwrap_or_else(|| self.root.join("src").join("md3-spec.dsl"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timeouts {
    /// Wall-clock limit for each conformance program.
    #[serde(with = "humantime_serde")]
    pub process: Duration,
    /// Limit for each compiler, code generator and `make` invocation.
    #[serde(with = "humantime_serde")]
    pub build: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            process: Duration::from_secs(10),
            build: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VisualConfig {
    pub tolerance: u8,
    /// When set, visual cases pass at or above this similarity percentage
    /// instead of requiring zero differing pixels.
    pub min_similarity: Option<f64>,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            min_similarity: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: Paths::default(),
            compiler: "cc".to_string(),
            timeouts: Timeouts::default(),
            visual: VisualConfig::default(),
        }
    }
}

impl Config {
    /// Explicit path, else `./iuic.toml` when present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    return Ok(Self::default());
                }
                fallback
            }
        };
        tracing::debug!(path = %path.display(), "loading config");
        let text = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&text)?)
    }

    /// The file `load` would read when no explicit path is given.
    pub fn implicit_path() -> Option<PathBuf> {
        let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
        fallback.is_file().then_some(fallback)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.compiler.trim().is_empty() {
            return Err("compiler must not be empty".to_string());
        }
        if self.timeouts.process.is_zero() {
            return Err("timeouts.process must be greater than zero".to_string());
        }
        if self.timeouts.build.is_zero() {
            return Err("timeouts.build must be greater than zero".to_string());
        }
        if let Some(floor) = self.visual.min_similarity {
            if !(0.0..=100.0).contains(&floor) {
                return Err(format!(
                    "visual.min_similarity must be within 0..=100 (got {floor})"
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_values_match_expected() {
        let cfg = Config::default();

        assert_eq!(cfg.compiler, "cc");
        assert_eq!(cfg.timeouts.process, Duration::from_secs(10));
        assert_eq!(cfg.visual.tolerance, 2);
        assert_eq!(cfg.visual.min_similarity, None);
        assert_eq!(cfg.paths.library(), PathBuf::from("./libiui.a"));
        assert_eq!(cfg.paths.golden_dir(), PathBuf::from("./tests/golden"));
        assert_eq!(cfg.paths.dsl(), PathBuf::from("./src/md3-spec.dsl"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parses_partial_toml_with_humantime_durations() {
        let cfg: Config = toml::from_str(
            r#"
compiler = "clang"

[paths]
root = "/src/libiui"
build_dir = "/tmp/iuic-build"

[timeouts]
process = "30s"

[visual]
tolerance = 4
min_similarity = 99.5
"#,
        )
        .expect("parse config");

        assert_eq!(cfg.compiler, "clang");
        assert_eq!(cfg.paths.build_dir(), PathBuf::from("/tmp/iuic-build"));
        assert_eq!(cfg.paths.library(), PathBuf::from("/src/libiui/libiui.a"));
        assert_eq!(cfg.timeouts.process, Duration::from_secs(30));
        assert_eq!(cfg.timeouts.build, Duration::from_secs(300));
        assert_eq!(cfg.visual.tolerance, 4);
        assert_eq!(cfg.visual.min_similarity, Some(99.5));
    }

    #[test]
    fn load_reads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[timeouts]\nprocess = \"2m\"").unwrap();

        let cfg = Config::load(Some(file.path())).expect("load config");
        assert_eq!(cfg.timeouts.process, Duration::from_secs(120));
    }

    #[test]
    fn load_rejects_unknown_keys_and_bad_tolerance() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "threshold = 0.9").unwrap();
        assert!(Config::load(Some(file.path())).is_err());

        let err = toml::from_str::<Config>("[visual]\ntolerance = 300\n");
        assert!(err.is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut cfg = Config::default();
        cfg.visual.min_similarity = Some(120.0);
        assert!(cfg.validate().unwrap_err().contains("min_similarity"));

        let mut cfg = Config::default();
        cfg.timeouts.process = Duration::ZERO;
        assert!(cfg.validate().unwrap_err().contains("timeouts.process"));
    }
}
