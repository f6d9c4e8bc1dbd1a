use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::Serialize;

pub const DEFAULT_SOURCE: &str = "data/grades.json";

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(alias = "data", alias = "url")]
    pub source: Option<String>,
    pub timeout: Option<u64>,
    pub proxy: Option<String>,
    #[serde(alias = "locale")]
    pub collation: Option<String>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".gradelookup").join("config.yml"))
}

/// `~` and `~/…` resolve against the home directory; `~user` and everything
/// else, URLs included, pass through untouched.
pub fn expand_home(raw: &str) -> String {
    let rest = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(&['/', '\\'][..]) => rest,
        _ => return raw.to_string(),
    };
    match home_dir() {
        Some(home) => format!("{}{rest}", home.display()),
        None => raw.to_string(),
    }
}

pub fn parse_config(contents: &str, path: &Path) -> Result<ConfigFile, String> {
    serde_yaml::from_str::<Option<ConfigFile>>(contents)
        .map(Option::unwrap_or_default)
        .map_err(|e| format!("failed to parse config '{}': {e}", path.display()))
}

pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents, path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

fn default_config_yaml() -> String {
    r#"# gradelookup config
#
# Location (default):
#   ~/.gradelookup/config.yml

# Where the grade book lives: an http(s) URL or a local path.
source: data/grades.json

# HTTP (optional)
# timeout: 30
# proxy: http://127.0.0.1:8080

# Ordering of score columns without a fixed position: vi or ordinal
collation: vi

# Output (optional)
# output: ./result.html
# output_format: html

no_color: false
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &Path) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    std::fs::write(path, default_config_yaml())
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let cfg = parse_config(&default_config_yaml(), Path::new("config.yml")).unwrap();
        assert_eq!(cfg.source.as_deref(), Some(DEFAULT_SOURCE));
        assert_eq!(cfg.collation.as_deref(), Some("vi"));
        assert_eq!(cfg.no_color, Some(false));
        assert_eq!(cfg.timeout, None);
    }

    #[test]
    fn empty_config_is_default() {
        let cfg = parse_config("# nothing here\n", Path::new("config.yml")).unwrap();
        assert_eq!(cfg, ConfigFile::default());
    }

    #[test]
    fn aliases_are_accepted() {
        let cfg = parse_config(
            "url: https://example.com/data/grades.json\nlocale: ordinal\n",
            Path::new("config.yml"),
        )
        .unwrap();
        assert_eq!(
            cfg.source.as_deref(),
            Some("https://example.com/data/grades.json")
        );
        assert_eq!(cfg.collation.as_deref(), Some("ordinal"));
    }

    #[test]
    fn expand_home_only_touches_a_leading_tilde() {
        assert_eq!(expand_home("data/grades.json"), "data/grades.json");
        assert_eq!(expand_home("~alice/grades.json"), "~alice/grades.json");
        assert_eq!(
            expand_home("https://example.com/~x/grades.json"),
            "https://example.com/~x/grades.json"
        );
        if let Some(home) = home_dir() {
            let home = home.display().to_string();
            assert_eq!(expand_home("~"), home);
            assert_eq!(expand_home("~/grades.json"), format!("{home}/grades.json"));
        }
    }

    #[test]
    fn missing_config_respects_allow_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        assert_eq!(load_config(&path, true).unwrap(), ConfigFile::default());
        assert!(load_config(&path, false).is_err());
    }

    #[test]
    fn ensure_default_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".gradelookup").join("config.yml");
        assert!(ensure_default_config_file(&path).unwrap());
        assert!(!ensure_default_config_file(&path).unwrap());
        assert!(load_config(&path, false).is_ok());
    }
}
