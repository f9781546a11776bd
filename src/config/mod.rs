//=============================================
// cexpand/config.rs
//=============================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Optional TOML configuration for expansions
// Objective: Locate, parse and convert config into interpreter values
// Formatting: Zobie.format (.solvraformat)
//=============================================

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::interpreter::Value;

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "cexpand.toml";
/// Config file looked up under the user's config directory.
const USER_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when `CEXPAND_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExpandConfig {
    /// Script libraries loaded before any template, relative to the config file.
    pub libraries: Vec<PathBuf>,
    /// Globals defined before any template.
    pub vars: BTreeMap<String, toml::Value>,
    pub logging: LoggingConfig,
}

impl ExpandConfig {
    /// Load `explicit` when given, otherwise the first config found in the
    /// working directory or the user config directory, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(),
        };
        let Some(path) = path else {
            return Ok((Self::default(), None));
        };
        let config = Self::from_path(&path)?;
        Ok((config, Some(path)))
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading configuration from {}", path.display()))?;
        let mut config = Self::parse(&data)
            .with_context(|| format!("parsing configuration {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.resolve_libraries(base);
        }
        Ok(config)
    }

    pub fn parse(data: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(data)?)
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("cexpand").join(USER_CONFIG_FILE))
            .filter(|path| path.is_file())
    }

    fn resolve_libraries(&mut self, base: &Path) {
        for library in &mut self.libraries {
            if library.is_relative() {
                *library = base.join(&*library);
            }
        }
    }

    /// Config variables as interpreter values, in name order.
    pub fn script_vars(&self) -> Vec<(String, Value)> {
        self.vars
            .iter()
            .map(|(name, value)| (name.clone(), toml_to_value(value)))
            .collect()
    }
}

pub fn toml_to_value(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(text) => Value::String(text.clone()),
        toml::Value::Integer(number) => Value::Int(*number),
        toml::Value::Float(number) => Value::Float(*number),
        toml::Value::Boolean(flag) => Value::Bool(*flag),
        toml::Value::Datetime(datetime) => Value::String(datetime.to_string()),
        toml::Value::Array(items) => Value::list(items.iter().map(toml_to_value).collect()),
        toml::Value::Table(entries) => Value::table(
            entries
                .iter()
                .map(|(key, item)| (key.clone(), toml_to_value(item)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = ExpandConfig::parse("").unwrap();
        assert_eq!(config, ExpandConfig::default());
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_parse_full_config() {
        let config = ExpandConfig::parse(
            r#"
            libraries = ["lib/extra.cx"]

            [vars]
            n = 4
            tolerance = 1e-6
            name = "cos"
            funcs = ["cos", "sin"]
            strict = true

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.libraries, vec![PathBuf::from("lib/extra.cx")]);
        assert_eq!(config.logging.level, "debug");

        let vars: BTreeMap<String, Value> = config.script_vars().into_iter().collect();
        assert_eq!(vars["n"], Value::Int(4));
        assert_eq!(vars["tolerance"], Value::Float(1e-6));
        assert_eq!(vars["name"], Value::String("cos".into()));
        assert_eq!(vars["strict"], Value::Bool(true));
        assert_eq!(vars["funcs"].to_string(), "{cos, sin}");
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        assert!(ExpandConfig::parse("libraries = 3").is_err());
    }

    #[test]
    fn test_libraries_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cexpand.toml");
        fs::write(&path, "libraries = [\"helpers.cx\", \"/abs/other.cx\"]\n").unwrap();

        let (config, found) = ExpandConfig::load(Some(&path)).unwrap();
        assert_eq!(found.as_deref(), Some(path.as_path()));
        assert_eq!(config.libraries[0], dir.path().join("helpers.cx"));
        assert_eq!(config.libraries[1], PathBuf::from("/abs/other.cx"));
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ExpandConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("reading configuration"));
    }
}

//=============================================
// End of file
//=============================================
