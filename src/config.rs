use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Moltype;
use crate::error::FromfileError;
use crate::picklist::PicklistSpec;

pub const CONFIG_FILE: &str = "genome-fromfile.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub taxonomy_db: Vec<String>,
    #[serde(default)]
    pub picklist: Option<String>,
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub report_errors_to: Option<String>,
    #[serde(default)]
    pub ident_in_name: bool,
    #[serde(default)]
    pub default_moltype: Option<Moltype>,
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub taxonomy_db: Vec<Utf8PathBuf>,
    pub picklist: Option<PicklistSpec>,
    pub strict: bool,
    pub report_errors_to: Option<Utf8PathBuf>,
    pub ident_in_name: bool,
    pub default_moltype: Option<Moltype>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must exist; otherwise the working directory and the
    /// user config directory are tried before falling back to defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, FromfileError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => match Self::discover() {
                Some(found) => found,
                None => return Self::resolve_config(Config::default()),
            },
        };
        debug!("reading config from {}", config_path.display());

        let content = fs::read_to_string(&config_path)
            .map_err(|_| FromfileError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| FromfileError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, FromfileError> {
        let picklist = config
            .picklist
            .as_deref()
            .map(str::parse::<PicklistSpec>)
            .transpose()?;

        Ok(ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            taxonomy_db: config
                .taxonomy_db
                .into_iter()
                .map(Utf8PathBuf::from)
                .collect(),
            picklist,
            strict: config.strict,
            report_errors_to: config.report_errors_to.map(Utf8PathBuf::from),
            ident_in_name: config.ident_in_name,
            default_moltype: config.default_moltype,
        })
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("genome-fromfile").join(CONFIG_FILE))
            .filter(|path| path.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picklist::{ColumnKind, PickStyle};

    #[test]
    fn parse_config_defaults() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert!(resolved.taxonomy_db.is_empty());
        assert!(resolved.picklist.is_none());
        assert!(!resolved.strict);
    }

    #[test]
    fn parse_config_picklist() {
        let config: Config = serde_json::from_str(
            r#"{"picklist": "picks.csv:acc:identprefix:exclude", "default_moltype": "protein"}"#,
        )
        .unwrap();
        let resolved = ConfigLoader::resolve_config(config).unwrap();
        let picklist = resolved.picklist.unwrap();
        assert_eq!(picklist.kind, ColumnKind::IdentPrefix);
        assert_eq!(picklist.style, PickStyle::Exclude);
        assert_eq!(resolved.default_moltype, Some(Moltype::Protein));
    }
}
