use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

const DEFAULT_DATA_DIR: &str = ".linguist";
const DEFAULT_TRANSLATE_TIMEOUT_SECS: u64 = 30;

/// Host settings read from a TOML file. Every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HostSettings {
    pub data_dir: Option<PathBuf>,
    /// Overrides the shipped builtin engine names.
    pub builtin_translators: Option<Vec<String>>,
    /// Program and arguments run once per translation.
    pub translator_command: Vec<String>,
    pub translate_timeout_secs: u64,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            builtin_translators: None,
            translator_command: Vec::new(),
            translate_timeout_secs: DEFAULT_TRANSLATE_TIMEOUT_SECS,
        }
    }
}

impl HostSettings {
    /// Read settings from `path`, or use defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing settings in {}", path.display()))
    }

    /// Parse settings from TOML text.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// The command-line flag wins over the file, the file over the default.
    pub fn data_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.data_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// The flag, split on whitespace, wins over the file.
    pub fn translator_command(&self, flag: Option<&str>) -> Vec<String> {
        match flag {
            Some(cmd) => cmd.split_whitespace().map(str::to_string).collect(),
            None => self.translator_command.clone(),
        }
    }

    pub fn translate_timeout(&self) -> Duration {
        Duration::from_secs(self.translate_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(HostSettings::parse("").unwrap(), HostSettings::default());
    }

    #[test]
    fn kebab_case_keys() {
        let settings = HostSettings::parse(
            r#"
            data-dir = "/var/lib/linguist"
            builtin-translators = ["GoogleTranslator"]
            translator-command = ["node", "engines.js"]
            translate-timeout-secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(settings.data_dir, Some(PathBuf::from("/var/lib/linguist")));
        assert_eq!(settings.builtin_translators, Some(vec!["GoogleTranslator".to_string()]));
        assert_eq!(settings.translator_command, vec!["node", "engines.js"]);
        assert_eq!(settings.translate_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn flags_override_file() {
        let settings = HostSettings {
            data_dir: Some(PathBuf::from("from-file")),
            translator_command: vec!["file-cmd".into()],
            ..HostSettings::default()
        };
        assert_eq!(settings.data_dir(Some(PathBuf::from("flag"))), PathBuf::from("flag"));
        assert_eq!(settings.data_dir(None), PathBuf::from("from-file"));
        assert_eq!(HostSettings::default().data_dir(None), PathBuf::from(DEFAULT_DATA_DIR));

        assert_eq!(settings.translator_command(Some("sh -c x")), vec!["sh", "-c", "x"]);
        assert_eq!(settings.translator_command(None), vec!["file-cmd"]);
    }

    #[test]
    fn mistyped_values_are_rejected() {
        assert!(HostSettings::parse("translate-timeout-secs = \"soon\"").is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linguist.toml");
        std::fs::write(&path, "data-dir = \"state\"\n").unwrap();
        let settings = HostSettings::load(Some(&path)).unwrap();
        assert_eq!(settings.data_dir, Some(PathBuf::from("state")));
        assert!(HostSettings::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
