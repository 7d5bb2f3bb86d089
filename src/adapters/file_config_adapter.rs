//! INI file configuration adapter.
//!
//! Keys and section names are case-insensitive (configparser lowercases them).

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }

    fn section_keys(&self, section: &str) -> Vec<String> {
        self.config
            .get_map_ref()
            .get(&section.to_lowercase())
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[database]
path = finance.db
pool_size = 8

[trading]
starting_cash = 10000.00
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("database", "path"),
            Some("finance.db".to_string())
        );
        assert_eq!(adapter.get_int("database", "pool_size", 4), 8);
        assert_eq!(
            adapter.get_string("trading", "starting_cash"),
            Some("10000.00".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[web]\nlisten = 0.0.0.0:80\n").unwrap();
        assert_eq!(adapter.get_string("web", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_default_for_missing_or_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[quotes]\ntimeout_secs = soon\n").unwrap();
        assert_eq!(adapter.get_int("quotes", "timeout_secs", 10), 10);
        assert_eq!(adapter.get_int("quotes", "missing", 42), 42);
    }

    #[test]
    fn get_double_returns_value_or_default() {
        let adapter = FileConfigAdapter::from_string("[x]\nrate = 0.25\n").unwrap();
        assert_eq!(adapter.get_double("x", "rate", 0.0), 0.25);
        assert_eq!(adapter.get_double("x", "missing", 99.9), 99.9);
    }

    #[test]
    fn get_bool_values() {
        let adapter = FileConfigAdapter::from_string(
            "[web]\na = true\nb = yes\nc = 1\nd = false\ne = no\nf = 0\n",
        )
        .unwrap();
        assert!(adapter.get_bool("web", "a", false));
        assert!(adapter.get_bool("web", "b", false));
        assert!(adapter.get_bool("web", "c", false));
        assert!(!adapter.get_bool("web", "d", true));
        assert!(!adapter.get_bool("web", "e", true));
        assert!(!adapter.get_bool("web", "f", true));
        assert!(adapter.get_bool("web", "missing", true));
    }

    #[test]
    fn section_keys_lists_lowercased_keys() {
        let adapter = FileConfigAdapter::from_string(
            "[static_quotes]\nAAPL = 150.00,Apple Inc.\nmsft = 300,Microsoft\n",
        )
        .unwrap();
        let mut keys = adapter.section_keys("static_quotes");
        keys.sort();
        assert_eq!(keys, vec!["aapl", "msft"]);
        assert!(adapter.section_keys("nothing").is_empty());
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[auth]\nsession_lifetime = 3600\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_int("auth", "session_lifetime", 0), 3600);
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(result.is_err());
    }
}
