//! INI file configuration adapter.

use crate::domain::error::SignalError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::fs;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SignalError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::parse(content, &path.display().to_string())
    }

    pub fn from_string(content: &str) -> Result<Self, SignalError> {
        Self::parse(content.to_string(), "<string>")
    }

    fn parse(content: String, origin: &str) -> Result<Self, SignalError> {
        let mut config = Ini::new();
        config
            .read(content)
            .map_err(|reason| SignalError::ConfigParse {
                file: origin.to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
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
[analysis]
symbols = AAPL, MSFT
period = 3mo

[data]
source = csv
csv_dir = /tmp/bars
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("analysis", "symbols"),
            Some("AAPL, MSFT".to_string())
        );
        assert_eq!(
            adapter.get_string("data", "csv_dir"),
            Some("/tmp/bars".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[analysis]\nperiod = 1y\n").unwrap();
        assert_eq!(adapter.get_string("analysis", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_non_empty_skips_blank_values() {
        let adapter = FileConfigAdapter::from_string("[analysis]\nsymbols =   \nperiod =  6mo \n").unwrap();
        assert_eq!(adapter.get_non_empty("analysis", "symbols"), None);
        assert_eq!(adapter.get_non_empty("analysis", "period"), Some("6mo".to_string()));
    }

    #[test]
    fn get_int_returns_value() {
        let adapter = FileConfigAdapter::from_string("[signal]\nrsi_period = 14\n").unwrap();
        assert_eq!(adapter.get_int("signal", "rsi_period", 0), 14);
    }

    #[test]
    fn get_int_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[signal]\n").unwrap();
        assert_eq!(adapter.get_int("signal", "missing", 42), 42);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[signal]\nrsi_period = abc\n").unwrap();
        assert_eq!(adapter.get_int("signal", "rsi_period", 42), 42);
    }

    #[test]
    fn get_int_reads_negative_values() {
        let adapter = FileConfigAdapter::from_string("[resample]\nutc_offset_minutes = -300\n").unwrap();
        assert_eq!(adapter.get_int("resample", "utc_offset_minutes", 0), -300);
    }

    #[test]
    fn get_double_returns_value() {
        let adapter = FileConfigAdapter::from_string("[signal]\nbollinger_mult = 2.5\n").unwrap();
        assert_eq!(adapter.get_double("signal", "bollinger_mult", 0.0), 2.5);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[signal]\nrsi_overbought = high\n").unwrap();
        assert_eq!(adapter.get_double("signal", "rsi_overbought", 70.0), 70.0);
    }

    #[test]
    fn get_bool_returns_true_values() {
        let adapter = FileConfigAdapter::from_string("[analysis]\na = true\nb = yes\nc = 1\n").unwrap();
        assert!(adapter.get_bool("analysis", "a", false));
        assert!(adapter.get_bool("analysis", "b", false));
        assert!(adapter.get_bool("analysis", "c", false));
    }

    #[test]
    fn get_bool_returns_false_values() {
        let adapter = FileConfigAdapter::from_string("[analysis]\na = false\nb = no\nc = 0\n").unwrap();
        assert!(!adapter.get_bool("analysis", "a", true));
        assert!(!adapter.get_bool("analysis", "b", true));
        assert!(!adapter.get_bool("analysis", "c", true));
    }

    #[test]
    fn get_bool_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[analysis]\n").unwrap();
        assert!(adapter.get_bool("analysis", "concurrent", true));
        assert!(!adapter.get_bool("analysis", "concurrent", false));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[logging]\nlevel = debug\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_string("logging", "level"), Some("debug".to_string()));
    }

    #[test]
    fn from_file_missing_file_is_io_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(SignalError::Io(_))));
    }
}
