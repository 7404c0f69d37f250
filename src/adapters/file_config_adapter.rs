//! INI file configuration adapter.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

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
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, String> {
        self.config.getint(section, key)
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
[universe]
market = SPY:SPY, ^DJI:Dow Jones
assets = AAPL:Stock
benchmark = SPY

[data]
csv_dir = /var/lib/tickerboard/prices
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("universe", "market"),
            Some("SPY:SPY, ^DJI:Dow Jones".to_string())
        );
        assert_eq!(
            adapter.get_string("data", "csv_dir"),
            Some("/var/lib/tickerboard/prices".to_string())
        );
    }

    #[test]
    fn section_and_key_names_are_case_insensitive() {
        let adapter = FileConfigAdapter::from_string("[Universe]\nBenchmark = QQQ\n").unwrap();
        assert_eq!(
            adapter.get_string("universe", "benchmark"),
            Some("QQQ".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[universe]\nbenchmark = SPY\n").unwrap();
        assert_eq!(adapter.get_string("universe", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value() {
        let adapter = FileConfigAdapter::from_string("[retry]\nmax_attempts = 5\n").unwrap();
        assert_eq!(adapter.get_int("retry", "max_attempts"), Ok(Some(5)));
    }

    #[test]
    fn get_int_returns_none_for_missing() {
        let adapter = FileConfigAdapter::from_string("[retry]\n").unwrap();
        assert_eq!(adapter.get_int("retry", "missing"), Ok(None));
    }

    #[test]
    fn get_int_rejects_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[retry]\nmax_attempts = abc\n").unwrap();
        assert!(adapter.get_int("retry", "max_attempts").is_err());
    }

    #[test]
    fn from_file_reads_config() {
        let content = "[dashboard]\ndrawdown_period = 6m\n";
        let file = create_temp_config(content);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("dashboard", "drawdown_period"),
            Some("6m".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(result.is_err());
    }
}
