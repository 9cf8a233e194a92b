use super::validation::Validatable;
use serde::Deserialize;
use std::fs::read_to_string;

pub struct YamlConfig {}

impl YamlConfig {
    pub fn read(filename: &str) -> Result<String, String> {
        match read_to_string(filename) {
            Ok(config) => Ok(config),
            Err(e) => {
                debug!("error on file opening: {}", e);
                Err(format!("error on file opening '{}': {}", filename, e))
            }
        }
    }

    pub fn parse<T>(config: &str) -> Result<T, String>
    where
        T: for<'de> Deserialize<'de> + Validatable,
    {
        let result: Result<T, _> = serde_yaml::from_str(config);
        match result {
            Ok(conf) => Ok(conf),
            Err(e) => {
                debug!("error on yaml parsing: {}", e);
                Err(format!("error on yaml parsing: {}", e))
            }
        }
    }

    /// Parses and validates a config from a string.
    pub fn parse_valid<T>(config: &str) -> Result<T, String>
    where
        T: for<'de> Deserialize<'de> + Validatable,
    {
        let config: T = Self::parse(config)?;
        match config.validate() {
            Ok(_) => Ok(config),
            Err(e) => {
                debug!("config is not valid: {}", e);
                Err(format!("config is not valid: {}", e))
            }
        }
    }

    pub fn get<T>(filename: &str) -> Result<T, String>
    where
        T: for<'de> Deserialize<'de> + Validatable,
    {
        let file = Self::read(filename)?;
        Self::parse_valid(&file)
    }
}
