use serde::Deserialize;
use std::fs;
use std::path::Path;

const ENV_CONFIG_PATH: &str = "UMKM_SURVEY_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const ENV_ADMIN_PIN: &str = "ADMIN_PIN";
const DEFAULT_ADMIN_PIN: &str = "1234";

/// A threat entry of a seed catalog
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogThreat {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Business processes affected by this threat, by name
    #[serde(default)]
    pub business_processes: Vec<CatalogProcessLink>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogProcessLink {
    pub name: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// An asset entry of a seed catalog
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogAsset {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub threats: Vec<CatalogThreat>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogProcess {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Catalog seeding configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeedConfig {
    /// Seed the asset/threat catalog on startup when the store is empty
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Replaces the built-in catalog when present
    #[serde(default)]
    pub assets: Option<Vec<CatalogAsset>>,
    #[serde(default)]
    pub business_processes: Option<Vec<CatalogProcess>>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            assets: None,
            business_processes: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub seed: SeedConfig,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub seed: SeedConfig,
    pub admin_pin: String,
    pub port: u16,
    pub host: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: SeedConfig::default(),
            admin_pin: DEFAULT_ADMIN_PIN.to_string(),
            port: 8080,
            host: "127.0.0.1".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let admin_pin = match std::env::var(ENV_ADMIN_PIN) {
            Ok(pin) if !pin.trim().is_empty() => pin,
            _ => {
                tracing::warn!("ADMIN_PIN not set, using the development default");
                DEFAULT_ADMIN_PIN.to_string()
            }
        };

        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let seed = Self::load_config_file(&config_path)
            .map(|cf| cf.seed)
            .unwrap_or_default();

        Self {
            seed,
            admin_pin,
            port,
            host,
        }
    }

    /// Load configuration from YAML file
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => Self::parse_config_file(&contents).map_or_else(
                |e| {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                    None
                },
                |config| {
                    tracing::info!(path = %path.display(), "Loaded configuration from file");
                    Some(config)
                },
            ),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                None
            }
        }
    }

    fn parse_config_file(contents: &str) -> Result<ConfigFile, serde_yaml::Error> {
        let contents = contents.trim();
        if contents.is_empty() {
            return Ok(ConfigFile::default());
        }
        serde_yaml::from_str(contents)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse_config_file("  \n").unwrap();
        assert!(config.seed.enabled);
        assert!(config.seed.assets.is_none());
    }

    #[test]
    fn test_custom_catalog() {
        let yaml = r#"
seed:
  enabled: false
  assets:
    - name: Website Perusahaan
      description: Website resmi
      threats:
        - name: DDoS Attack
          business_processes:
            - name: Penjualan
              explanation: Toko online tidak bisa diakses
        - name: Defacement Website
"#;
        let config = Config::parse_config_file(yaml).unwrap();
        assert!(!config.seed.enabled);

        let assets = config.seed.assets.unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].threats.len(), 2);
        assert_eq!(assets[0].threats[0].business_processes[0].name, "Penjualan");
        assert!(assets[0].threats[1].description.is_none());
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(Config::parse_config_file("seed: [not, a, map").is_err());
    }

    #[test]
    fn test_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }
}
