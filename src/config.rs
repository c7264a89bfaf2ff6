use crate::pipeline::calories::EnergyModel;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub max_file_size: usize,
    /// `None` keeps activities in process memory.
    pub database_url: Option<String>,
    pub energy: EnergyModel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            max_file_size: 25 * 1024 * 1024,
            database_url: None,
            energy: EnergyModel::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = env_parse("PORT").unwrap_or(defaults.port);

        let max_file_size_mb: usize = env_parse("MAX_FILE_SIZE_MB").unwrap_or(25);

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let energy = EnergyModel {
            met: env_positive("CALORIE_MET").unwrap_or(defaults.energy.met),
            weight_kg: env_positive("BODY_WEIGHT_KG").unwrap_or(defaults.energy.weight_kg),
        };

        Self {
            port,
            max_file_size: max_file_size_mb * 1024 * 1024,
            database_url,
            energy,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

/// Energy model inputs must be finite and positive to keep calorie estimates
/// non-negative.
fn env_positive(key: &str) -> Option<f64> {
    env_parse::<f64>(key).filter(|v| v.is_finite() && *v > 0.0)
}
