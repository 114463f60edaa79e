use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_DATA_PATH: &str = "bookings-analytics.json";
pub const ENV_DATA_PATH: &str = "BOOKINGS_DATA";
pub const ENV_EXPORT_DIR: &str = "BOOKINGS_EXPORT_DIR";
pub const ENV_TIME_BASIS: &str = "BOOKINGS_TIME_BASIS";

/// Zone used to derive years and month labels from booking timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeBasis {
    #[default]
    Local,
    Utc,
}

impl FromStr for TimeBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(TimeBasis::Local),
            "utc" => Ok(TimeBasis::Utc),
            other => Err(format!("unknown time basis '{}', expected local or utc", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_path: PathBuf,
    pub export_dir: PathBuf,
    pub time_basis: TimeBasis,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            export_dir: PathBuf::from("."),
            time_basis: TimeBasis::Local,
        }
    }
}

impl Config {
    /// Defaults, then environment, then the first command-line argument as
    /// the data path.
    pub fn from_env_and_args() -> Self {
        let lookup = |key: &str| std::env::var(key).ok();
        Self::resolve(lookup, std::env::args().nth(1))
    }

    pub fn resolve<F>(lookup: F, data_arg: Option<String>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(path) = lookup(ENV_DATA_PATH).filter(|p| !p.trim().is_empty()) {
            config.data_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup(ENV_EXPORT_DIR).filter(|d| !d.trim().is_empty()) {
            config.export_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_TIME_BASIS) {
            match raw.parse() {
                Ok(basis) => config.time_basis = basis,
                Err(e) => tracing::warn!("{}; keeping {:?}", e, config.time_basis),
            }
        }
        if let Some(path) = data_arg {
            config.data_path = PathBuf::from(path);
        }
        config
    }
}
