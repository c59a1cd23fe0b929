use std::{
    env::{self, VarError},
    fmt::Display,
    fs,
    io::ErrorKind,
    ops::Deref,
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use tracing::debug;

use crate::{
    cache::{QueryOptions, GC_TIME, RETRY, RETRY_DELAY, STALE_TIME},
    error::Error,
    provider::Api,
};

pub const CONFIG_FILE: &str = ".env";
pub const DEFAULT_APP_NAME: &str = "Finanzas PWA";

#[derive(Debug)]
pub struct AppState<T>(Arc<T>);

impl<T> AppState<T> {
    pub fn new(state: T) -> AppState<T> {
        AppState(Arc::new(state))
    }
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> AppState<T> {
        AppState(Arc::clone(&self.0))
    }
}

impl<T> Deref for AppState<T> {
    type Target = Arc<T>;

    fn deref(&self) -> &Arc<T> {
        &self.0
    }
}

#[derive(Debug)]
pub struct State {
    pub config: Config,
    pub api: Api,
}

impl State {
    pub fn new(config: Config, api: Api) -> State {
        State { config, api }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub use_mocks: bool,
    pub api_url: String,
    pub app_name: String,
    pub server_host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    /// Seconds
    pub timeout: u64,
    /// Seconds
    pub stale_time: u64,
    pub retry: u32,
    /// Milliseconds
    pub retry_delay: u64,
}

impl Config {
    /// Reads every key through `lookup`. Missing or empty keys keep
    /// their default, malformed values are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, Error>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let defaults = Config::default();
        let var = |key: &str| -> Result<Option<String>, Error> {
            match lookup(key) {
                Ok(value) if value.trim().is_empty() => Ok(None),
                Ok(value) => Ok(Some(value.trim().to_owned())),
                Err(VarError::NotPresent) => Ok(None),
                Err(e) => Err(Error::VAR(e)),
            }
        };

        let use_mocks = match var("USE_MOCKS")? {
            Some(value) => value == "true",
            None => defaults.use_mocks,
        };
        let api_url = var("API_URL")?.unwrap_or(defaults.api_url);
        let app_name = var("APP_NAME")?.unwrap_or(defaults.app_name);
        let server_host = var("SERVER_HOST")?.unwrap_or(defaults.server_host);
        let port = parse("PORT", var("PORT")?, defaults.port)?;
        let allowed_origins = match var("ALLOWED_ORIGINS")? {
            Some(value) => value
                .split(',')
                .map(|item| item.trim().to_owned())
                .filter(|item| !item.is_empty())
                .collect::<Vec<String>>(),
            None => defaults.allowed_origins,
        };
        let timeout = parse("TIMEOUT", var("TIMEOUT")?, defaults.timeout)?;
        let stale_time = parse(
            "STALE_TIME_IN_SEC",
            var("STALE_TIME_IN_SEC")?,
            defaults.stale_time,
        )?;
        let retry = parse("QUERY_RETRY", var("QUERY_RETRY")?, defaults.retry)?;
        let retry_delay = parse(
            "RETRY_DELAY_IN_MS",
            var("RETRY_DELAY_IN_MS")?,
            defaults.retry_delay,
        )?;

        Ok(Config {
            use_mocks,
            api_url,
            app_name,
            server_host,
            port,
            allowed_origins,
            timeout,
            stale_time,
            retry,
            retry_delay,
        })
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            stale_time: Duration::from_secs(self.stale_time),
            retry: self.retry,
            retry_delay: Duration::from_millis(self.retry_delay),
            gc_time: GC_TIME,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            use_mocks: false,
            api_url: String::new(),
            app_name: String::from(DEFAULT_APP_NAME),
            server_host: String::from("127.0.0.1"),
            port: 8080,
            allowed_origins: vec![String::from("*")],
            timeout: 30,
            stale_time: STALE_TIME.as_secs(),
            retry: RETRY,
            retry_delay: RETRY_DELAY.as_millis() as u64,
        }
    }
}

fn parse<T>(key: &str, value: Option<String>, default: T) -> Result<T, Error>
where
    T: FromStr,
    T::Err: Display,
{
    match value {
        Some(value) => value.parse::<T>().map_err(|e| {
            Error::ConfigurationError(format!("{}='{}': {}", key, value, e))
        }),
        None => Ok(default),
    }
}

pub fn get_configuration() -> Result<Config, Error> {
    Config::from_lookup(|key| env::var(key))
}

/// Loads `.env` from the working directory into the process environment.
/// The file is optional and never overrides variables already set.
pub fn set_configuration() -> Result<(), Error> {
    let config_string = match fs::read_to_string(CONFIG_FILE) {
        Ok(value) => value,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No {} file, using process environment", CONFIG_FILE);
            return Ok(());
        },
        Err(e) => return Err(Error::Io(e)),
    };

    for (key, value) in parse_config_string(&config_string) {
        if env::var_os(&key).is_none() {
            env::set_var(key, value);
        }
    }

    Ok(())
}

fn parse_config_string(config: &str) -> Vec<(String, String)> {
    config
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            (key.trim().to_owned(), value.to_owned())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(
        vars: &[(&str, &str)],
    ) -> impl Fn(&str) -> Result<String, VarError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned().ok_or(VarError::NotPresent)
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert!(!config.use_mocks);
        assert_eq!(config.app_name, DEFAULT_APP_NAME);
        assert_eq!(config.port, 8080);
        assert_eq!(config.query_options(), QueryOptions::default());
    }

    #[test]
    fn test_reads_values() {
        let config = Config::from_lookup(lookup(&[
            ("USE_MOCKS", "true"),
            ("API_URL", "http://localhost:3001/api"),
            ("ALLOWED_ORIGINS", "http://localhost:3000, https://finanzas.cl"),
            ("STALE_TIME_IN_SEC", "60"),
            ("QUERY_RETRY", "0"),
        ]))
        .unwrap();

        assert!(config.use_mocks);
        assert_eq!(config.api_url, "http://localhost:3001/api");
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:3000", "https://finanzas.cl"]
        );
        assert_eq!(config.query_options().stale_time, Duration::from_secs(60));
        assert_eq!(config.query_options().retry, 0);
    }

    #[test]
    fn test_only_literal_true_enables_mocks() {
        let config = Config::from_lookup(lookup(&[("USE_MOCKS", "1")])).unwrap();
        assert!(!config.use_mocks);
    }

    #[test]
    fn test_malformed_value_is_rejected() {
        let result = Config::from_lookup(lookup(&[("PORT", "80a")]));
        match result {
            Err(Error::ConfigurationError(message)) => {
                assert!(message.starts_with("PORT='80a'"), "{}", message)
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_string() {
        let pairs = parse_config_string(
            "# local\nUSE_MOCKS=true\n\nAPI_URL=\"http://localhost:3001\"\nBROKEN\n",
        );
        assert_eq!(
            pairs,
            vec![
                (String::from("USE_MOCKS"), String::from("true")),
                (String::from("API_URL"), String::from("http://localhost:3001")),
            ]
        );
    }
}
