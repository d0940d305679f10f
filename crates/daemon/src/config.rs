//! Daemon configuration
//!
//! Every knob comes from a `TICKETFLOW_*` environment variable; unset means
//! the default below. A set but unparsable value aborts startup.

use anyhow::{bail, Context, Result};
use std::str::FromStr;
use std::time::Duration;
use ticketflow_api_rpc::RpcServerConfig;
use ticketflow_core::application::constants::{
    DEFAULT_PROTECTION_WINDOW, DEFAULT_REBALANCE_INTERVAL, DEFAULT_REBALANCE_MAX_MOVES,
    DEFAULT_REBALANCE_MAX_SPREAD, DEFAULT_SWEEP_INTERVAL, MAX_PROTECTION_WINDOW,
};
use ticketflow_core::application::{ProtectionConfig, RebalanceConfig};

const DEFAULT_DB_PATH: &str = "~/.ticketflow/tickets.db";

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub db_path: String,
    pub rpc_host: String,
    pub rpc_port: u16,
    pub protection_window: Duration,
    pub sweep_interval: Duration,
    /// Zero disables the scheduled rebalancer
    pub rebalance_interval: Duration,
    pub rebalance_max_spread: i64,
    pub rebalance_max_moves: usize,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = lookup("TICKETFLOW_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let db_path = shellexpand::tilde(&db_path).into_owned();

        let rpc_defaults = RpcServerConfig::default();

        let config = Self {
            db_path,
            rpc_host: lookup("TICKETFLOW_RPC_HOST").unwrap_or(rpc_defaults.host),
            rpc_port: parse_or(&lookup, "TICKETFLOW_RPC_PORT", rpc_defaults.port)?,
            protection_window: secs_or(
                &lookup,
                "TICKETFLOW_PROTECTION_WINDOW_SECS",
                DEFAULT_PROTECTION_WINDOW,
            )?,
            sweep_interval: secs_or(
                &lookup,
                "TICKETFLOW_SWEEP_INTERVAL_SECS",
                DEFAULT_SWEEP_INTERVAL,
            )?,
            rebalance_interval: secs_or(
                &lookup,
                "TICKETFLOW_REBALANCE_INTERVAL_SECS",
                DEFAULT_REBALANCE_INTERVAL,
            )?,
            rebalance_max_spread: parse_or(
                &lookup,
                "TICKETFLOW_REBALANCE_MAX_SPREAD",
                DEFAULT_REBALANCE_MAX_SPREAD,
            )?,
            rebalance_max_moves: parse_or(
                &lookup,
                "TICKETFLOW_REBALANCE_MAX_MOVES",
                DEFAULT_REBALANCE_MAX_MOVES,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.protection_window.is_zero() {
            bail!("TICKETFLOW_PROTECTION_WINDOW_SECS must be greater than 0");
        }
        if self.protection_window > MAX_PROTECTION_WINDOW {
            bail!(
                "TICKETFLOW_PROTECTION_WINDOW_SECS must be at most {}",
                MAX_PROTECTION_WINDOW.as_secs()
            );
        }
        if self.sweep_interval.is_zero() {
            bail!("TICKETFLOW_SWEEP_INTERVAL_SECS must be greater than 0");
        }
        if self.rebalance_max_spread < 1 {
            bail!("TICKETFLOW_REBALANCE_MAX_SPREAD must be at least 1");
        }
        Ok(())
    }

    pub fn rebalance_enabled(&self) -> bool {
        !self.rebalance_interval.is_zero()
    }

    pub fn rpc(&self) -> RpcServerConfig {
        RpcServerConfig {
            host: self.rpc_host.clone(),
            port: self.rpc_port,
        }
    }

    pub fn protection(&self) -> ProtectionConfig {
        ProtectionConfig {
            window: self.protection_window,
        }
    }

    pub fn rebalance(&self) -> RebalanceConfig {
        RebalanceConfig {
            max_spread: self.rebalance_max_spread,
            max_moves_per_pass: self.rebalance_max_moves,
            interval: self.rebalance_interval,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

fn secs_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Result<Duration> {
    parse_or(lookup, key, default.as_secs()).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DaemonConfig::from_lookup(lookup_from(&[])).unwrap();
        assert!(config.db_path.ends_with(".ticketflow/tickets.db"));
        assert!(!config.db_path.starts_with('~'));
        assert_eq!(config.rpc_host, "127.0.0.1");
        assert_eq!(config.rpc_port, 9640);
        assert_eq!(config.protection_window, Duration::from_secs(600));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.rebalance_interval, Duration::from_secs(120));
        assert_eq!(config.rebalance_max_spread, 1);
        assert_eq!(config.rebalance_max_moves, 50);
        assert!(config.rebalance_enabled());
    }

    #[test]
    fn test_overrides() {
        let config = DaemonConfig::from_lookup(lookup_from(&[
            ("TICKETFLOW_DB_PATH", "/tmp/t.db"),
            ("TICKETFLOW_RPC_PORT", "9999"),
            ("TICKETFLOW_PROTECTION_WINDOW_SECS", "30"),
            ("TICKETFLOW_REBALANCE_INTERVAL_SECS", "0"),
            ("TICKETFLOW_REBALANCE_MAX_MOVES", " 7 "),
        ]))
        .unwrap();
        assert_eq!(config.db_path, "/tmp/t.db");
        assert_eq!(config.rpc().port, 9999);
        assert_eq!(config.protection().window, Duration::from_secs(30));
        assert!(!config.rebalance_enabled());
        assert_eq!(config.rebalance().max_moves_per_pass, 7);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = DaemonConfig::from_lookup(lookup_from(&[("TICKETFLOW_RPC_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("TICKETFLOW_RPC_PORT"));

        assert!(DaemonConfig::from_lookup(lookup_from(&[(
            "TICKETFLOW_PROTECTION_WINDOW_SECS",
            "0"
        )]))
        .is_err());
        let err = DaemonConfig::from_lookup(lookup_from(&[(
            "TICKETFLOW_PROTECTION_WINDOW_SECS",
            "18446744073709551",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("at most"));
        assert!(DaemonConfig::from_lookup(lookup_from(&[(
            "TICKETFLOW_PROTECTION_WINDOW_SECS",
            "2592000"
        )]))
        .is_ok());

        assert!(DaemonConfig::from_lookup(lookup_from(&[(
            "TICKETFLOW_REBALANCE_MAX_SPREAD",
            "-1"
        )]))
        .is_err());
    }
}
