use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use validator::Validate;

use super::{ClientConfig, ConfigError, defaults};

const ENV_PREFIX: &str = "DKG_";

/// Defaults, then `path` (which must exist), then `DKG_` environment variables.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingConfig(path.display().to_string()));
    }

    tracing::debug!(path = %path.display(), "Loading client configuration");
    extract(base().merge(Toml::file(path)).merge(env()))
}

/// Defaults overridden by `DKG_` environment variables only.
pub fn load_config_from_env() -> Result<ClientConfig, ConfigError> {
    extract(base().merge(env()))
}

fn base() -> Figment {
    Figment::from(Serialized::defaults(defaults::client_config()))
}

fn env() -> Env {
    Env::prefixed(ENV_PREFIX).split("__")
}

fn extract(figment: Figment) -> Result<ClientConfig, ConfigError> {
    let config: ClientConfig = figment.extract().map_err(Box::new)?;
    config
        .validate()
        .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_toml(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = write_toml(
            r#"
            [node]
            endpoint = "https://node.example"
            port = 443
            auth_token = "secret"
            request_timeout_ms = 1000

            [defaults]
            epochs_num = 12
            minimum_number_of_finalization_confirmations = 0
            "#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.node.base_url(), "https://node.example:443");
        assert_eq!(config.node.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.defaults.epochs_num, 12);
        assert_eq!(config.defaults.minimum_number_of_finalization_confirmations, 0);
        // Untouched sections keep their defaults.
        assert_eq!(config.defaults.max_number_of_retries, 5);
        assert_eq!(config.logger, defaults::client_config().logger);
    }

    #[test]
    fn test_blockchain_section() {
        let file = write_toml(
            r#"
            [blockchain]
            name = "base:84532"
            rpc_endpoints = ["https://sepolia.base.org"]
            hub_contract = "0xf21CE8f8b01548D97DCFb36869f1ccB0814a4e05"

            [blockchain.gas_policy]
            max_tx_attempts = 5
            "#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.blockchain.name.as_str(), "base:84532");
        assert_eq!(config.blockchain.gas_policy.max_tx_attempts, 5);
        assert_eq!(config.blockchain.gas_policy.bump_factor, 1.2);
        assert!(config.blockchain.private_key.is_none());
    }

    #[test]
    fn test_defaults_round_trip_through_figment() {
        let config = extract(base()).unwrap();
        assert_eq!(config, defaults::client_config());
    }

    #[test]
    fn test_gas_prices_load_from_file() {
        let file = write_toml(
            r#"
            [blockchain.gas_policy]
            default_gas_price = 2000000000
            max_gas_price = 90000000000
            forced_replacement_gas_price = 5000000000
            "#,
        );

        let gas_policy = load_config(file.path()).unwrap().blockchain.gas_policy;
        assert_eq!(gas_policy.default_gas_price, 2_000_000_000);
        assert_eq!(gas_policy.max_gas_price, 90_000_000_000);
        assert_eq!(gas_policy.forced_replacement_gas_price, Some(5_000_000_000));
    }

    #[test]
    fn test_rejects_unknown_and_invalid_fields() {
        let unknown = write_toml("[node]\nhostname = \"x\"\n");
        assert!(matches!(
            load_config(unknown.path()),
            Err(ConfigError::LoadError(_))
        ));

        let no_chain_id = write_toml("[blockchain]\nname = \"otp\"\n");
        assert!(matches!(
            load_config(no_chain_id.path()),
            Err(ConfigError::LoadError(_))
        ));

        let invalid = write_toml("[defaults]\nepochs_num = 0\n");
        assert!(matches!(
            load_config(invalid.path()),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingConfig(_)));
    }
}
