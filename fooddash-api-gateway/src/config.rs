use std::env;

use dotenvy::dotenv;
use fooddash_marketplace_service::Settings;
use fooddash_marketplace_service::config::SettingsError;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8100";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlipVerifierConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewaySettings {
    pub core: Settings,
    pub jwt_secret: String,
    pub bind_address: String,
    /// Slip uploads are refused while this is unset.
    pub slip_verifier: Option<SlipVerifierConfig>,
}

impl GatewaySettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let core = Settings::from_lookup(&lookup)?;
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(SettingsError::Missing("JWT_SECRET"))?;
        let bind_address =
            lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
        let slip_verifier = match (lookup("SLIP_VERIFY_URL"), lookup("SLIP_VERIFY_API_KEY")) {
            (Some(url), Some(api_key)) => Some(SlipVerifierConfig { url, api_key }),
            (Some(_), None) => return Err(SettingsError::Missing("SLIP_VERIFY_API_KEY")),
            _ => None,
        };

        Ok(Self {
            core,
            jwt_secret,
            bind_address,
            slip_verifier,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&'static str, &str)]) -> Result<GatewaySettings, SettingsError> {
        let vars = vars
            .iter()
            .map(|(k, v)| (*k, v.to_string()))
            .collect::<HashMap<_, _>>();
        GatewaySettings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn jwt_secret_is_required() {
        assert_eq!(
            settings(&[("DATABASE_URL", "postgres://x")]).unwrap_err(),
            SettingsError::Missing("JWT_SECRET")
        );
    }

    #[test]
    fn slip_verifier_is_optional() {
        let settings = settings(&[("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "s")]).unwrap();
        assert_eq!(settings.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(settings.slip_verifier, None);
    }

    #[test]
    fn slip_verifier_needs_a_key() {
        let err = settings(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("SLIP_VERIFY_URL", "https://verify.example/api"),
        ])
        .unwrap_err();
        assert_eq!(err, SettingsError::Missing("SLIP_VERIFY_API_KEY"));
    }
}
