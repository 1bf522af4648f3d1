use std::env;
use std::str::FromStr;

use dotenvy::dotenv;
use thiserror::Error;

pub const DEFAULT_POOL_SIZE: u32 = 10;
pub const DEFAULT_DELIVERY_FEE: i64 = 20;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings of the marketplace core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub pool_size: u32,
    /// Flat fee added to every order, in minor currency units.
    pub delivery_fee: i64,
    /// When false a verified slip settles the payment regardless of amount.
    pub require_slip_amount_match: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(SettingsError::Missing("DATABASE_URL"))?;
        let pool_size = parse_or(&lookup, "DATABASE_POOL_SIZE", DEFAULT_POOL_SIZE)?;
        let delivery_fee = parse_or(&lookup, "DELIVERY_FEE", DEFAULT_DELIVERY_FEE)?;
        let require_slip_amount_match = parse_or(&lookup, "REQUIRE_SLIP_AMOUNT_MATCH", true)?;

        if pool_size == 0 {
            return Err(SettingsError::Invalid {
                name: "DATABASE_POOL_SIZE",
                value: pool_size.to_string(),
            });
        }
        if delivery_fee < 0 {
            return Err(SettingsError::Invalid {
                name: "DELIVERY_FEE",
                value: delivery_fee.to_string(),
            });
        }

        Ok(Self {
            database_url,
            pool_size,
            delivery_fee,
            require_slip_amount_match,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, SettingsError>
where
    F: Fn(&'static str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => Ok(parsed),
            Err(_) => Err(SettingsError::Invalid { name, value }),
        },
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&'static str, &str)]) -> Result<Settings, SettingsError> {
        let vars = vars
            .iter()
            .map(|(k, v)| (*k, v.to_string()))
            .collect::<HashMap<_, _>>();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply() {
        let settings = settings(&[("DATABASE_URL", "postgres://localhost/fooddash")]).unwrap();
        assert_eq!(settings.pool_size, DEFAULT_POOL_SIZE);
        assert_eq!(settings.delivery_fee, DEFAULT_DELIVERY_FEE);
        assert!(settings.require_slip_amount_match);
    }

    #[test]
    fn database_url_is_required() {
        assert_eq!(
            settings(&[]).unwrap_err(),
            SettingsError::Missing("DATABASE_URL")
        );
    }

    #[test]
    fn negative_delivery_fee_is_rejected() {
        let err = settings(&[("DATABASE_URL", "postgres://x"), ("DELIVERY_FEE", "-5")]);
        assert!(matches!(
            err,
            Err(SettingsError::Invalid {
                name: "DELIVERY_FEE",
                ..
            })
        ));
    }

    #[test]
    fn overrides_are_parsed() {
        let settings = settings(&[
            ("DATABASE_URL", "postgres://x"),
            ("DATABASE_POOL_SIZE", "4"),
            ("DELIVERY_FEE", "35"),
            ("REQUIRE_SLIP_AMOUNT_MATCH", "false"),
        ])
        .unwrap();
        assert_eq!(settings.pool_size, 4);
        assert_eq!(settings.delivery_fee, 35);
        assert!(!settings.require_slip_amount_match);
    }
}
