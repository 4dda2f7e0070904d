//! Server configuration, read from `TRIPMATE_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use tripmate_auth::AuthConfig;
use tripmate_db::DbConfig;
use tripmate_service::{PaymentConfig, PlanConfig};

use crate::collaborators::assets::AssetConfig;
use crate::collaborators::payment::StripeConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything the server binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub db: DbConfig,
    pub auth: AuthConfig,
    pub plans: PlanConfig,
    pub payment: PaymentConfig,
    pub assets: AssetConfig,
    /// Stripe credentials. Without them the sandbox provider is used.
    pub stripe: Option<StripeConfig>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let db_defaults = DbConfig::default();
        let db = DbConfig {
            url: env.string("TRIPMATE_DB_URL").unwrap_or(db_defaults.url),
            namespace: env
                .string("TRIPMATE_DB_NAMESPACE")
                .unwrap_or(db_defaults.namespace),
            database: env
                .string("TRIPMATE_DB_DATABASE")
                .unwrap_or(db_defaults.database),
            username: env.string("TRIPMATE_DB_USER").unwrap_or(db_defaults.username),
            password: env.string("TRIPMATE_DB_PASS").unwrap_or(db_defaults.password),
        };

        let auth_defaults = AuthConfig::default();
        let auth = AuthConfig {
            jwt_public_key_pem: env
                .pem("TRIPMATE_JWT_PUBLIC_KEY", "TRIPMATE_JWT_PUBLIC_KEY_PATH")?
                .ok_or(ConfigError::Missing("TRIPMATE_JWT_PUBLIC_KEY"))?,
            jwt_private_key_pem: env
                .pem("TRIPMATE_JWT_PRIVATE_KEY", "TRIPMATE_JWT_PRIVATE_KEY_PATH")?
                .unwrap_or_default(),
            access_token_lifetime_secs: env
                .parse("TRIPMATE_ACCESS_TOKEN_TTL_SECS")?
                .unwrap_or(auth_defaults.access_token_lifetime_secs),
            jwt_issuer: env
                .string("TRIPMATE_JWT_ISSUER")
                .unwrap_or(auth_defaults.jwt_issuer),
            resolver_timeout_ms: env
                .parse("TRIPMATE_RESOLVER_TIMEOUT_MS")?
                .unwrap_or(auth_defaults.resolver_timeout_ms),
        };

        let plan_defaults = PlanConfig::default();
        let plans = PlanConfig {
            free_active_plan_limit: env
                .parse("TRIPMATE_FREE_PLAN_LIMIT")?
                .unwrap_or(plan_defaults.free_active_plan_limit),
            max_image_bytes: env
                .parse("TRIPMATE_MAX_IMAGE_BYTES")?
                .unwrap_or(plan_defaults.max_image_bytes),
        };

        let payment_defaults = PaymentConfig::default();
        let payment = PaymentConfig {
            monthly_price_cents: env
                .parse("TRIPMATE_PRICE_MONTHLY_CENTS")?
                .unwrap_or(payment_defaults.monthly_price_cents),
            yearly_price_cents: env
                .parse("TRIPMATE_PRICE_YEARLY_CENTS")?
                .unwrap_or(payment_defaults.yearly_price_cents),
            currency: env
                .string("TRIPMATE_CURRENCY")
                .map(|c| c.to_ascii_lowercase())
                .unwrap_or(payment_defaults.currency),
        };
        if payment.monthly_price_cents <= 0 || payment.yearly_price_cents <= 0 {
            return Err(ConfigError::Invalid {
                var: "TRIPMATE_PRICE_*_CENTS",
                value: format!(
                    "{}/{}",
                    payment.monthly_price_cents, payment.yearly_price_cents
                ),
            });
        }

        let asset_defaults = AssetConfig::default();
        let assets = AssetConfig {
            dir: env
                .string("TRIPMATE_ASSET_DIR")
                .map(PathBuf::from)
                .unwrap_or(asset_defaults.dir),
            public_base_url: env
                .string("TRIPMATE_ASSET_BASE_URL")
                .unwrap_or(asset_defaults.public_base_url),
        };

        let stripe = match env.string("TRIPMATE_STRIPE_SECRET_KEY") {
            Some(secret_key) => {
                let defaults = StripeConfig::default();
                Some(StripeConfig {
                    secret_key,
                    api_base: env
                        .string("TRIPMATE_STRIPE_API_BASE")
                        .unwrap_or(defaults.api_base),
                    success_url: env
                        .string("TRIPMATE_STRIPE_SUCCESS_URL")
                        .unwrap_or(defaults.success_url),
                    cancel_url: env
                        .string("TRIPMATE_STRIPE_CANCEL_URL")
                        .unwrap_or(defaults.cancel_url),
                })
            }
            None => None,
        };

        Ok(Self {
            bind_addr: env
                .parse("TRIPMATE_BIND")?
                .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080))),
            db,
            auth,
            plans,
            payment,
            assets,
            stripe,
        })
    }
}

struct Env<'a, F>(&'a F);

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Non-blank value of `var`.
    fn string(&self, var: &str) -> Option<String> {
        (self.0)(var).filter(|v| !v.trim().is_empty())
    }

    fn parse<T: std::str::FromStr>(&self, var: &'static str) -> Result<Option<T>, ConfigError> {
        self.string(var)
            .map(|value| {
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid { var, value })
            })
            .transpose()
    }

    /// A PEM given inline, or read from a file.
    fn pem(&self, inline: &'static str, path: &'static str) -> Result<Option<String>, ConfigError> {
        if let Some(pem) = self.string(inline) {
            return Ok(Some(pem.replace("\\n", "\n")));
        }
        match self.string(path) {
            Some(path) => {
                let path = PathBuf::from(path);
                std::fs::read_to_string(&path)
                    .map(Some)
                    .map_err(|source| ConfigError::Io { path, source })
            }
            None => Ok(None),
        }
    }
}
