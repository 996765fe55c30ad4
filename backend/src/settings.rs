//! Runtime configuration loaded via OrthoConfig.
//!
//! Values come from `FARMWISE_*` environment variables, CLI flags or a config
//! file. Secrets have no defaults; [`FarmwiseSettings::secrets`] fails when
//! any of them is missing so startup aborts before binding.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::domain::{DuplicateAwardPolicy, PlanPricing};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co/";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_PREMIUM_PRICE_MINOR: u64 = 500_000;
const DEFAULT_PRO_PRICE_MINOR: u64 = 1_500_000;
const DEFAULT_JWT_TTL_HOURS: u64 = 24 * 7;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Errors raised while turning raw settings into runtime values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid URL in {name}: {message}")]
    InvalidUrl { name: &'static str, message: String },
    #[error("invalid {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Backend configuration.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FARMWISE")]
pub struct FarmwiseSettings {
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    #[ortho_config(default = 10)]
    pub database_max_connections: u32,
    /// Interface to bind.
    pub host: Option<IpAddr>,
    /// Port to bind.
    #[ortho_config(default = 8080)]
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub gemini_base_url: Option<String>,
    pub paystack_secret_key: Option<String>,
    pub paystack_base_url: Option<String>,
    /// Premium plan price in kobo.
    pub premium_price_minor: Option<u64>,
    /// Pro plan price in kobo.
    pub pro_price_minor: Option<u64>,
    pub jwt_secret: Option<String>,
    pub jwt_ttl_hours: Option<u64>,
    /// Base URL of the web client used for payment redirects.
    pub frontend_url: Option<String>,
    /// Gateway callback; defaults to this server's verify endpoint.
    pub callback_url: Option<String>,
    /// `once_per_badge` or `allow_duplicates`.
    pub award_policy: Option<String>,
    /// Timeout for outbound HTTP calls.
    pub http_timeout_secs: Option<u64>,
}

/// Secrets that must be present before the server starts.
pub struct RuntimeSecrets {
    /// PostgreSQL connection string.
    pub database_url: String,
    pub gemini_api_key: Zeroizing<String>,
    pub paystack_secret_key: Zeroizing<String>,
    pub jwt_secret: Zeroizing<String>,
}

fn required(value: Option<&String>, name: &'static str) -> Result<String, SettingsError> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .ok_or(SettingsError::Missing(name))
}

fn parse_url(raw: &str, name: &'static str) -> Result<Url, SettingsError> {
    Url::parse(raw).map_err(|err| SettingsError::InvalidUrl {
        name,
        message: err.to_string(),
    })
}

impl FarmwiseSettings {
    /// Collect every required secret, naming the first one missing.
    pub fn secrets(&self) -> Result<RuntimeSecrets, SettingsError> {
        Ok(RuntimeSecrets {
            database_url: required(self.database_url.as_ref(), "FARMWISE_DATABASE_URL")?,
            gemini_api_key: Zeroizing::new(required(
                self.gemini_api_key.as_ref(),
                "FARMWISE_GEMINI_API_KEY",
            )?),
            paystack_secret_key: Zeroizing::new(required(
                self.paystack_secret_key.as_ref(),
                "FARMWISE_PAYSTACK_SECRET_KEY",
            )?),
            jwt_secret: Zeroizing::new(required(self.jwt_secret.as_ref(), "FARMWISE_JWT_SECRET")?),
        })
    }

    /// Listener address; host defaults to all interfaces, port to 5000.
    pub fn bind_addr(&self) -> SocketAddr {
        let host = self.host.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        let port = if self.port == 0 { DEFAULT_PORT } else { self.port };
        SocketAddr::new(host, port)
    }

    /// Model name used for `generateContent` calls.
    pub fn gemini_model(&self) -> &str {
        self.gemini_model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL)
    }

    /// Gemini API root, validated as a URL.
    pub fn gemini_base_url(&self) -> Result<Url, SettingsError> {
        parse_url(
            self.gemini_base_url
                .as_deref()
                .unwrap_or(DEFAULT_GEMINI_BASE_URL),
            "FARMWISE_GEMINI_BASE_URL",
        )
    }

    /// Paystack API root, validated as a URL.
    pub fn paystack_base_url(&self) -> Result<Url, SettingsError> {
        parse_url(
            self.paystack_base_url
                .as_deref()
                .unwrap_or(DEFAULT_PAYSTACK_BASE_URL),
            "FARMWISE_PAYSTACK_BASE_URL",
        )
    }

    /// Plan prices, falling back to the built-in NGN defaults.
    pub fn pricing(&self) -> PlanPricing {
        PlanPricing {
            premium_minor: self
                .premium_price_minor
                .unwrap_or(DEFAULT_PREMIUM_PRICE_MINOR),
            pro_minor: self.pro_price_minor.unwrap_or(DEFAULT_PRO_PRICE_MINOR),
        }
    }

    /// Token lifetime; seven days unless configured.
    pub fn jwt_ttl(&self) -> Duration {
        Duration::from_secs(self.jwt_ttl_hours.unwrap_or(DEFAULT_JWT_TTL_HOURS) * 3600)
    }

    /// Frontend base URL for payment redirects.
    pub fn frontend_url(&self) -> &str {
        self.frontend_url.as_deref().unwrap_or(DEFAULT_FRONTEND_URL)
    }

    /// Configured callback, or `http://localhost:{port}/api/subscriptions/verify`.
    pub fn callback_url(&self) -> String {
        self.callback_url.clone().unwrap_or_else(|| {
            format!(
                "http://localhost:{}/api/subscriptions/verify",
                self.bind_addr().port()
            )
        })
    }

    /// Parsed badge policy; unknown values are configuration errors.
    pub fn award_policy(&self) -> Result<DuplicateAwardPolicy, SettingsError> {
        self.award_policy
            .as_deref()
            .map_or(Ok(DuplicateAwardPolicy::default()), |raw| {
                raw.parse().map_err(|err: crate::domain::premium::UnknownAwardPolicy| {
                    SettingsError::Invalid {
                        name: "FARMWISE_AWARD_POLICY",
                        message: err.to_string(),
                    }
                })
            })
    }

    /// Timeout applied to Gemini and Paystack calls.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(
            self.http_timeout_secs
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    //! Configuration parsing against a locked environment.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 8] = [
        "FARMWISE_DATABASE_URL",
        "FARMWISE_GEMINI_API_KEY",
        "FARMWISE_PAYSTACK_SECRET_KEY",
        "FARMWISE_JWT_SECRET",
        "FARMWISE_PORT",
        "FARMWISE_AWARD_POLICY",
        "FARMWISE_PREMIUM_PRICE_MINOR",
        "FARMWISE_FRONTEND_URL",
    ];

    fn load() -> FarmwiseSettings {
        FarmwiseSettings::load_from_iter([OsString::from("farmwise")]).expect("config should load")
    }

    fn cleared() -> Vec<(&'static str, Option<String>)> {
        VARS.iter().map(|name| (*name, None)).collect()
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(cleared());

        let settings = load();
        assert_eq!(settings.bind_addr().port(), 8080);
        assert_eq!(settings.gemini_model(), DEFAULT_GEMINI_MODEL);
        assert_eq!(settings.pricing().premium_minor, DEFAULT_PREMIUM_PRICE_MINOR);
        assert_eq!(settings.frontend_url(), DEFAULT_FRONTEND_URL);
        assert_eq!(
            settings.award_policy().expect("policy"),
            DuplicateAwardPolicy::OncePerBadge
        );
        assert_eq!(
            settings.callback_url(),
            "http://localhost:8080/api/subscriptions/verify"
        );
    }

    #[rstest]
    fn missing_secret_is_named() {
        let mut vars = cleared();
        vars[0].1 = Some("postgres://localhost/farmwise".to_owned());
        let _guard = lock_env(vars);

        let err = load().secrets().err().expect("secrets should be missing");
        assert_eq!(err, SettingsError::Missing("FARMWISE_GEMINI_API_KEY"));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("FARMWISE_DATABASE_URL", Some("postgres://db/farmwise".to_owned())),
            ("FARMWISE_GEMINI_API_KEY", Some("gemini".to_owned())),
            ("FARMWISE_PAYSTACK_SECRET_KEY", Some("sk_live".to_owned())),
            ("FARMWISE_JWT_SECRET", Some("jwt".to_owned())),
            ("FARMWISE_PORT", Some("9090".to_owned())),
            ("FARMWISE_AWARD_POLICY", Some("allow_duplicates".to_owned())),
            ("FARMWISE_PREMIUM_PRICE_MINOR", Some("250000".to_owned())),
            ("FARMWISE_FRONTEND_URL", Some("https://farmwise.example".to_owned())),
        ]);

        let settings = load();
        let secrets = settings.secrets().expect("secrets");
        assert_eq!(secrets.database_url, "postgres://db/farmwise");
        assert_eq!(secrets.jwt_secret.as_str(), "jwt");
        assert_eq!(settings.bind_addr().port(), 9090);
        assert_eq!(settings.pricing().premium_minor, 250_000);
        assert_eq!(settings.frontend_url(), "https://farmwise.example");
        assert_eq!(
            settings.award_policy().expect("policy"),
            DuplicateAwardPolicy::AllowDuplicates
        );
    }

    #[rstest]
    fn unknown_award_policy_is_rejected() {
        let mut vars = cleared();
        vars[5].1 = Some("sometimes".to_owned());
        let _guard = lock_env(vars);

        assert!(matches!(
            load().award_policy(),
            Err(SettingsError::Invalid { name: "FARMWISE_AWARD_POLICY", .. })
        ));
    }
}
