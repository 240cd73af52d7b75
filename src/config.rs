//! Connection settings and client options

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// IGV, the default sales tax applied to the cart
pub const DEFAULT_TAX_RATE: f64 = 0.18;

/// Where the database and auth service live
#[derive(Debug, Clone)]
pub struct PosConfig {
    /// The project base URL
    pub url: Url,
    /// The anonymous API key
    pub anon_key: String,
}

impl PosConfig {
    pub fn new(url: &str, anon_key: &str) -> Result<Self> {
        let url = Url::parse(url)?;
        if anon_key.trim().is_empty() {
            return Err(Error::config("anon_key cannot be empty"));
        }
        Ok(Self {
            url,
            anon_key: anon_key.to_string(),
        })
    }

    /// Read `SUPABASE_URL` and `SUPABASE_ANON_KEY`
    pub fn from_env() -> Result<Self> {
        let url = env::var("SUPABASE_URL")
            .map_err(|_| Error::config("SUPABASE_URL environment variable not set"))?;
        let anon_key = env::var("SUPABASE_ANON_KEY")
            .map_err(|_| Error::config("SUPABASE_ANON_KEY environment variable not set"))?;
        Self::new(&url, &anon_key)
    }

    /// Base URL without the trailing slash `Url` adds
    pub fn base_url(&self) -> &str {
        self.url.as_str().trim_end_matches('/')
    }
}

/// Behaviour knobs of the point-of-sale client
#[derive(Debug, Clone)]
pub struct PosOptions {
    /// Tax applied on the cart subtotal
    pub tax_rate: f64,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Period of the per-second clock shown on order cards
    pub clock_interval: Duration,

    /// Period of the floor refresh
    pub refresh_interval: Duration,

    /// Keep the signed-in session in memory
    pub persist_session: bool,
}

impl Default for PosOptions {
    fn default() -> Self {
        Self {
            tax_rate: DEFAULT_TAX_RATE,
            request_timeout: Some(Duration::from_secs(30)),
            clock_interval: Duration::from_secs(1),
            refresh_interval: Duration::from_secs(60),
            persist_session: true,
        }
    }
}

impl PosOptions {
    /// Defaults overridden by `POS_TAX_RATE` when set
    pub fn from_env() -> Result<Self> {
        let options = Self::default();
        match env::var("POS_TAX_RATE") {
            Ok(raw) => {
                let rate = raw
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| Error::config(format!("POS_TAX_RATE is not a number: {}", raw)))?;
                options.with_tax_rate(rate)
            }
            Err(_) => Ok(options),
        }
    }

    /// Set the tax rate (a fraction, `0.18` for 18 %)
    pub fn with_tax_rate(mut self, value: f64) -> Result<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::config(format!("invalid tax rate: {}", value)));
        }
        self.tax_rate = value;
        Ok(self)
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    pub fn with_clock_interval(mut self, value: Duration) -> Self {
        self.clock_interval = value;
        self
    }

    pub fn with_refresh_interval(mut self, value: Duration) -> Self {
        self.refresh_interval = value;
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }
}
