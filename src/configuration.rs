use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use config::{Config, Environment, File};

use crate::domain::{AmountRange, CardSelection};
use crate::payment_gateway::{Endpoint, GatewayEndpoints, MerchantIdentifiers, PaymentGatewayClient};
use crate::scheduler::Schedule;
use crate::synthetic_data::SyntheticDataProvider;

#[derive(Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub scheduler: SchedulerSettings,
    pub data_sources: DataSourceSettings,
    pub gateway: GatewaySettings,
}

#[derive(Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct SchedulerSettings {
    pub run_interval_seconds: u64,
    pub run_jitter_seconds: u64,
    pub iterations_per_run: u32,
    pub enable_loop: bool,
    pub loop_start_delay_seconds: u64,
    pub pacing_seconds: u64,
}

impl SchedulerSettings {
    pub fn schedule(&self) -> Schedule {
        Schedule {
            interval: Duration::from_secs(self.run_interval_seconds),
            jitter: Duration::from_secs(self.run_jitter_seconds),
            iterations: self.iterations_per_run,
            start_delay: Duration::from_secs(self.loop_start_delay_seconds),
        }
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_secs(self.pacing_seconds)
    }
}

#[derive(Clone, Debug)]
pub struct DataSourceSettings {
    /// `None` disables the profile dataset altogether.
    pub csv_path: Option<PathBuf>,
    pub cards_path: PathBuf,
    pub card_selection: CardSelection,
    pub synthetic_data_seed: Option<u64>,
}

impl DataSourceSettings {
    pub fn synthetic_data(&self) -> SyntheticDataProvider {
        match self.synthetic_data_seed {
            Some(seed) => SyntheticDataProvider::seeded(seed),
            None => SyntheticDataProvider::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GatewaySettings {
    pub client_id: String,
    pub form_id: String,
    pub merchant_id: String,
    pub tokenization_url: String,
    pub checkout_url: String,
    pub payment_url: String,
    pub tokenization_timeout_milliseconds: u64,
    pub checkout_timeout_milliseconds: u64,
    pub payment_timeout_milliseconds: u64,
    pub amount_min: u32,
    pub amount_max: u32,
}

impl GatewaySettings {
    pub fn client(&self) -> Result<PaymentGatewayClient, reqwest::Error> {
        let endpoints = GatewayEndpoints {
            tokenization: Endpoint {
                url: self.tokenization_url.clone(),
                timeout: self.tokenization_timeout(),
            },
            checkout: Endpoint {
                url: self.checkout_url.clone(),
                timeout: self.checkout_timeout(),
            },
            payment: Endpoint {
                url: self.payment_url.clone(),
                timeout: self.payment_timeout(),
            },
        };
        PaymentGatewayClient::new(self.identifiers(), endpoints)
    }

    pub fn identifiers(&self) -> MerchantIdentifiers {
        MerchantIdentifiers {
            client_id: self.client_id.clone(),
            form_id: self.form_id.clone(),
            merchant_id: self.merchant_id.clone(),
        }
    }

    pub fn tokenization_timeout(&self) -> Duration {
        Duration::from_millis(self.tokenization_timeout_milliseconds)
    }

    pub fn checkout_timeout(&self) -> Duration {
        Duration::from_millis(self.checkout_timeout_milliseconds)
    }

    pub fn payment_timeout(&self) -> Duration {
        Duration::from_millis(self.payment_timeout_milliseconds)
    }

    pub fn amount_range(&self) -> AmountRange {
        AmountRange::new(self.amount_min, self.amount_max)
    }
}

pub const DEFAULT_TOKENIZATION_URL: &str =
    "https://pay.sandbox.datatrans.com/upp/payment/SecureFields/paymentField";
pub const DEFAULT_CHECKOUT_URL: &str =
    "https://checkout-api-dev.payintelli.com/api/v1/checkout/create";
pub const DEFAULT_PAYMENT_URL: &str = "https://api-dev.payintelli.com/api/v1/payments/create";

/// Resolve the settings from `configuration/base.yaml` (optional) and the
/// process environment, the latter taking precedence.
///
/// Resolution never fails: unreadable sources and invalid values are
/// reported as warnings and replaced by defaults.
pub fn get_configuration() -> Settings {
    let base_path = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    configuration_from(&base_path, Environment::default())
}

/// Layer `environment` over `configuration/base.yaml` below `base_path`.
fn configuration_from(base_path: &Path, environment: Environment) -> Settings {
    let configuration_file = base_path.join("configuration").join("base.yaml");

    let source = Config::builder()
        .add_source(File::from(configuration_file).required(false))
        .add_source(environment.clone())
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(
                error.cause_chain = ?e,
                error.message = %e,
                "Failed to read the configuration file, using the environment only"
            );
            Config::builder()
                .add_source(environment)
                .build()
                .unwrap_or_default()
        });
    Settings::from_source(&source)
}

impl Settings {
    pub fn from_source(source: &Config) -> Self {
        let source = SettingsSource(source);
        Self {
            application: ApplicationSettings {
                host: source.text("host", "0.0.0.0"),
                port: source.number("port", 8080),
            },
            scheduler: SchedulerSettings {
                run_interval_seconds: source.number("run_interval_seconds", 300),
                run_jitter_seconds: source.number("run_jitter_seconds", 120),
                iterations_per_run: source.number("iterations_per_run", 2),
                enable_loop: source.flag("enable_loop", true),
                loop_start_delay_seconds: source.number("loop_start_delay_seconds", 5),
                pacing_seconds: source.number("pacing_seconds", 20),
            },
            data_sources: DataSourceSettings {
                csv_path: source.optional_path("csv_path", "data/Client002.csv"),
                cards_path: PathBuf::from(source.text("cards_path", "config/cards.json")),
                card_selection: source.parsed("card_selection", CardSelection::Random),
                synthetic_data_seed: source.optional_number("synthetic_data_seed"),
            },
            gateway: GatewaySettings {
                client_id: source.text("client_id", "client_002"),
                form_id: source.text("form_id", "250729103005965673"),
                merchant_id: source.text("merchant_id", "1110020135"),
                tokenization_url: source.text("tokenization_url", DEFAULT_TOKENIZATION_URL),
                checkout_url: source.text("checkout_url", DEFAULT_CHECKOUT_URL),
                payment_url: source.text("payment_url", DEFAULT_PAYMENT_URL),
                tokenization_timeout_milliseconds: source
                    .number("tokenization_timeout_milliseconds", 30_000),
                checkout_timeout_milliseconds: source
                    .number("checkout_timeout_milliseconds", 60_000),
                payment_timeout_milliseconds: source
                    .number("payment_timeout_milliseconds", 60_000),
                amount_min: source.number("amount_min", 1),
                amount_max: source.number("amount_max", 4000),
            },
        }
    }
}

/// Key-by-key view over a `Config`. Every key is looked up in lowercase.
struct SettingsSource<'a>(&'a Config);

impl SettingsSource<'_> {
    /// The value of `key` if it is set to something other than whitespace.
    fn raw(&self, key: &str) -> Option<String> {
        self.0
            .get_string(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn text(&self, key: &str, default: &str) -> String {
        self.raw(key).unwrap_or_else(|| default.to_string())
    }

    fn number<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr + std::fmt::Display,
    {
        let Some(raw) = self.raw(key) else {
            return default;
        };
        raw.parse().unwrap_or_else(|_| {
            tracing::warn!(
                key,
                value = %raw,
                default = %default,
                "Invalid number in configuration, falling back to the default"
            );
            default
        })
    }

    fn optional_number<T: FromStr>(&self, key: &str) -> Option<T> {
        let raw = self.raw(key)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(key, value = %raw, "Invalid number in configuration, ignoring it");
                None
            }
        }
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        match self.raw(key) {
            Some(raw) => raw.eq_ignore_ascii_case("true"),
            None => default,
        }
    }

    fn parsed<T>(&self, key: &str, default: T) -> T
    where
        T: TryFrom<String, Error = String> + std::fmt::Display,
    {
        let Some(raw) = self.raw(key) else {
            return default;
        };
        T::try_from(raw).unwrap_or_else(|e| {
            tracing::warn!(key, default = %default, "{}", e);
            default
        })
    }

    /// Unset keys fall back to `default`; an explicitly empty value
    /// disables the path.
    fn optional_path(&self, key: &str, default: &str) -> Option<PathBuf> {
        match self.0.get_string(key) {
            Ok(v) if v.trim().is_empty() => None,
            Ok(v) => Some(PathBuf::from(v.trim())),
            Err(_) => Some(PathBuf::from(default)),
        }
    }
}
