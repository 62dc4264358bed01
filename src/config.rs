use crate::services::address::DEFAULT_TAIL_DIGITS;
use crate::services::identity::ConfiguredIdentity;
use crate::services::EngineOptions;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

#[derive(Clone, Debug)]
pub struct Settings {
    pub db_path: PathBuf,
    pub bind_addr: String,
    pub cache_dir: PathBuf,
    pub pool_size: u32,
    pub inbound_box: i64,
    pub tail_digits: usize,
    pub allow_thread_create: bool,
    pub package_name: Option<String>,
    pub default_sms_package: Option<String>,
}

impl Settings {
    /// Reads `MMS_*` variables (after `.env` has been loaded).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let home = get("HOME").unwrap_or_else(|| ".".to_string());
        let db_path = get("MMS_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(home).join(".mms-media").join("mmssms.db"));
        let cache_dir = get("MMS_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("mms-media-cache"));

        Settings {
            db_path,
            bind_addr: get("MMS_BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3884".to_string()),
            cache_dir,
            pool_size: parse_or(&get, "MMS_POOL_SIZE", 4),
            inbound_box: parse_or(&get, "MMS_INBOUND_BOX", 1),
            tail_digits: parse_or(&get, "MMS_TAIL_DIGITS", DEFAULT_TAIL_DIGITS),
            allow_thread_create: parse_or(&get, "MMS_ALLOW_THREAD_CREATE", false),
            package_name: get("MMS_PACKAGE_NAME"),
            default_sms_package: get("MMS_DEFAULT_SMS_PACKAGE"),
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            inbound_box: self.inbound_box,
            tail_digits: self.tail_digits,
        }
    }

    pub fn identity(&self) -> ConfiguredIdentity {
        ConfiguredIdentity {
            package_name: self.package_name.clone(),
            default_sms_package: self.default_sms_package.clone(),
        }
    }
}

fn parse_or<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match get(key) {
        Some(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    target: "server",
                    key,
                    value = raw.as_str(),
                    "Invalid setting, using default"
                );
                default
            }
        },
        None => default,
    }
}
