//! Build-time configuration for the console API and the human-verification
//! widget, with an optional runtime override. In the browser the runtime config
//! is read from `window.RISKGUARD_CONFIG` (if present) so static deployments can
//! change endpoints without rebuilding. Configuration values are public; do not
//! store secrets here.

/// Storage key holding the serialized session when nothing else is configured.
pub const DEFAULT_SESSION_STORAGE_KEY: &str = "riskguard.session";
/// Setting endpoint returning the number of failed sign-ins tolerated before a
/// challenge is required.
pub const DEFAULT_CAPTCHA_THRESHOLD_PATH: &str = "/settings/captcha/max-failed-attempts";

/// Frontend configuration derived from build-time environment variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub captcha_site_key: String,
    pub session_storage_key: String,
    pub captcha_threshold_path: String,
}

impl AppConfig {
    /// Loads config from build-time environment variables and applies runtime overrides.
    #[must_use]
    pub fn load() -> Self {
        let api_base_url = option_env!("RISKGUARD_API_BASE_URL").unwrap_or("");
        let captcha_site_key = option_env!("RISKGUARD_CAPTCHA_SITE_KEY").unwrap_or("");
        let session_storage_key =
            option_env!("RISKGUARD_SESSION_STORAGE_KEY").unwrap_or(DEFAULT_SESSION_STORAGE_KEY);
        let captcha_threshold_path = option_env!("RISKGUARD_CAPTCHA_THRESHOLD_PATH")
            .unwrap_or(DEFAULT_CAPTCHA_THRESHOLD_PATH);

        let mut config = Self {
            api_base_url: api_base_url.to_string(),
            captcha_site_key: captcha_site_key.to_string(),
            session_storage_key: session_storage_key.to_string(),
            captcha_threshold_path: captcha_threshold_path.to_string(),
        };

        if let Some(runtime) = runtime_config() {
            apply_runtime_overrides(&mut config, runtime);
        }

        config
    }

    /// Returns a copy pointing at another API base URL, keeping the other settings.
    #[must_use]
    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }
}

#[derive(Default)]
struct RuntimeConfig {
    api_base_url: Option<String>,
    captcha_site_key: Option<String>,
    session_storage_key: Option<String>,
    captcha_threshold_path: Option<String>,
}

fn apply_runtime_overrides(config: &mut AppConfig, runtime: RuntimeConfig) {
    if let Some(value) = runtime.api_base_url {
        config.api_base_url = value;
    }
    if let Some(value) = runtime.captcha_site_key {
        config.captcha_site_key = value;
    }
    if let Some(value) = runtime.session_storage_key {
        config.session_storage_key = value;
    }
    if let Some(value) = runtime.captcha_threshold_path {
        config.captcha_threshold_path = value;
    }
}

#[cfg(target_arch = "wasm32")]
fn runtime_config() -> Option<RuntimeConfig> {
    use js_sys::{Object, Reflect};
    use wasm_bindgen::JsValue;

    let window = web_sys::window()?;
    let config = Reflect::get(&window, &JsValue::from_str("RISKGUARD_CONFIG")).ok()?;
    if config.is_null() || config.is_undefined() {
        return None;
    }
    let object = Object::from(config);

    Some(RuntimeConfig {
        api_base_url: read_runtime_value(&object, "api_base_url"),
        captcha_site_key: read_runtime_value(&object, "captcha_site_key"),
        session_storage_key: read_runtime_value(&object, "session_storage_key"),
        captcha_threshold_path: read_runtime_value(&object, "captcha_threshold_path"),
    })
}

#[cfg(not(target_arch = "wasm32"))]
fn runtime_config() -> Option<RuntimeConfig> {
    None
}

#[cfg(target_arch = "wasm32")]
fn read_runtime_value(object: &js_sys::Object, key: &str) -> Option<String> {
    let value = js_sys::Reflect::get(object, &wasm_bindgen::JsValue::from_str(key))
        .ok()?
        .as_string()?;
    normalize_runtime_value(&value)
}

fn normalize_runtime_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
