use lazy_static::lazy_static;
use wasm_bindgen::JsValue;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const DEFAULT_APP_NAME: &str = "YouTube Comment Sentiment";

lazy_static! {
    pub static ref BACKEND_URL: String = backend_url(env_var("BACKEND_URL"));
    pub static ref APP_NAME: String = app_name(env_var("APP_NAME"));
}

/// Reads one key of the `window.ENV_CONFIG` object injected by `index.html`.
fn env_var(key: &str) -> Option<String> {
    let window = web_sys::window()?;
    let env_config = js_sys::Reflect::get(&window, &JsValue::from_str("ENV_CONFIG")).ok()?;
    if env_config.is_undefined() {
        log::warn!("ENV_CONFIG is missing, using built-in defaults");
        return None;
    }

    js_sys::Reflect::get(&env_config, &JsValue::from_str(key))
        .ok()
        .and_then(|value| value.as_string())
}

/// Blank values fall back to the local backend; request paths always start with `/`.
pub fn backend_url(configured: Option<String>) -> String {
    configured
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
}

pub fn app_name(configured: Option<String>) -> String {
    configured
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_APP_NAME.to_string())
}
