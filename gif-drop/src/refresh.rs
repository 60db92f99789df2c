//! Browser source refresh.

use serde_json::{Map, Value};

/// Settings key holding the page URL.
pub const URL_KEY: &str = "url";
/// Settings key holding the custom CSS.
pub const CSS_KEY: &str = "css";

/// Point a browser source's settings at `gif_url`.
///
/// The custom CSS gets a timestamped comment appended so the host sees a
/// changed setting and reloads the page even when the URL is unchanged.
pub fn refresh_settings(settings: &mut Map<String, Value>, gif_url: &str, stamp_ms: i64) {
    settings.insert(URL_KEY.to_string(), Value::String(gif_url.to_string()));

    let css = settings
        .get(CSS_KEY)
        .and_then(Value::as_str)
        .unwrap_or_default();
    let css = format!("{css}\n/* trigger update: {stamp_ms} */");
    settings.insert(CSS_KEY.to_string(), Value::String(css));
}
