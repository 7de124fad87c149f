//! URL state encoding/decoding for shareable URLs.
//!
//! Encodes the data source and the view transform in the URL query string
//! so reloading restores the view and URLs can be shared.

use super::view::ViewTransform;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters escaped in query values. Path and file name punctuation stays
/// readable; `&`, `=`, `?`, `#` and `%` are always escaped.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/')
    .remove(b':');

/// Parsed URL parameters.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UrlParams {
    pub data: Option<String>,
    pub k: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl UrlParams {
    /// Parses a query string, with or without the leading `?`. Unknown keys
    /// and unparsable numbers are ignored.
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    pub fn from_query(search: &str) -> Self {
        let mut params = Self::default();

        let query = search.trim_start_matches('?');
        if query.is_empty() {
            return params;
        }

        for pair in query.split('&') {
            let mut kv = pair.splitn(2, '=');
            let key = kv.next().unwrap_or("");
            let value = kv.next().unwrap_or("");
            match key {
                "data" if !value.is_empty() => params.data = decode_value(value),
                "k" => params.k = parse_finite(value),
                "x" => params.x = parse_finite(value),
                "y" => params.y = parse_finite(value),
                _ => {}
            }
        }

        params
    }

    /// The view encoded in the URL, if any part of it was given.
    pub fn transform(&self) -> Option<ViewTransform> {
        if self.k.is_none() && self.x.is_none() && self.y.is_none() {
            return None;
        }
        Some(ViewTransform::new(
            self.k.unwrap_or(1.0),
            self.x.unwrap_or(0.0),
            self.y.unwrap_or(0.0),
        ))
    }
}

fn decode_value(value: &str) -> Option<String> {
    match percent_decode_str(value).decode_utf8() {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(e) => {
            log::warn!("Ignoring URL value {:?}: {}", value, e);
            None
        }
    }
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Builds the query string for a view.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub fn to_query(data: &str, t: &ViewTransform) -> String {
    format!(
        "?data={}&k={:.4}&x={:.2}&y={:.2}",
        utf8_percent_encode(data, QUERY_VALUE),
        t.k,
        t.x,
        t.y
    )
}

/// Parse URL query parameters from the current browser URL.
#[cfg(target_arch = "wasm32")]
pub fn parse_from_url() -> UrlParams {
    let Some(window) = web_sys::window() else {
        return UrlParams::default();
    };
    match window.location().search() {
        Ok(search) => UrlParams::from_query(&search),
        Err(_) => UrlParams::default(),
    }
}

/// No-op stub for native builds.
#[cfg(not(target_arch = "wasm32"))]
pub fn parse_from_url() -> UrlParams {
    UrlParams::default()
}

/// Push the current view to the URL query string using `replaceState`.
#[cfg(target_arch = "wasm32")]
pub fn push_to_url(data: &str, t: &ViewTransform) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(history) = window.history() else {
        return;
    };
    let query = to_query(data, t);
    if let Err(e) =
        history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(&query))
    {
        log::warn!("Failed to update URL: {:?}", e);
    }
}

/// No-op stub for native builds.
#[cfg(not(target_arch = "wasm32"))]
pub fn push_to_url(_data: &str, _t: &ViewTransform) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_query() {
        let params = UrlParams::from_query("?data=us.json&k=2&x=-100.5&y=-50");
        assert_eq!(params.data.as_deref(), Some("us.json"));
        assert_eq!(
            params.transform(),
            Some(ViewTransform::new(2.0, -100.5, -50.0))
        );
    }

    #[test]
    fn test_parse_ignores_junk() {
        let params = UrlParams::from_query("k=abc&x=inf&foo=bar&data=");
        assert_eq!(params, UrlParams::default());
        assert_eq!(params.transform(), None);
        assert_eq!(UrlParams::from_query(""), UrlParams::default());
    }

    #[test]
    fn test_data_with_reserved_characters_round_trips() {
        let data = "https://tiles.example.com/us.json?v=2&fmt=topo#top 50%";
        let t = ViewTransform::new(2.0, -10.0, -20.0);
        let query = to_query(data, &t);

        assert_eq!(query.matches('&').count(), 3);
        assert!(query.starts_with("?data=https://tiles.example.com/us.json%3Fv%3D2%26"));

        let params = UrlParams::from_query(&query);
        assert_eq!(params.data.as_deref(), Some(data));
        assert_eq!(params.transform(), Some(t));
    }

    #[test]
    fn test_invalid_utf8_data_is_ignored() {
        let params = UrlParams::from_query("?data=%FF%FE&k=2");
        assert_eq!(params.data, None);
        assert_eq!(params.k, Some(2.0));
    }

    #[test]
    fn test_partial_transform_uses_identity_defaults() {
        let params = UrlParams::from_query("?k=3");
        assert_eq!(params.transform(), Some(ViewTransform::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn test_query_round_trips_view() {
        let t = ViewTransform::new(2.5, -120.25, -40.5);
        let params = UrlParams::from_query(&to_query("us-10m.v1.json", &t));
        assert_eq!(params.data.as_deref(), Some("us-10m.v1.json"));
        assert_eq!(params.transform(), Some(t));
    }
}
