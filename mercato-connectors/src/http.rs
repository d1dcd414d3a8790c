//! Shared HTTP plumbing: URL building, status mapping, soft-error detection.

use std::collections::BTreeMap;

use mercato_core::{MercatoError, ProviderConfig};
use serde_json::Value;
use url::Url;

const USER_AGENT: &str = concat!("mercato/", env!("CARGO_PKG_VERSION"));

/// Thin `reqwest` wrapper bound to one provider and base URL.
#[derive(Debug, Clone)]
pub(crate) struct Http {
    provider: &'static str,
    client: reqwest::Client,
    base: Url,
}

impl Http {
    pub(crate) fn new(
        provider: &'static str,
        cfg: &ProviderConfig,
        default_base: &str,
    ) -> Result<Self, MercatoError> {
        let base = cfg.base_url.as_deref().unwrap_or(default_base);
        let base = Url::parse(base).map_err(|e| {
            MercatoError::InvalidArg(format!("{provider}: invalid base url '{base}': {e}"))
        })?;
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MercatoError::connector(provider, e.to_string()))?;
        Ok(Self {
            provider,
            client,
            base,
        })
    }

    /// Base URL joined with `segments`, each percent-encoded as one path segment.
    pub(crate) fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, MercatoError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                MercatoError::InvalidArg(format!("{}: base url cannot take a path", self.provider))
            })?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// GET `segments` with `query` and `headers`, returning the decoded JSON body.
    ///
    /// Non-success statuses become `UpstreamError`, transport failures become
    /// `UpstreamUnreachable`, and error payloads inside successful responses
    /// are mapped by [`soft_error`].
    pub(crate) async fn get_json(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        headers: &[(&'static str, String)],
    ) -> Result<Value, MercatoError> {
        let url = self.url(segments, query)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "mercato::connectors::http",
            provider = self.provider,
            path = url.path(),
            "upstream request"
        );

        let mut req = self.client.get(url);
        for (name, value) in headers {
            req = req.header(*name, value);
        }
        let resp = req.send().await.map_err(|e| self.transport_error(&e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MercatoError::upstream(
                self.provider,
                status.as_u16(),
                upstream_message(&body),
            ));
        }

        let body: Value = resp.json().await.map_err(|e| {
            if e.is_decode() {
                MercatoError::upstream(
                    self.provider,
                    status.as_u16(),
                    format!("invalid JSON: {e}"),
                )
            } else {
                self.transport_error(&e)
            }
        })?;

        match soft_error(self.provider, &body) {
            Some(err) => Err(err),
            None => Ok(body),
        }
    }

    fn transport_error(&self, e: &reqwest::Error) -> MercatoError {
        let message = if e.is_timeout() {
            "request timed out".to_string()
        } else if e.is_connect() {
            format!("connection failed: {e}")
        } else {
            e.to_string()
        };
        MercatoError::unreachable(self.provider, message)
    }
}

/// Best-effort human message from an error body.
pub(crate) fn upstream_message(body: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error", "Error Message", "msg"] {
            if let Some(s) = v.get(key).and_then(Value::as_str) {
                return s.to_string();
            }
        }
        if let Some(s) = v.pointer("/status/error_message").and_then(Value::as_str) {
            return s.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

/// Error payloads some providers return with a 200 status.
///
/// Rate-limit notes map to 429, explicit error messages to 400.
pub(crate) fn soft_error(provider: &str, body: &Value) -> Option<MercatoError> {
    let obj = body.as_object()?;
    for key in ["Note", "Information"] {
        if let Some(msg) = obj.get(key).and_then(Value::as_str) {
            return Some(MercatoError::upstream(provider, 429, msg));
        }
    }
    for key in ["Error Message", "error"] {
        if let Some(msg) = obj.get(key).and_then(Value::as_str) {
            return Some(MercatoError::upstream(provider, 400, msg));
        }
    }
    None
}

/// Required API key or `MisconfiguredCredentials`.
pub(crate) fn require_key<'a>(
    provider: &'static str,
    cfg: &'a ProviderConfig,
    what: &str,
) -> Result<&'a str, MercatoError> {
    cfg.key()
        .ok_or_else(|| MercatoError::misconfigured(provider, format!("{what} is not set")))
}

/// Extra proxy params forwarded verbatim, minus keys the connector sets itself.
pub(crate) fn passthrough<'a>(
    extra: &'a BTreeMap<String, String>,
    reserved: &[&str],
) -> Vec<(&'a str, String)> {
    extra
        .iter()
        .filter(|(k, _)| !reserved.contains(&k.as_str()))
        .map(|(k, v)| (k.as_str(), v.clone()))
        .collect()
}
