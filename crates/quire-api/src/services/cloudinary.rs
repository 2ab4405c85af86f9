//! Cloudinary upload signatures.
//!
//! Browsers upload straight to Cloudinary; the server only signs the upload
//! parameters with the API secret so the secret never leaves the backend.

use serde_json::{Map, Value};
use sha1::{Digest, Sha1};

/// Parameters that are sent with the upload but never signed.
const UNSIGNED_PARAMS: [&str; 2] = ["file", "api_key"];

#[derive(Clone)]
pub struct CloudinarySigner {
    api_secret: String,
}

impl CloudinarySigner {
    pub fn new(api_secret: impl Into<String>) -> Self {
        Self {
            api_secret: api_secret.into(),
        }
    }

    /// `sha1(k1=v1&k2=v2...{secret})` over the sorted parameters, lowercase hex.
    pub fn sign(&self, params: &Map<String, Value>) -> String {
        let mut keys: Vec<&String> = params
            .keys()
            .filter(|k| !UNSIGNED_PARAMS.contains(&k.as_str()))
            .collect();
        keys.sort();

        let to_sign = keys
            .into_iter()
            .map(|k| format!("{}={}", k, render_value(&params[k])))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha1::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (None, Some(u), _) => u.to_string(),
            (None, None, Some(f)) => (f.trunc() as i64).to_string(),
            (None, None, None) => n.to_string(),
        },
        Value::Array(items) => items.iter().map(render_value).collect::<Vec<_>>().join(","),
        Value::Null | Value::Object(_) => value.to_string(),
    }
}
