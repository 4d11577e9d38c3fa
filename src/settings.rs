//! Key material loaded from a settings file and merged with command-line values
//!
//! A settings file is a JSON object such as:
//!
//! ```json
//! { "key": "MONARCHY", "p": 17, "q": "11" }
//! ```
//!
//! Every field is optional, `p` and `q` may be numbers or strings, and
//! unknown fields are ignored.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{CryptifyError, ErrorCategory, ErrorKind, Result};
use crate::file_ops::read_error;

pub const DEFAULT_P: &str = "17";
pub const DEFAULT_Q: &str = "11";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PrimeValue {
    Number(u64),
    Text(String),
}

impl PrimeValue {
    fn into_text(self) -> String {
        match self {
            PrimeValue::Number(n) => n.to_string(),
            PrimeValue::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub p: Option<PrimeValue>,
    #[serde(default)]
    pub q: Option<PrimeValue>,
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            CryptifyError::with_source(
                ErrorCategory::User,
                ErrorKind::InvalidSettings,
                "invalid settings",
                e,
            )
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| read_error(path, e))?;
        let settings = Self::from_json(&json)
            .map_err(|e| e.with_context(format!("failed to load {}", path.display())))?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }
}

/// Key material for both ciphers, as text still to be validated by the ciphers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    pub key: Option<String>,
    pub p: String,
    pub q: String,
}

impl Default for KeyMaterial {
    fn default() -> Self {
        Self {
            key: None,
            p: DEFAULT_P.to_string(),
            q: DEFAULT_Q.to_string(),
        }
    }
}

impl KeyMaterial {
    /// Explicit values win over the settings file, which wins over defaults.
    pub fn resolve(
        key: Option<String>,
        p: Option<String>,
        q: Option<String>,
        settings: Settings,
    ) -> Self {
        let defaults = Self::default();
        Self {
            key: key.or(settings.key),
            p: p
                .or_else(|| settings.p.map(PrimeValue::into_text))
                .unwrap_or(defaults.p),
            q: q
                .or_else(|| settings.q.map(PrimeValue::into_text))
                .unwrap_or(defaults.q),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_json_numbers_and_strings() {
        let s = Settings::from_json(r#"{"key": "MONARCHY", "p": 17, "q": "11"}"#).unwrap();
        assert_eq!(s.key.as_deref(), Some("MONARCHY"));
        assert_eq!(s.p, Some(PrimeValue::Number(17)));
        assert_eq!(s.q, Some(PrimeValue::Text("11".to_string())));
    }

    #[test]
    fn test_from_json_partial_and_unknown_fields() {
        let s = Settings::from_json(r#"{"p": 23, "theme": "dark"}"#).unwrap();
        assert_eq!(s.key, None);
        assert_eq!(s.p, Some(PrimeValue::Number(23)));
        assert_eq!(s.q, None);
    }

    #[test]
    fn test_from_json_invalid() {
        for json in ["", "[1,2]", r#"{"key": 5}"#, r#"{"p": [17]}"#, "{"] {
            let err = Settings::from_json(json).expect_err("expected invalid settings");
            assert_eq!(err.kind, ErrorKind::InvalidSettings, "input {json:?}");
        }
    }

    #[test]
    fn test_resolve_precedence() {
        let settings = Settings {
            key: Some("FROMFILE".to_string()),
            p: Some(PrimeValue::Number(23)),
            q: Some(PrimeValue::Text("29".to_string())),
        };
        let m = KeyMaterial::resolve(
            Some("CLI".to_string()),
            None,
            Some("31".to_string()),
            settings,
        );
        assert_eq!(m.key.as_deref(), Some("CLI"));
        assert_eq!(m.p, "23");
        assert_eq!(m.q, "31");
    }

    #[test]
    fn test_resolve_defaults() {
        let m = KeyMaterial::resolve(None, None, None, Settings::default());
        assert_eq!(m, KeyMaterial::default());
        assert_eq!(m.p, DEFAULT_P);
        assert_eq!(m.q, DEFAULT_Q);
    }

    #[test]
    fn test_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, r#"{"key": "playfair"}"#).unwrap();
        let s = Settings::load(&path).unwrap();
        assert_eq!(s.key.as_deref(), Some("playfair"));
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = Settings::load(&temp_dir.path().join("missing.json"))
            .expect_err("expected io error");
        assert_eq!(err.kind, ErrorKind::Io);
        assert_eq!(err.category, ErrorCategory::User);
    }

    #[test]
    fn test_load_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Settings::load(&path).expect_err("expected invalid settings");
        assert_eq!(err.kind, ErrorKind::InvalidSettings);
        assert!(err.message().starts_with("failed to load"));
    }
}
