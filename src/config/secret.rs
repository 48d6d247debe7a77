//! Client secret protection
//!
//! The Castor client secret is held as a [`SecretString`]: `secrecy` redacts it
//! from `Debug` output and `zeroize` wipes it on drop. Reading it requires an
//! explicit `expose_secret()`, which only the token request does.
//!
//! ```rust
//! use castor_edc::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let secret = secret_string("client-secret".to_string());
//! assert_eq!(secret.expose_secret().as_ref(), "client-secret");
//! assert!(!format!("{secret:?}").contains("client-secret"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret, SerializableSecret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

/// String payload of a [`SecretString`]
#[derive(Clone, Debug, Default, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl CloneableSecret for SecretValue {}
impl DebugSecret for SecretValue {}
impl SerializableSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for SecretValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SecretValue {
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Whether the value is still an unsubstituted `${VAR}` placeholder
    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with("${") && self.0.ends_with('}')
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue)
    }
}

/// A secret string, redacted in logs and zeroed on drop
pub type SecretString = Secret<SecretValue>;

/// Wraps a plain string as a [`SecretString`]
#[inline]
pub fn secret_string(value: String) -> SecretString {
    Secret::new(SecretValue::from(value))
}
