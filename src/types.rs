use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(transparent)]
pub struct Username(pub String);

/// A password exactly as submitted by the client. Stored and compared as-is.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[repr(transparent)]
pub struct Password(pub String);

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

/// The `{username, password}` pair carried in register and login bodies.
///
/// Field names match case-insensitively and unknown fields are ignored.
/// Missing or `null` fields decode as empty strings, and a `null` body decodes
/// as an empty credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Option<Map<String, Value>>")]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl TryFrom<Option<Map<String, Value>>> for Credential {
    type Error = serde_json::Error;

    fn try_from(body: Option<Map<String, Value>>) -> Result<Self, Self::Error> {
        let mut credential = Credential::default();

        for (key, value) in body.into_iter().flatten() {
            let field = if key.eq_ignore_ascii_case("username") {
                &mut credential.username
            } else if key.eq_ignore_ascii_case("password") {
                &mut credential.password
            } else {
                continue;
            };

            if let Some(value) = serde_json::from_value::<Option<String>>(value)? {
                *field = value;
            }
        }

        Ok(credential)
    }
}

impl Credential {
    pub fn into_parts(self) -> (Username, Password) {
        (Username(self.username), Password(self.password))
    }
}

/// Token claims. Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Claims {
    pub exp: u64,
    pub iss: String,
    pub sub: String,
}
