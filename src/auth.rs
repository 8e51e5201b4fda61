use std::{
    sync::Arc,
    time::{Duration, UNIX_EPOCH},
};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, Algorithm, DecodingKey, EncodingKey, Validation};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    clock::Clock,
    error::{AuthError, StoreError},
    store::CredentialStore,
    types::{Claims, Password, Username},
};

#[derive(Clone)]
pub struct AuthConfig {
    /// The issuer for auth tokens, written to the `iss` claim.
    pub auth_token_issuer: String,
    /// The secret used to sign auth tokens with HMAC-SHA256.
    /// If the secret changes, all previously issued tokens stop verifying.
    pub auth_token_secret: String,
    /// How long auth tokens remain valid after login.
    pub auth_token_lifetime: Duration,
    pub credential_store: Arc<dyn CredentialStore>,
    pub clock: Arc<dyn Clock>,
}

/// JWS header, serialized as `{"alg":"HS256","typ":"JWT"}`.
#[derive(Serialize)]
struct TokenHeader {
    alg: &'static str,
    typ: &'static str,
}

const HS256_HEADER: TokenHeader = TokenHeader {
    alg: "HS256",
    typ: "JWT",
};

pub(crate) struct AuthInternal {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthInternal {
    pub fn generate_token(&self, username: &Username) -> Result<String, AuthError> {
        let exp = self
            .config
            .clock
            .now()
            .checked_add(self.config.auth_token_lifetime)
            .ok_or(AuthError::ExpiryOutOfRange)?;

        let claims = Claims {
            exp: exp.duration_since(UNIX_EPOCH)?.as_secs(),
            iss: self.config.auth_token_issuer.clone(),
            sub: username.0.clone(),
        };

        let message = format!(
            "{}.{}",
            encode_segment(&HS256_HEADER)?,
            encode_segment(&claims)?
        );
        let signature =
            jsonwebtoken::crypto::sign(message.as_bytes(), &self.encoding_key, Algorithm::HS256)?;

        Ok(format!("{message}.{signature}"))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.auth_token_issuer]);
        // expiry is checked against the injected clock below
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)?.claims;

        let now = self.config.clock.now().duration_since(UNIX_EPOCH)?.as_secs();
        if claims.exp <= now {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }

    pub async fn register(
        &self,
        username: &Username,
        password: &Password,
    ) -> Result<(), AuthError> {
        self.config
            .credential_store
            .set_if_absent(username, password)
            .await
            .map_err(|source| {
                warn!(username = %username.0, error = %source, "Failed to register user");
                AuthError::RegistrationFailed { source }
            })
    }

    /// Check the submitted password against the stored one and issue a token.
    ///
    /// A missing user, a store failure and a wrong password all produce
    /// `AuthError::LoginFailed`.
    pub async fn login(
        &self,
        username: &Username,
        password: &Password,
    ) -> Result<String, AuthError> {
        let stored = match self.config.credential_store.get(username).await {
            Ok(stored) => stored,
            Err(StoreError::NotFound) => {
                debug!(username = %username.0, "Login for unknown user");
                return Err(AuthError::LoginFailed);
            }
            Err(e) => {
                warn!(username = %username.0, error = %e, "Failed to look up user");
                return Err(AuthError::LoginFailed);
            }
        };

        // plaintext, non-constant-time comparison
        if stored != *password {
            debug!(username = %username.0, "Login with wrong password");
            return Err(AuthError::LoginFailed);
        }

        self.generate_token(username)
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, AuthError> {
    let json = serde_json::to_vec(value).map_err(|source| AuthError::TokenEncoding { source })?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

#[derive(Clone)]
pub struct Auth {
    pub(crate) internal: Arc<AuthInternal>,
}

impl Auth {
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.auth_token_secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.auth_token_secret.as_bytes());

        Self {
            internal: Arc::new(AuthInternal {
                config,
                encoding_key,
                decoding_key,
            }),
        }
    }

    /// Verify a token issued by this service and return its claims.
    ///
    /// Checks the signature, the issuer and the expiry against the configured clock.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.internal.verify_token(token)
    }
}
