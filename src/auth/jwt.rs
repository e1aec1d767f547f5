use anyhow::{bail, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT issuer identifier
const ISSUER: &str = "mindcare/jwt-tokenizer";

/// Claims represents public claim values (as specified in RFC 7519)
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    pub exp: u64,    // Required. Token expiration time (timestamp)
    pub iat: u64,    // Required. Time at which token was issued (timestamp)
    pub iss: String, // Required. Token issuer
    pub sub: String, // Required. Subject of the token (user id)
}

/// Signs tokens with a shared HMAC secret (HS256).
pub struct JwtTokenGenerator {
    key: EncodingKey,
    expiry: u64, // Token expiration time in seconds
}

impl JwtTokenGenerator {
    pub fn new(secret: &[u8], expiry: u64) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            expiry,
        }
    }

    #[cfg(test)]
    pub fn new_test() -> Self {
        Self::new(TEST_SECRET, 60)
    }

    pub fn generate_token(&self, user_id: u64, now: u64) -> Result<String> {
        let claims = Claims {
            exp: now + self.expiry,
            iat: now,
            iss: String::from(ISSUER),
            sub: user_id.to_string(),
        };

        match encode(&Header::new(Algorithm::HS256), &claims, &self.key) {
            Ok(token) => Ok(token),
            Err(e) => bail!("generate jwt token failed: {e}"),
        }
    }
}

/// Verifies tokens created by [`JwtTokenGenerator`] with the same secret.
pub struct JwtTokenValidator {
    key: DecodingKey,
}

impl JwtTokenValidator {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
        }
    }

    #[cfg(test)]
    pub fn new_test() -> Self {
        Self::new(TEST_SECRET)
    }

    /// Checks signature, issuer and expiry against `now`, returns the
    /// subject user id.
    pub fn validate_token(&self, token: &str, now: u64) -> Result<u64> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);
        // expiry is checked below against the caller's clock
        validation.validate_exp = false;

        let claims = match decode::<Claims>(token, &self.key, &validation) {
            Ok(data) => data.claims,
            Err(e) => bail!("validate jwt token failed: {e}"),
        };

        if now >= claims.exp {
            bail!("validate jwt token failed: token expired");
        }

        match claims.sub.parse::<u64>() {
            Ok(id) => Ok(id),
            Err(_) => bail!("validate jwt token failed: invalid subject '{}'", claims.sub),
        }
    }
}

#[cfg(test)]
const TEST_SECRET: &[u8] = b"mindcare_test_secret";
