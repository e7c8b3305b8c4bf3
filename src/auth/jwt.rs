use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use super::claims::Claims;
use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};

/// Signing and verification keys plus token lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl: config.ttl,
        }
    }
}

impl JwtKeys {
    pub fn sign(&self, user_id: Uuid) -> AppResult<String> {
        let now = OffsetDateTime::now_utc();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(TimeDuration::seconds(secs)))
            .ok_or_else(|| anyhow::anyhow!("token lifetime {:?} is out of range", self.ttl))?;
        self.sign_claims(&Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        })
    }

    pub(crate) fn sign_claims(&self, claims: &Claims) -> AppResult<String> {
        let token = encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("jwt sign")))?;
        debug!(user_id = %claims.sub, "jwt signed");
        Ok(token)
    }

    /// Rejects bad signatures, malformed tokens and expired tokens alike.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            warn!(error = %e, "jwt rejected");
            AppError::Unauthorized("Invalid or expired token".into())
        })?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}
