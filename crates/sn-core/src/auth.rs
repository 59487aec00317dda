use anyhow::{anyhow, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

#[derive(Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub secret: String,
    pub ttl_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Account id.
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
    pub aud: String,
    pub iss: String,
}

pub fn issue_token(account_id: &str, config: &JwtConfig) -> Result<(String, AccessTokenClaims)> {
    let now = unix_seconds()?;
    let exp = now
        .checked_add(config.ttl_seconds)
        .ok_or_else(|| anyhow!("token expiry overflow"))?;

    let claims = AccessTokenClaims {
        sub: account_id.to_string(),
        exp: exp as usize,
        iat: now as usize,
        jti: Uuid::new_v4().to_string(),
        aud: config.audience.clone(),
        iss: config.issuer.clone(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok((token, claims))
}

pub fn verify_token(token: &str, config: &JwtConfig) -> Result<AccessTokenClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[config.audience.as_str()]);
    validation.set_issuer(&[config.issuer.as_str()]);

    let data = decode::<AccessTokenClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

pub fn unix_seconds() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .map_err(|_| anyhow!("invalid system clock"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            issuer: "sn-test".to_string(),
            audience: "sn-user-api".to_string(),
            secret: secret.to_string(),
            ttl_seconds: 600,
        }
    }

    #[test]
    fn issued_token_verifies() {
        let config = config("secret-a");
        let (token, claims) = issue_token("account-1", &config).expect("issue");
        let verified = verify_token(&token, &config).expect("verify");
        assert_eq!(verified.sub, "account-1");
        assert_eq!(verified.jti, claims.jti);
        assert_eq!(verified.exp, claims.iat + 600);
    }

    #[test]
    fn token_with_other_secret_is_rejected() {
        let (token, _) = issue_token("account-1", &config("secret-a")).expect("issue");
        assert!(verify_token(&token, &config("secret-b")).is_err());
    }

    #[test]
    fn token_with_other_audience_is_rejected() {
        let (token, _) = issue_token("account-1", &config("secret-a")).expect("issue");
        let mut other = config("secret-a");
        other.audience = "sn-admin-api".to_string();
        assert!(verify_token(&token, &other).is_err());
    }
}
