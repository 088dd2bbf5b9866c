use crate::application_port::{TokenCodec, TokenError};
use crate::domain_model::{AccessToken, RefreshToken, UserId};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const ACCESS_AUDIENCE: &str = "access";
const REFRESH_AUDIENCE: &str = "refresh";

#[derive(Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user id as string
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    jti: String, // keeps two tokens minted in the same second distinct
}

/// Sign `{subject, issued-at, expires-at}` with `secret`.
pub fn encode_token(
    subject: UserId,
    lifetime: Duration,
    secret: &[u8],
    issuer: &str,
    audience: &str,
) -> Result<(String, DateTime<Utc>), TokenError> {
    if lifetime.is_zero() {
        return Err(TokenError::Issue("token lifetime must be positive".to_string()));
    }
    let lifetime =
        chrono::Duration::from_std(lifetime).map_err(|e| TokenError::Issue(e.to_string()))?;
    let iat_dt = Utc::now();
    // `exp` has second resolution; report the instant the token really dies.
    let exp = (iat_dt + lifetime).timestamp();
    let exp_dt = DateTime::<Utc>::from_timestamp(exp, 0)
        .ok_or_else(|| TokenError::Issue("expiry out of range".to_string()))?;
    let claims = Claims {
        sub: subject.to_string(),
        exp,
        iat: iat_dt.timestamp(),
        iss: issuer.to_string(),
        aud: audience.to_string(),
        jti: uuid::Uuid::new_v4().to_string(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| TokenError::Issue(e.to_string()))?;
    Ok((token, exp_dt))
}

/// Check signature, expiry, issuer and audience, then return the subject.
pub fn decode_token(
    token: &str,
    secret: &[u8],
    issuer: &str,
    audience: &str,
) -> Result<UserId, TokenError> {
    let mut v = Validation::new(Algorithm::HS256);
    v.validate_exp = true;
    v.leeway = 0;
    v.set_audience(&[audience]);
    v.set_issuer(&[issuer]);
    v.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &v).map_err(|e| {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        }
    })?;
    data.claims
        .sub
        .parse::<UserId>()
        .map_err(|_| TokenError::Malformed)
}

/// HS256 codec with disjoint secrets per token class.
pub struct JwtHs256Codec {
    cfg: JwtConfig,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtHs256Codec { cfg }
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs256Codec {
    async fn issue_access_token(
        &self,
        user: UserId,
    ) -> Result<(AccessToken, DateTime<Utc>), TokenError> {
        let (token, exp_dt) = encode_token(
            user,
            self.cfg.access_ttl,
            &self.cfg.access_secret,
            &self.cfg.issuer,
            ACCESS_AUDIENCE,
        )?;
        Ok((AccessToken(token), exp_dt))
    }

    async fn issue_refresh_token(
        &self,
        user: UserId,
    ) -> Result<(RefreshToken, DateTime<Utc>), TokenError> {
        let (token, exp_dt) = encode_token(
            user,
            self.cfg.refresh_ttl,
            &self.cfg.refresh_secret,
            &self.cfg.issuer,
            REFRESH_AUDIENCE,
        )?;
        Ok((RefreshToken(token), exp_dt))
    }

    async fn verify_access_token(&self, token: &AccessToken) -> Result<UserId, TokenError> {
        decode_token(
            &token.0,
            &self.cfg.access_secret,
            &self.cfg.issuer,
            ACCESS_AUDIENCE,
        )
    }

    async fn verify_refresh_token(&self, token: &RefreshToken) -> Result<UserId, TokenError> {
        decode_token(
            &token.0,
            &self.cfg.refresh_secret,
            &self.cfg.issuer,
            REFRESH_AUDIENCE,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISSUER: &str = "gatehouse.test";

    fn codec() -> JwtHs256Codec {
        JwtHs256Codec::new(JwtConfig {
            issuer: ISSUER.to_string(),
            access_ttl: Duration::from_secs(60),
            refresh_ttl: Duration::from_secs(3600),
            access_secret: b"access-secret".to_vec(),
            refresh_secret: b"refresh-secret".to_vec(),
        })
    }

    #[test]
    fn round_trip_returns_subject() {
        let uid = UserId::new_v4();
        let (token, exp) =
            encode_token(uid, Duration::from_secs(30), b"k", ISSUER, ACCESS_AUDIENCE).unwrap();
        assert!(exp > Utc::now());
        assert_eq!(decode_token(&token, b"k", ISSUER, ACCESS_AUDIENCE), Ok(uid));
    }

    #[test]
    fn reported_expiry_matches_the_claim() {
        let before = Utc::now();
        let (_, exp) =
            encode_token(UserId::new_v4(), Duration::from_secs(30), b"k", ISSUER, ACCESS_AUDIENCE)
                .unwrap();
        assert_eq!(exp.timestamp_subsec_nanos(), 0);
        assert!(exp <= Utc::now() + chrono::Duration::seconds(30));
        assert!(exp > before + chrono::Duration::seconds(28));
    }

    #[test]
    fn other_secret_is_invalid_signature() {
        let uid = UserId::new_v4();
        let (token, _) =
            encode_token(uid, Duration::from_secs(30), b"k1", ISSUER, ACCESS_AUDIENCE).unwrap();
        assert_eq!(
            decode_token(&token, b"k2", ISSUER, ACCESS_AUDIENCE),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(
            decode_token("not.a.jwt", b"k", ISSUER, ACCESS_AUDIENCE),
            Err(TokenError::Malformed)
        );
        assert_eq!(
            decode_token("", b"k", ISSUER, ACCESS_AUDIENCE),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn zero_lifetime_cannot_be_issued() {
        let res = encode_token(UserId::new_v4(), Duration::ZERO, b"k", ISSUER, ACCESS_AUDIENCE);
        assert!(matches!(res, Err(TokenError::Issue(_))));
    }

    #[tokio::test]
    async fn expires_after_lifetime() {
        let uid = UserId::new_v4();
        let (token, _) =
            encode_token(uid, Duration::from_secs(1), b"k", ISSUER, ACCESS_AUDIENCE).unwrap();
        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(
            decode_token(&token, b"k", ISSUER, ACCESS_AUDIENCE),
            Err(TokenError::Expired)
        );
    }

    #[tokio::test]
    async fn token_classes_do_not_cross() {
        let codec = codec();
        let uid = UserId::new_v4();
        let (access, _) = codec.issue_access_token(uid).await.unwrap();
        let (refresh, _) = codec.issue_refresh_token(uid).await.unwrap();

        assert_eq!(codec.verify_access_token(&access).await, Ok(uid));
        assert_eq!(codec.verify_refresh_token(&refresh).await, Ok(uid));
        assert_eq!(
            codec
                .verify_refresh_token(&RefreshToken(access.0.clone()))
                .await,
            Err(TokenError::InvalidSignature)
        );
        assert_eq!(
            codec.verify_access_token(&AccessToken(refresh.0.clone())).await,
            Err(TokenError::InvalidSignature)
        );
    }

    #[tokio::test]
    async fn tokens_minted_back_to_back_differ() {
        let codec = codec();
        let uid = UserId::new_v4();
        let (a, _) = codec.issue_refresh_token(uid).await.unwrap();
        let (b, _) = codec.issue_refresh_token(uid).await.unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn debug_hides_secrets() {
        let rendered = format!("{:?}", codec().cfg);
        assert!(!rendered.contains("access-secret"));
        assert!(rendered.contains("redacted"));
    }
}
