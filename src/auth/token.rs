use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::Token;

const ARGON2_MEMORY: u32 = 64 * 1024; // KiB
const ARGON2_ITERATIONS: u32 = 1;
const ARGON2_PARALLELISM: u32 = 4;
const ARGON2_OUTPUT_LEN: usize = 32;

const TOKEN_PREFIX: &str = "folio";
const LOOKUP_LENGTH: usize = 8;
const SECRET_LENGTH: usize = 24;
const MAX_ISSUE_ATTEMPTS: usize = 3;

/// A freshly minted credential. `raw` is shown to the caller once and
/// never stored.
pub struct IssuedToken {
    pub token: Token,
    pub raw: String,
}

pub struct TokenGenerator {
    argon2: Argon2<'static>,
}

impl TokenGenerator {
    pub fn new() -> Result<Self> {
        let params = Params::new(
            ARGON2_MEMORY,
            ARGON2_ITERATIONS,
            ARGON2_PARALLELISM,
            Some(ARGON2_OUTPUT_LEN),
        )
        .map_err(|e| Error::Hashing(format!("invalid argon2 parameters: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Mints a `folio_<lookup>_<secret>` token for `user_id`.
    pub fn issue(&self, user_id: i64, expires_at: Option<DateTime<Utc>>) -> Result<IssuedToken> {
        let lookup = Uuid::new_v4().simple().to_string()[..LOOKUP_LENGTH].to_string();
        let secret: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SECRET_LENGTH)
            .map(char::from)
            .collect();
        let raw = format!("{TOKEN_PREFIX}_{lookup}_{secret}");
        let token_hash = self.hash(&raw)?;

        Ok(IssuedToken {
            token: Token {
                id: Uuid::new_v4().to_string(),
                token_hash,
                token_lookup: lookup,
                user_id,
                created_at: Utc::now(),
                expires_at,
                last_used_at: None,
            },
            raw,
        })
    }

    /// Issues a token and persists it, minting a fresh lookup whenever the
    /// store reports a collision.
    pub fn issue_stored(
        &self,
        store: &dyn Store,
        user_id: i64,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<IssuedToken> {
        for _ in 0..MAX_ISSUE_ATTEMPTS {
            let issued = self.issue(user_id, expires_at)?;
            match store.create_token(&issued.token) {
                Ok(()) => return Ok(issued),
                Err(Error::TokenLookupCollision) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(Error::TokenLookupCollision)
    }

    /// Hashes a raw token using Argon2id
    pub fn hash(&self, token: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(token.as_bytes(), &salt)
            .map_err(|e| Error::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    pub fn verify(&self, token: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| Error::Hashing(format!("invalid hash format: {e}")))?;

        match self.argon2.verify_password(token.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Hashing(e.to_string())),
        }
    }
}

/// Splits a raw token into its lookup and secret parts.
pub fn parse_token(token: &str) -> Result<(&str, &str)> {
    let rest = token
        .strip_prefix(TOKEN_PREFIX)
        .and_then(|r| r.strip_prefix('_'))
        .ok_or(Error::InvalidTokenFormat)?;

    let (lookup, secret) = rest.split_once('_').ok_or(Error::InvalidTokenFormat)?;
    if lookup.len() != LOOKUP_LENGTH
        || secret.len() != SECRET_LENGTH
        || !secret.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(Error::InvalidTokenFormat);
    }

    Ok((lookup, secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_format() {
        let generator = TokenGenerator::new().unwrap();
        let issued = generator.issue(7, None).unwrap();

        let parts: Vec<&str> = issued.raw.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "folio");
        assert_eq!(parts[1], issued.token.token_lookup);
        assert_eq!(parts[2].len(), 24);
        assert_eq!(issued.token.user_id, 7);
        assert!(issued.token.token_hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_verify() {
        let generator = TokenGenerator::new().unwrap();
        let issued = generator.issue(1, None).unwrap();

        assert!(generator.verify(&issued.raw, &issued.token.token_hash).unwrap());

        let last = if issued.raw.ends_with('x') { 'y' } else { 'x' };
        let tampered = format!("{}{last}", &issued.raw[..issued.raw.len() - 1]);
        assert!(!generator.verify(&tampered, &issued.token.token_hash).unwrap());
    }

    #[test]
    fn test_issue_stored_persists_token() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = crate::store::SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let user = store.create_user("alice", false).unwrap();

        let generator = TokenGenerator::new().unwrap();
        let issued = generator.issue_stored(&store, user.id, None).unwrap();

        let stored = store
            .get_token_by_lookup(&issued.token.token_lookup)
            .unwrap()
            .unwrap();
        assert_eq!(stored.user_id, user.id);
        assert!(generator.verify(&issued.raw, &stored.token_hash).unwrap());
    }

    #[test]
    fn test_hash_records_argon2_parameters() {
        let generator = TokenGenerator::new().unwrap();
        let hash = generator.hash("folio_1234abcd_abcdefghijklmnopqrstuvwx").unwrap();
        assert!(hash.starts_with("$argon2id$v=19$m=65536,t=1,p=4$"));
    }

    #[test]
    fn test_parse_token() {
        let (lookup, secret) = parse_token("folio_1234abcd_abcdefghijklmnopqrstuvwx").unwrap();
        assert_eq!(lookup, "1234abcd");
        assert_eq!(secret, "abcdefghijklmnopqrstuvwx");

        assert!(parse_token("other_1234abcd_abcdefghijklmnopqrstuvwx").is_err());
        assert!(parse_token("folio_1234abcd").is_err());
        assert!(parse_token("folio_1234abcd_short").is_err());
        assert!(parse_token("folio_1234abcd_abcdefghijklmnop_rstuvwx").is_err());
    }
}
