use super::tokens::AccessClaims;
use crate::errors::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which identity model an access token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Owner,
    Staff,
}

/// The authenticated caller of a request.
///
/// Built once by the authentication middleware from verified access claims
/// and handed to handlers through the extractor below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject_id: Uuid,
    pub role: String,
    pub store_id: Option<Uuid>,
    pub token_type: TokenType,
}

impl Principal {
    pub fn owner(subject_id: Uuid, role: impl Into<String>) -> Self {
        Self {
            subject_id,
            role: role.into(),
            store_id: None,
            token_type: TokenType::Owner,
        }
    }

    pub fn staff(subject_id: Uuid, role: impl Into<String>, store_id: Uuid) -> Self {
        Self {
            subject_id,
            role: role.into(),
            store_id: Some(store_id),
            token_type: TokenType::Staff,
        }
    }

    pub fn is_staff(&self) -> bool {
        self.token_type == TokenType::Staff
    }
}

impl TryFrom<AccessClaims> for Principal {
    type Error = AppError;

    fn try_from(claims: AccessClaims) -> Result<Self, Self::Error> {
        let invalid = || AppError::Unauthorized("Invalid or expired token".to_string());

        let subject_id = Uuid::parse_str(&claims.sub).map_err(|_| invalid())?;
        let store_id = claims
            .store_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|_| invalid())?;

        // A staff token without a store scope is not a usable staff token
        if claims.token_type == TokenType::Staff && store_id.is_none() {
            return Err(invalid());
        }

        Ok(Self {
            subject_id,
            role: claims.role,
            store_id,
            token_type: claims.token_type,
        })
    }
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(token_type: TokenType, store_id: Option<String>) -> AccessClaims {
        AccessClaims {
            sub: Uuid::now_v7().to_string(),
            role: "staff".to_string(),
            store_id,
            token_type,
            exp: 0,
            iat: 0,
            jti: Uuid::new_v4().to_string(),
        }
    }

    #[test]
    fn test_staff_claims_require_store_scope() {
        assert!(Principal::try_from(claims(TokenType::Staff, None)).is_err());

        let store_id = Uuid::now_v7();
        let principal =
            Principal::try_from(claims(TokenType::Staff, Some(store_id.to_string()))).unwrap();
        assert!(principal.is_staff());
        assert_eq!(principal.store_id, Some(store_id));
    }

    #[test]
    fn test_malformed_subject_is_rejected() {
        let mut bad = claims(TokenType::Owner, None);
        bad.sub = "42".to_string();
        assert!(Principal::try_from(bad).is_err());
    }

    #[tokio::test]
    async fn test_extractor_without_principal_is_unauthorized() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        let err = Principal::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
