//! Request extractors for the caller's identity and the admin PIN

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures::future::{LocalBoxFuture, Ready, ready};

use crate::api::error::ApiError;
use crate::service::{AdminPinGate, Authenticator};

/// Header carrying the admin PIN
pub const ADMIN_PIN_HEADER: &str = "x-admin-pin";

/// The user resolved from the `Authorization: Bearer` token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let authenticator = req.app_data::<web::Data<dyn Authenticator>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let authenticator = authenticator
                .ok_or_else(|| ApiError::Internal("Authenticator not configured".to_string()))?;
            let token =
                token.ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

            match authenticator.authenticate(&token).await? {
                Some(user_id) => Ok(AuthenticatedUser { user_id }),
                None => Err(ApiError::Unauthorized(
                    "Invalid or expired token".to_string(),
                )),
            }
        })
    }
}

/// Proof that the request carried the correct admin PIN
#[derive(Debug, Clone, Copy)]
pub struct AdminPin;

impl FromRequest for AdminPin {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let Some(gate) = req.app_data::<web::Data<AdminPinGate>>() else {
            return ready(Err(ApiError::Internal(
                "Admin PIN gate not configured".to_string(),
            )));
        };

        let pin = req
            .headers()
            .get(ADMIN_PIN_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if gate.verify(pin) {
            ready(Ok(AdminPin))
        } else {
            tracing::warn!(path = %req.path(), "Rejected admin request with wrong PIN");
            ready(Err(ApiError::Unauthorized("Invalid admin PIN".to_string())))
        }
    }
}
