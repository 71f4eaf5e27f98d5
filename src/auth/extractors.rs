use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::error::AuthError;
use crate::auth::token::Claims;
use crate::error::AppError;

/// Extracts the authenticated identity from request extensions.
///
/// Intended for routes behind `AuthMiddleware`, which validates the token and
/// inserts the decoded `Claims`. Handlers receive the identity as an explicit
/// argument instead of fishing values out of ambient request state.
///
/// If the claims are absent (the gate did not run, or failed to insert them),
/// extraction rejects with the same generic unauthorized error as the gate.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

impl AuthenticatedUser {
    /// The subject identifier: the authenticated user's id.
    pub fn id(&self) -> i32 {
        self.0.sub
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError; // AppError converts into ActixError via ResponseError
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Claims>().cloned() {
            Some(claims) => ready(Ok(AuthenticatedUser(claims))),
            None => {
                // Reached only when a handler uses this extractor on a route
                // that AuthMiddleware does not cover. Rejecting is the safe
                // default.
                ready(Err(AppError::from(AuthError::NotAuthenticated).into()))
            }
        }
    }
}
