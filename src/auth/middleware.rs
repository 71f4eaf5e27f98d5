use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use log::error;
use sqlx::PgPool;
use std::rc::Rc;

use crate::auth::error::AuthError;
use crate::auth::revocation::is_token_revoked;
use crate::auth::token::verify_token;
use crate::config::AuthSettings;
use crate::error::AppError;

/// The authorization gate applied to the `/api` scope.
///
/// Per request: extract the bearer token, validate it, check the revocation
/// denylist, and on success insert the decoded `Claims` into request
/// extensions for downstream extractors. Any failure — missing header,
/// invalid token, revoked token, unreachable denylist store — ends the
/// request with the same generic 401. The decision is made exactly once;
/// authentication failures are never transient, so there are no retries.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    // Rc because the revocation check is async: the call future must own a
    // handle to the inner service across the denylist round trip.
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            // Login and registration are the endpoints that mint tokens;
            // they cannot require one.
            let path = req.path();
            if path.starts_with("/api/auth/login") || path.starts_with("/api/auth/register") {
                return service.call(req).await;
            }

            let token = req
                .headers()
                .get("Authorization")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::to_owned);

            let token = match token {
                Some(token) => token,
                None => return Err(AppError::from(AuthError::NotAuthenticated).into()),
            };

            let settings = match req.app_data::<web::Data<AuthSettings>>() {
                Some(settings) => settings.clone(),
                None => {
                    return Err(AppError::InternalServerError(
                        "Auth settings not configured".into(),
                    )
                    .into())
                }
            };
            let pool = match req.app_data::<web::Data<PgPool>>() {
                Some(pool) => pool.clone(),
                None => {
                    return Err(AppError::InternalServerError(
                        "Database pool not configured".into(),
                    )
                    .into())
                }
            };

            let claims = match verify_token(&token, &settings) {
                Ok(claims) => claims,
                Err(auth_err) => return Err(AppError::from(auth_err).into()),
            };

            // A valid signature is not enough: the token may have been
            // revoked (logout) before its natural expiry. An unreachable
            // store fails closed.
            match is_token_revoked(&pool, &token).await {
                Ok(false) => {}
                Ok(true) => return Err(AppError::from(AuthError::Revoked).into()),
                Err(e) => {
                    error!("Revocation check failed: {}", e);
                    return Err(AppError::from(AuthError::StoreUnavailable).into());
                }
            }

            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
