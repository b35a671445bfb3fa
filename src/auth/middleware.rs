use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use sqlx::PgPool;
use std::rc::Rc;

use crate::auth::token::verify_token;
use crate::error::AppError;
use crate::models::User;

/// Authentication gateway for the `/api` scope.
///
/// Extracts the session token from the `x-auth-token` header, verifies it,
/// loads the corresponding user record, and attaches it to request
/// extensions. Requests with a missing, invalid, or expired token are
/// rejected before reaching the handler, each with its own message.
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

        // Skip authentication for the health check and the unauthenticated
        // auth endpoints (login, register, and the Google consent/callback
        // pair, which authenticate through the provider instead).
        let path = req.path();
        if path == "/api/health"
            || path.starts_with("/api/auth/login")
            || path.starts_with("/api/auth/register")
            || path.starts_with("/api/auth/google")
        {
            let fut = service.call(req);
            return Box::pin(fut);
        }

        Box::pin(async move {
            let token = req
                .headers()
                .get("x-auth-token")
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);

            let token = match token {
                Some(token) => token,
                None => {
                    return Err(
                        AppError::Unauthorized("No token, authorization denied".into()).into(),
                    )
                }
            };

            let claims = verify_token(&token)?;

            let pool = req
                .app_data::<web::Data<PgPool>>()
                .cloned()
                .ok_or_else(|| {
                    AppError::InternalServerError("Database pool not configured".into())
                })?;

            let user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE id = $1",
                User::COLUMNS
            ))
            .bind(claims.sub)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(AppError::from)?;

            match user {
                Some(user) => {
                    req.extensions_mut().insert(user);
                    service.call(req).await
                }
                // A token for a user that no longer exists is as good as forged.
                None => Err(AppError::Unauthorized("Token is not valid".into()).into()),
            }
        })
    }
}
