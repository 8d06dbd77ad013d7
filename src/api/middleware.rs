use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage, HttpResponse,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use uuid::Uuid;

/// Middleware adding a trace/request id.
pub struct RequestId;

impl<S, B> Transform<S, ServiceRequest> for RequestId
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestIdMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestIdMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestIdMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestIdMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let id = Uuid::new_v4().to_string();
        req.extensions_mut().insert(id.clone());
        log::debug!("request_id={} path={}", id, req.path());
        let fut = self.service.call(req);
        Box::pin(async move {
            let resp = fut.await?;
            Ok(resp)
        })
    }
}

pub const AUTH_COOKIE: &str = "crafty_auth";
const SIGN_IN_PATH: &str = "/auth";
const HOME_PATH: &str = "/crm";
const PUBLIC_PREFIXES: [&str; 4] = ["/api", "/healthz", "/swagger-ui", "/api-docs"];

fn is_public(path: &str) -> bool {
    PUBLIC_PREFIXES
        .iter()
        .any(|prefix| path == *prefix || path.starts_with(&format!("{}/", prefix)))
}

fn is_sign_in(path: &str) -> bool {
    path == SIGN_IN_PATH || path.starts_with("/auth/")
}

/// Navigation gate: no protected route renders without the auth cookie.
/// Unauthenticated requests are redirected to the sign-in page with the
/// originally requested path preserved as a return target; an authenticated
/// visit to the sign-in page bounces to the dashboard.
pub struct AuthGate;

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthGateMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let path = req.path().to_string();
        let authenticated = req.cookie(AUTH_COOKIE).is_some();

        let location = if is_public(&path) {
            None
        } else if is_sign_in(&path) {
            authenticated.then(|| HOME_PATH.to_string())
        } else if !authenticated {
            let next: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
            Some(format!("{}?next={}", SIGN_IN_PATH, next))
        } else {
            None
        };

        if let Some(location) = location {
            let (request, _pl) = req.into_parts();
            let response = HttpResponse::Found()
                .insert_header((header::LOCATION, location))
                .finish()
                .map_into_right_body();
            return Box::pin(async move { Ok(ServiceResponse::new(request, response)) });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let resp = fut.await?;
            Ok(resp.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::{test, web, App};

    macro_rules! gated_app {
        () => {
            test::init_service(
                App::new()
                    .wrap(AuthGate)
                    .route("/crm", web::get().to(|| async { HttpResponse::Ok().finish() }))
                    .route("/auth", web::get().to(|| async { HttpResponse::Ok().finish() }))
                    .route(
                        "/api/db/instances",
                        web::get().to(|| async { HttpResponse::Ok().finish() }),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn unauthenticated_protected_path_redirects_with_return_target() {
        let app = gated_app!();
        let req = test::TestRequest::get().uri("/crm").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 302);
        assert_eq!(
            resp.headers().get("location").unwrap(),
            "/auth?next=%2Fcrm"
        );
    }

    #[actix_web::test]
    async fn authenticated_requests_pass_through() {
        let app = gated_app!();
        let req = test::TestRequest::get()
            .uri("/crm")
            .cookie(Cookie::new(AUTH_COOKIE, "tok"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }

    #[actix_web::test]
    async fn authenticated_sign_in_page_bounces_to_the_dashboard() {
        let app = gated_app!();
        let req = test::TestRequest::get()
            .uri("/auth")
            .cookie(Cookie::new(AUTH_COOKIE, "tok"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 302);
        assert_eq!(resp.headers().get("location").unwrap(), "/crm");
    }

    #[actix_web::test]
    async fn api_paths_are_exempt_from_the_gate() {
        let app = gated_app!();
        let req = test::TestRequest::get()
            .uri("/api/db/instances")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }

    #[actix_web::test]
    async fn unauthenticated_sign_in_page_renders() {
        let app = gated_app!();
        let req = test::TestRequest::get().uri("/auth").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }
}
