//! Request logging and the cross-origin policy applied to every route.

use std::time::{Duration, Instant};

use actix_cors::Cors;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::{Method, StatusCode};
use actix_web::Error;
use futures_util::future::{ready, LocalBoxFuture, Ready};

/// Any origin (with credentials), any method, any header.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
}

/// Logs `method url - status - seconds` once the inner service has answered.
pub struct RequestLog;

impl<S, B> Transform<S, ServiceRequest> for RequestLog
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLogMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLogMiddleware { service }))
    }
}

pub struct RequestLogMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestLogMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let method = req.method().clone();
        let url = full_url(&req);
        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await;
            let status = response_status(&res);
            log::info!("{}", request_line(&method, &url, status, started.elapsed()));
            res
        })
    }
}

/// Status the client sees, including errors not yet rendered to a response.
fn response_status<B>(res: &Result<ServiceResponse<B>, Error>) -> StatusCode {
    match res {
        Ok(res) => res.status(),
        Err(err) => err.as_response_error().status_code(),
    }
}

fn request_line(method: &Method, url: &str, status: StatusCode, elapsed: Duration) -> String {
    format!(
        "Request: {} {} - {} - {:.4}s",
        method,
        url,
        status.as_u16(),
        elapsed.as_secs_f64()
    )
}

fn full_url(req: &ServiceRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}{}", info.scheme(), info.host(), req.uri())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::BoxBody;
    use actix_web::{test, web, App, HttpResponse};

    use crate::error::PredictError;

    #[actix_rt::test]
    async fn passes_responses_through_unchanged() {
        let teapot = || async { HttpResponse::ImATeapot().body("short and stout") };
        let app = test::init_service(
            App::new()
                .wrap(RequestLog)
                .route("/teapot", web::get().to(teapot)),
        )
        .await;

        let req = test::TestRequest::get().uri("/teapot?x=1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
        let body = test::read_body(resp).await;
        assert_eq!(body, "short and stout");
    }

    #[actix_rt::test]
    async fn builds_absolute_url() {
        let req = test::TestRequest::get()
            .uri("/api/predict?debug=1")
            .insert_header(("host", "sensors.local:5000"))
            .to_srv_request();
        assert_eq!(full_url(&req), "http://sensors.local:5000/api/predict?debug=1");
    }

    #[::core::prelude::v1::test]
    fn request_line_has_method_url_status_and_seconds() {
        let line = request_line(
            &Method::POST,
            "http://localhost:5000/api/predict",
            StatusCode::OK,
            Duration::from_micros(1_234_567),
        );
        assert_eq!(line, "Request: POST http://localhost:5000/api/predict - 200 - 1.2346s");
    }

    #[::core::prelude::v1::test]
    fn unrendered_error_reports_its_status() {
        let res: Result<ServiceResponse<BoxBody>, Error> =
            Err(PredictError::Inference("worker gone".into()).into());
        assert_eq!(response_status(&res), StatusCode::INTERNAL_SERVER_ERROR);
        let status = response_status(&res);
        let line = request_line(&Method::POST, "http://h/api/predict", status, Duration::ZERO);
        assert_eq!(line, "Request: POST http://h/api/predict - 500 - 0.0000s");
    }

    #[actix_rt::test]
    async fn failing_handler_is_seen_as_server_error() {
        let failing = || async { Err::<HttpResponse, _>(PredictError::Body("bad".into())) };
        let app = test::init_service(
            App::new()
                .wrap(RequestLog)
                .route("/fail", web::post().to(failing)),
        )
        .await;

        let req = test::TestRequest::post().uri("/fail").to_request();
        let res = app.call(req).await;
        assert_eq!(response_status(&res), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
