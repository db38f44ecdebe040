use axum::http::StatusCode;
use axum::{extract::Request, middleware::Next, response::IntoResponse, response::Response};

/// Any URI containing `..` is rejected outright before routing.
pub async fn reject_dotdot(request: Request, next: Next) -> Response {
    if request.uri().to_string().contains("..") {
        return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
    }
    next.run(request).await
}
