use crate::error::ErrorBody;
use axum::{
    body::to_bytes,
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

/// Completes error responses with the request path. Typed errors carry their
/// body in a response extension; everything else with an error status
/// (extractor rejections, oversized payloads, unmatched type params) gets
/// reshaped into the same body here, so every error the service emits has
/// one shape.
pub async fn error_context(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    if let Some(body) = response.extensions().get::<ErrorBody>() {
        let mut body = body.clone();
        body.path = path;
        return (status, Json(body)).into_response();
    }

    let (_, raw_body) = response.into_parts();
    let message = match to_bytes(raw_body, 64 * 1024).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
        Err(_) => String::new(),
    };
    let message = if message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        message
    };

    let mut body = ErrorBody::new(status, message);
    body.path = path;
    (status, Json(body)).into_response()
}
