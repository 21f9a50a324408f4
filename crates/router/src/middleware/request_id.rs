//! §4.9 step 2: read `X-Request-ID` if the caller sent one, else mint
//! `req_` + 24 URL-safe characters. Echoed back on every response,
//! success or error, so a client's retry and the server's log line for it
//! can always be joined on this value.

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::middleware::Next;
use actix_web::Error;

use super::RequestId;

const HEADER: &str = "X-Request-ID";

pub async fn request_id(mut req: ServiceRequest, next: Next<impl MessageBody>) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let id = req
        .headers()
        .get(HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(common_utils::ids::generate_request_id);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.call(req).await?;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(HeaderName::from_static("x-request-id"), value);
    }
    Ok(res)
}
