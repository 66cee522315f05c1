// crates/rbac-gate-server/src/middleware.rs
// ============================================================================
// Module: Authorization Middleware
// Description: axum adapter for the authorization pipeline.
// Purpose: Enforce pipeline outcomes on matched routes.
// Dependencies: axum, serde_json
// ============================================================================

//! ## Overview
//! [`authorize_request`] is installed with `route_layer` so the matched route
//! template and path parameters are already known. Admitted requests carry
//! the resolved [`Principal`] as a request extension.
//!
//! [`Principal`]: crate::auth::Principal

use std::sync::Arc;

use axum::Json;
use axum::extract::FromRequestParts;
use axum::extract::MatchedPath;
use axum::extract::RawPathParams;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use serde_json::json;

use crate::pipeline::AuthorizationPipeline;
use crate::pipeline::PipelineOutcome;
use crate::pipeline::PipelineRequest;
use crate::pipeline::Rejection;
use crate::pipeline::render_route_template;

/// Header carrying a caller-supplied request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";
/// Maximum accepted length of a caller-supplied request identifier.
const MAX_REQUEST_ID_LENGTH: usize = 128;
/// Path parameter naming the targeted resource.
const RESOURCE_ID_PARAM: &str = "id";

/// Runs the authorization pipeline in front of a matched route.
pub async fn authorize_request(
    State(pipeline): State<Arc<AuthorizationPipeline>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let Some(template) = parts.extensions.get::<MatchedPath>().map(|path| path.as_str().to_string())
    else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "route not classified");
    };
    let resource_id = RawPathParams::from_request_parts(&mut parts, &()).await.ok().and_then(
        |params| {
            params
                .iter()
                .find(|(name, _)| *name == RESOURCE_ID_PARAM)
                .map(|(_, value)| value.to_string())
        },
    );
    let pipeline_request = PipelineRequest {
        method: parts.method.as_str().to_string(),
        path: parts.uri.path().to_string(),
        route_template: render_route_template(&template),
        resource_id,
        authorization: header_str(&parts.headers, AUTHORIZATION.as_str()),
        request_id: header_str(&parts.headers, REQUEST_ID_HEADER)
            .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LENGTH)
            .unwrap_or_else(|| pipeline.next_request_id()),
    };

    match pipeline.authorize(&pipeline_request).await {
        PipelineOutcome::Bypassed => next.run(Request::from_parts(parts, body)).await,
        PipelineOutcome::Admitted {
            principal,
            ..
        } => {
            parts.extensions.insert(principal);
            next.run(Request::from_parts(parts, body)).await
        }
        PipelineOutcome::Rejected(rejection) => rejection.into_response(),
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        error_response(self.status, self.message)
    }
}

/// Builds a JSON `{ "error": message }` response.
pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Returns a header value when it is valid visible ASCII.
fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
}
