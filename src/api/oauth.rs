// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account-linking endpoints for the voice-assistant skill.
//!
//! All three routes are declared public. `approve` is reached from a plain
//! HTML form, which cannot carry the `x-app-token` header, so it checks the
//! app token posted in the form body against the same registry the
//! middleware uses.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::{AuthError, Role},
    bridge::{LinkError, TokenGrant},
    state::AppState,
};

/// Roles allowed to link an assistant account.
const LINKING_ROLES: [Role; 2] = [Role::Admin, Role::Operator];

/// RFC 6749 error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct OAuthErrorBody {
    pub error: String,
}

/// HTTP rendering of a [`LinkError`].
#[derive(Debug)]
pub struct OAuthError(pub LinkError);

impl From<LinkError> for OAuthError {
    fn from(error: LinkError) -> Self {
        Self(error)
    }
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            LinkError::InvalidClient => StatusCode::UNAUTHORIZED,
            LinkError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            LinkError::InvalidRequest
            | LinkError::InvalidGrant
            | LinkError::UnsupportedGrantType => StatusCode::BAD_REQUEST,
        };
        let body = Json(OAuthErrorBody {
            error: self.0.to_string(),
        });
        (status, [(header::CACHE_CONTROL, "no-store")], body).into_response()
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuthorizeQuery {
    pub client_id: String,
    pub redirect_uri: String,
    pub response_type: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[utoipa::path(
    get,
    path = "/alexa/oauth/authorize",
    params(AuthorizeQuery),
    tag = "Account Linking",
    responses(
        (status = 200, description = "Approval page", content_type = "text/html"),
        (status = 400, body = OAuthErrorBody),
        (status = 401, body = OAuthErrorBody)
    )
)]
pub async fn authorize(
    State(state): State<AppState>,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Html<String>, OAuthError> {
    state
        .linking
        .check_authorize(&query.client_id, &query.redirect_uri, &query.response_type)?;
    Ok(Html(approval_page(&query)))
}

fn approval_page(query: &AuthorizeQuery) -> String {
    let state = query.state.as_deref().unwrap_or_default();
    format!(
        r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Link voice assistant</title></head>
<body>
<h1>Link your voice assistant</h1>
<p>Paste an admin or operator app token to allow the assistant to act on your behalf.</p>
<form method="post" action="/alexa/oauth/approve">
<input type="hidden" name="client_id" value="{client_id}">
<input type="hidden" name="redirect_uri" value="{redirect_uri}">
<input type="hidden" name="state" value="{state}">
<label>App token <input type="password" name="app_token" autocomplete="off"></label>
<button type="submit">Approve</button>
</form>
</body>
</html>
"#,
        client_id = escape_html(&query.client_id),
        redirect_uri = escape_html(&query.redirect_uri),
        state = escape_html(state),
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveForm {
    pub client_id: String,
    pub redirect_uri: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub app_token: Option<String>,
}

/// Who is approving the link. Errors use the app-token error envelope.
fn approving_user(state: &AppState, app_token: Option<&str>) -> Result<String, AuthError> {
    if !state.security.enabled() {
        return Ok("anonymous".to_string());
    }
    let token = app_token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::AuthenticationRequired)?;
    let entry = state
        .security
        .lookup(token)
        .ok_or(AuthError::InvalidCredential)?;
    if !LINKING_ROLES.contains(&entry.role) {
        return Err(AuthError::Forbidden);
    }
    Ok(entry.label.clone())
}

#[utoipa::path(
    post,
    path = "/alexa/oauth/approve",
    request_body(content = ApproveForm, content_type = "application/x-www-form-urlencoded"),
    tag = "Account Linking",
    responses(
        (status = 303, description = "Redirect back to the assistant with code and state"),
        (status = 400, body = OAuthErrorBody),
        (status = 401, body = crate::error::ErrorBody),
        (status = 403, body = crate::error::ErrorBody)
    )
)]
pub async fn approve(State(state): State<AppState>, Form(form): Form<ApproveForm>) -> Response {
    let linked_by = match approving_user(&state, form.app_token.as_deref()) {
        Ok(label) => label,
        Err(error) => return error.into_response(),
    };

    let code = match state
        .linking
        .issue_code(&form.client_id, &form.redirect_uri, &linked_by, Utc::now())
        .await
    {
        Ok(code) => code,
        Err(error) => return OAuthError(error).into_response(),
    };

    let Ok(mut target) = Url::parse(&form.redirect_uri) else {
        return OAuthError(LinkError::InvalidRequest).into_response();
    };
    {
        let mut pairs = target.query_pairs_mut();
        pairs.append_pair("code", &code);
        if let Some(s) = form.state.as_deref() {
            pairs.append_pair("state", s);
        }
    }

    tracing::info!(linked_by = %linked_by, client_id = %form.client_id, "Account link approved");
    Redirect::to(target.as_str()).into_response()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenForm {
    pub grant_type: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_token: String,
}

impl From<TokenGrant> for TokenResponse {
    fn from(grant: TokenGrant) -> Self {
        Self {
            access_token: grant.access_token,
            token_type: grant.token_type.to_string(),
            expires_in: grant.expires_in,
            refresh_token: grant.refresh_token,
        }
    }
}

#[utoipa::path(
    post,
    path = "/alexa/oauth/token",
    request_body(content = TokenForm, content_type = "application/x-www-form-urlencoded"),
    tag = "Account Linking",
    responses(
        (status = 200, body = TokenResponse),
        (status = 400, body = OAuthErrorBody),
        (status = 401, body = OAuthErrorBody)
    )
)]
pub async fn token(
    State(state): State<AppState>,
    Form(form): Form<TokenForm>,
) -> Result<Response, OAuthError> {
    let client_id = form.client_id.as_deref().ok_or(LinkError::InvalidClient)?;
    let client_secret = form
        .client_secret
        .as_deref()
        .ok_or(LinkError::InvalidClient)?;
    let now = Utc::now();

    let grant = match form.grant_type.as_str() {
        "authorization_code" => {
            let code = form.code.as_deref().ok_or(LinkError::InvalidRequest)?;
            state
                .linking
                .exchange_code(client_id, client_secret, code, form.redirect_uri.as_deref(), now)
                .await?
        }
        "refresh_token" => {
            let refresh_token = form
                .refresh_token
                .as_deref()
                .ok_or(LinkError::InvalidRequest)?;
            state
                .linking
                .refresh(client_id, client_secret, refresh_token, now)
                .await?
        }
        _ => return Err(LinkError::UnsupportedGrantType.into()),
    };

    Ok((
        [(header::CACHE_CONTROL, "no-store")],
        Json(TokenResponse::from(grant)),
    )
        .into_response())
}
