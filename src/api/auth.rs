use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use axum_extra::extract::SignedCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    github::FileStore,
    session::{AUTH_KEY, AdminSession},
    state::AppState,
};

/// - `POST /login`：密码正确时写入签名的登录 cookie
/// - `POST /logout`：清除登录 cookie
pub fn setup_route<S: FileStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route("/login", post(login::<S>))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    password: String,
}

async fn login<S: FileStore + 'static>(
    jar: SignedCookieJar,
    State(app): State<AppState<S>>,
    Json(form): Json<LoginForm>,
) -> Result<(SignedCookieJar, StatusCode)> {
    let mut session = AdminSession::restore(jar.get(AUTH_KEY).as_ref().map(|c| c.value()));
    if !session.login(&form.password, app.secret()) {
        tracing::warn!("admin login rejected");
        return Err(Error::Unauthorized);
    }

    let jar = match session.persisted_value() {
        Some(value) => jar.add(
            Cookie::build((AUTH_KEY, value))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax),
        ),
        None => jar,
    };
    Ok((jar, StatusCode::NO_CONTENT))
}

async fn logout(jar: SignedCookieJar) -> (SignedCookieJar, StatusCode) {
    (
        jar.remove(Cookie::build(AUTH_KEY).path("/")),
        StatusCode::NO_CONTENT,
    )
}
