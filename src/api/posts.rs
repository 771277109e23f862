use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::SignedCookieJar;
use serde::Serialize;

use crate::{
    content::{DecodedPost, Post, PostForm},
    error::{Error, Result},
    github::FileStore,
    session::{AUTH_KEY, AdminSession},
    state::AppState,
    storage::SavedPost,
};

/// 配置文章相关路由。
///
/// - `GET /posts`：文章列表，从新到旧
/// - `GET /posts/{slug}`：获取单篇文章
/// - `POST /posts`：发布文章，需要登录
pub fn setup_route<S: FileStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route("/posts", get(post_list::<S>).post(post_create::<S>))
        .route("/posts/{slug}", get(post_detail::<S>))
}

/// 对外返回的文章。
///
/// `synthetic` 为 `true` 表示文件没有合法的 front matter，字段是推断出来的。
#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub synthetic: bool,
}

impl From<DecodedPost> for PostView {
    fn from(decoded: DecodedPost) -> Self {
        let synthetic = decoded.is_synthetic();
        Self {
            post: decoded.into_post(),
            synthetic,
        }
    }
}

async fn post_list<S: FileStore + 'static>(
    State(app): State<AppState<S>>,
) -> Json<Vec<PostView>> {
    let posts = app.store().list_posts().await;
    Json(posts.into_iter().map(PostView::from).collect())
}

/// 文章不存在时返回 [`Error::NotFound`]
async fn post_detail<S: FileStore + 'static>(
    Path(slug): Path<String>,
    State(app): State<AppState<S>>,
) -> Result<Json<PostView>> {
    let post = app.store().get_post(&slug).await.ok_or(Error::NotFound)?;
    Ok(Json(post.into()))
}

/// 未登录返回 [`Error::Unauthorized`]，表单不完整返回 [`Error::InvalidForm`]，
/// 提交失败返回 [`Error::Store`]。
async fn post_create<S: FileStore + 'static>(
    jar: SignedCookieJar,
    State(app): State<AppState<S>>,
    Json(form): Json<PostForm>,
) -> Result<(StatusCode, Json<SavedPost>)> {
    // 签名校验失败的 cookie 不会出现在 jar 中
    let session = AdminSession::restore(jar.get(AUTH_KEY).as_ref().map(|c| c.value()));
    if !session.is_authenticated() {
        return Err(Error::Unauthorized);
    }

    let saved = app.store().save_post(&form).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}
