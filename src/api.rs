mod auth;
mod posts;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::{
    error::{Error, Result},
    github::FileStore,
    state::AppState,
};

pub use self::posts::PostView;

/// 设置应用的路由。
///
/// 将 `/api` 下的文章接口和登录接口组合在一起，并绑定应用状态。
pub fn setup_route<S: FileStore + 'static>(app: AppState<S>) -> Router {
    Router::new()
        .nest("/api", posts::setup_route().merge(auth::setup_route()))
        .with_state(app)
}

/// 在 `addr` 上启动 HTTP 服务，并使用给定的路由处理请求。
#[instrument(name = "http server", skip(router))]
pub async fn run_server_with_router(router: Router, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("listening on {addr}");

    axum::serve(listener, router).await.map_err(Error::Io)
}

/// 启动 HTTP 服务，自动设置路由和中间件。
///
/// 1. 生成路由
/// 2. 添加追踪中间件
/// 3. 启动服务器
pub async fn run_server<S: FileStore + 'static>(app: AppState<S>, addr: &str) -> Result<()> {
    let router = add_middlewares(setup_route(app));
    run_server_with_router(router, addr).await
}

/// 请求失败时输出错误日志，不记录普通请求。
fn add_middlewares(router: Router) -> Router {
    fn log_failure(
        err: tower_http::classify::ServerErrorsFailureClass,
        latency: std::time::Duration,
        _span: &tracing::Span,
    ) {
        tracing::error!(error = %err, ?latency, "request failed");
    }

    router.layer(
        TraceLayer::new_for_http()
            .on_failure(log_failure)
            .on_request(()),
    )
}
