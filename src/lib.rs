pub mod api;
pub mod config;
pub mod content;
pub mod error;
pub mod github;
pub mod session;
pub mod state;
pub mod storage;

use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use config::Config;
use github::GithubClient;
use session::{AdminSecret, signing_key};
use state::AppState;
use storage::ContentStore;

/// 初始化日志，过滤规则读取 `GITPOST_LOG`
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .with_env_filter(EnvFilter::from_env("GITPOST_LOG"))
        .init();
}

pub async fn run() -> error::Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    let client = GithubClient::new(&config.github)?;
    tracing::info!(
        owner = %config.github.owner,
        repo = %config.github.repo,
        posts_path = %config.posts_path,
        "using github content store"
    );

    let store = ContentStore::new(client, config.posts_path.clone())
        .with_fetch_concurrency(config.fetch_concurrency);
    let key = signing_key(config.session_key.as_deref())?;
    let app = AppState::new(store, AdminSecret::new(config.admin_password), key);

    api::run_server(app, &config.listen_addr).await
}
