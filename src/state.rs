use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use crate::{github::FileStore, session::AdminSecret, storage::ContentStore};

/// 应用程序上下文
///
/// [`AppState`] 封装了文章存储、后台密码和 cookie 签名密钥，在组装时注入，提供统一访问入口。
pub struct AppState<S> {
    store: Arc<ContentStore<S>>,
    secret: AdminSecret,
    key: Key,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            secret: self.secret.clone(),
            key: self.key.clone(),
        }
    }
}

impl<S> FromRef<AppState<S>> for Key {
    fn from_ref(app: &AppState<S>) -> Key {
        app.key.clone()
    }
}

impl<S: FileStore> AppState<S> {
    /// 创建一个新的 [`AppState`] 实例
    pub fn new(store: ContentStore<S>, secret: AdminSecret, key: Key) -> Self {
        Self {
            store: Arc::new(store),
            secret,
            key,
        }
    }

    /// 获取文章存储
    pub fn store(&self) -> &ContentStore<S> {
        &self.store
    }

    /// 获取后台密码
    pub fn secret(&self) -> &AdminSecret {
        &self.secret
    }
}
