//! 后台登录状态。
//!
//! 只是一个共享密码开关，用来挡住发文入口，并不保护数据本身；
//! 真正的访问控制是 GitHub token。持久化到客户端的值需要签名，
//! 见 [`signing_key`]。

use axum_extra::extract::cookie::Key;

use crate::error::{Error, Result};

/// 持久化时使用的键名
pub const AUTH_KEY: &str = "blogAuth";

const AUTH_VALUE: &str = "true";

/// 后台密码
#[derive(Clone)]
pub struct AdminSecret(String);

impl AdminSecret {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    fn matches(&self, password: &str) -> bool {
        !self.0.is_empty() && self.0 == password
    }
}

/// 生成签名登录 cookie 的密钥。
///
/// `master` 至少 64 字节；为空时随机生成，服务重启后已有的登录失效。
pub fn signing_key(master: Option<&str>) -> Result<Key> {
    match master {
        Some(master) => Key::try_from(master.as_bytes())
            .map_err(|_| Error::Config("GITPOST_SESSION_KEY must be at least 64 bytes")),
        None => {
            tracing::warn!("GITPOST_SESSION_KEY not set, using a random session key");
            Ok(Key::generate())
        }
    }
}

/// 一次会话的登录状态。
///
/// 由调用方显式创建和持久化：
///
/// ```
/// use gitpost::session::{AdminSecret, AdminSession};
///
/// let secret = AdminSecret::new("hallelujah");
/// let mut session = AdminSession::restore(None);
/// assert!(!session.login("wrong", &secret));
/// assert!(session.login("hallelujah", &secret));
/// assert_eq!(session.persisted_value(), Some("true"));
///
/// session.logout();
/// assert!(!session.is_authenticated());
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AdminSession {
    authenticated: bool,
}

impl AdminSession {
    /// 从持久化的值恢复，只有 `"true"` 表示已登录
    pub fn restore(persisted: Option<&str>) -> Self {
        Self {
            authenticated: persisted == Some(AUTH_VALUE),
        }
    }

    /// 密码正确时登录并返回 `true`，否则状态不变
    pub fn login(&mut self, password: &str, secret: &AdminSecret) -> bool {
        let matched = secret.matches(password);
        if matched {
            self.authenticated = true;
        }
        matched
    }

    pub fn logout(&mut self) {
        self.authenticated = false;
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// 需要持久化的值，`None` 表示应清除
    pub fn persisted_value(&self) -> Option<&'static str> {
        self.authenticated.then_some(AUTH_VALUE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore() {
        assert!(AdminSession::restore(Some("true")).is_authenticated());
        assert!(!AdminSession::restore(Some("false")).is_authenticated());
        assert!(!AdminSession::restore(Some("TRUE ")).is_authenticated());
        assert!(!AdminSession::restore(None).is_authenticated());
    }

    #[test]
    fn test_login_logout() {
        let secret = AdminSecret::new("pw");
        let mut session = AdminSession::default();

        assert!(!session.login("nope", &secret));
        assert!(!session.is_authenticated());
        assert_eq!(session.persisted_value(), None);

        assert!(session.login("pw", &secret));
        assert!(session.is_authenticated());
        assert_eq!(session.persisted_value(), Some("true"));

        session.logout();
        assert!(!session.is_authenticated());
        assert_eq!(session.persisted_value(), None);
    }

    #[test]
    fn test_wrong_password_keeps_existing_login() {
        let secret = AdminSecret::new("pw");
        let mut session = AdminSession::restore(Some("true"));

        assert!(!session.login("nope", &secret));
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_signing_key() {
        let master = "k".repeat(64);
        let a = signing_key(Some(&master)).expect("64 字节应可用");
        let b = signing_key(Some(&master)).expect("64 字节应可用");
        assert_eq!(a.signing(), b.signing());

        assert!(matches!(
            signing_key(Some("short")),
            Err(Error::Config(_))
        ));
        assert!(signing_key(None).is_ok());
    }

    #[test]
    fn test_empty_secret_never_matches() {
        let secret = AdminSecret::new("");
        let mut session = AdminSession::default();
        assert!(!session.login("", &secret));
    }
}
