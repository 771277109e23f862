use reqwest::StatusCode;

/// 远程文件存储的错误类型。
///
/// - [`StoreError::NotFound`]：路径不存在
/// - [`StoreError::Conflict`]：并发令牌（sha）过期或缺失，写入被拒绝
/// - [`StoreError::Status`]：其他非成功的 HTTP 状态
/// - [`StoreError::UnexpectedKind`]：路径类型不符（期望文件却是目录等）
/// - [`StoreError::MissingContent`]：文件没有可解码的内容
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 路径不存在
    #[error("path not found: {0}")]
    NotFound(String),

    /// 写入冲突
    #[error("write conflict: {0}")]
    Conflict(String),

    /// 其他 HTTP 错误
    #[error("github api returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    /// 路径类型不符
    #[error("expected a {expected} at `{path}`")]
    UnexpectedKind { path: String, expected: &'static str },

    /// 文件内容缺失或编码不支持
    #[error("no content found at `{0}`")]
    MissingContent(String),

    /// API 地址无效
    #[error("invalid api url: {0}")]
    InvalidUrl(String),

    /// 访问令牌无法放入请求头
    #[error(transparent)]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),

    /// 底层 reqwest 错误
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    /// 内容不是合法的 base64
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
