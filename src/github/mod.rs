mod client;
mod error;

use serde::Deserialize;

pub use self::{
    client::{Diagnosis, GithubClient, RepoInfo},
    error::StoreError,
};

/// 目录项的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
}

/// 目录列表中的一项，只读。
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubFile {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// 并发令牌
    pub sha: String,
}

/// 单个文件，内容已解码为文本。
#[derive(Debug, Clone)]
pub struct FileContent {
    pub name: String,
    pub path: String,
    pub sha: String,
    pub text: String,
}

/// 按路径获取到的内容：目录列表或单个文件。
#[derive(Debug, Clone)]
pub enum RepoContent {
    Dir(Vec<GitHubFile>),
    File(FileContent),
}

/// 一次提交的结果
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// 新文件内容的 sha，下次更新时作为并发令牌
    pub sha: String,
    /// 提交的 sha
    pub commit_sha: String,
}

/// 远程文件存储。
///
/// 以路径读写文件，写入时用 `sha` 做乐观并发控制：
/// 传入的 `sha` 与远端不一致时必须返回 [`StoreError::Conflict`]。
pub trait FileStore: Send + Sync {
    /// 获取路径对应的目录列表或文件。
    ///
    /// 路径不存在时返回 [`StoreError::NotFound`]。
    fn get_content(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<RepoContent, StoreError>> + Send;

    /// 创建或更新文件。
    ///
    /// `sha` 为 `None` 时新建，否则更新该版本的文件。
    fn create_or_update_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> impl std::future::Future<Output = Result<CommitInfo, StoreError>> + Send;

    /// 获取单个文件，路径是目录时返回 [`StoreError::UnexpectedKind`]。
    fn get_file(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<FileContent, StoreError>> + Send {
        async move {
            match self.get_content(path).await? {
                RepoContent::File(file) => Ok(file),
                RepoContent::Dir(_) => Err(StoreError::UnexpectedKind {
                    path: path.to_string(),
                    expected: "file",
                }),
            }
        }
    }
}
