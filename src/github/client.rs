use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::{
    StatusCode, Url,
    header::{self, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize};

use super::{CommitInfo, EntryKind, FileContent, FileStore, GitHubFile, RepoContent, StoreError};
use crate::config::GithubConfig;

/// 基于 GitHub Contents API 的 [`FileStore`] 实现。
///
/// 所有路径都相对于仓库根目录，配置了分支时读写都指向该分支。
#[derive(Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    api_url: Url,
    owner: String,
    repo: String,
    branch: Option<String>,
}

impl GithubClient {
    /// 使用配置创建客户端
    ///
    /// ```ignore
    /// let client = GithubClient::new(&config.github)?;
    /// ```
    pub fn new(config: &GithubConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .default_headers({
                let mut header = HeaderMap::new();
                header.insert(
                    header::ACCEPT,
                    HeaderValue::from_static("application/vnd.github+json"),
                );
                header.insert(
                    "X-GitHub-Api-Version",
                    HeaderValue::from_static("2022-11-28"),
                );
                let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))?;
                auth.set_sensitive(true);
                header.insert(header::AUTHORIZATION, auth);
                header
            })
            .build()?;

        let api_url = Url::parse(&config.api_url)
            .map_err(|e| StoreError::InvalidUrl(format!("{}: {e}", config.api_url)))?;

        Ok(Self {
            client,
            api_url,
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
        })
    }

    /// `{api_url}/repos/{owner}/{repo}/{segments...}`，每段都会做百分号编码。
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, StoreError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.api_url.to_string()))?
            .pop_if_empty()
            .extend(["repos", self.owner.as_str(), self.repo.as_str()])
            .extend(segments);
        Ok(url)
    }

    fn contents_url(&self, path: &str) -> Result<Url, StoreError> {
        self.endpoint(
            std::iter::once("contents").chain(path.split('/').filter(|s| !s.is_empty())),
        )
    }

    /// 获取仓库信息
    pub async fn repository(&self) -> Result<RepoInfo, StoreError> {
        let url = self.endpoint(std::iter::empty())?;
        let resp = self.client.get(url).send().await?;
        let resp = error_for_status(resp, &format!("{}/{}", self.owner, self.repo)).await?;
        Ok(resp.json().await?)
    }

    /// 检查仓库与文章目录的访问情况。
    ///
    /// 文章目录不存在或不是目录时 [`Diagnosis::posts`] 为 `None`，
    /// 其他错误直接返回。
    pub async fn diagnose(&self, posts_path: &str) -> Result<Diagnosis, StoreError> {
        let repository = self.repository().await?;

        let posts = match self.get_content(posts_path).await {
            Ok(RepoContent::Dir(entries)) => Some(entries),
            Ok(RepoContent::File(_)) => None,
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };

        Ok(Diagnosis {
            repository,
            posts_path: posts_path.to_string(),
            posts,
        })
    }
}

/// 将非成功状态转换为 [`StoreError`]
async fn error_for_status(
    resp: reqwest::Response,
    path: &str,
) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let message = resp
        .json::<ApiMessage>()
        .await
        .map(|m| m.message)
        .unwrap_or_default();

    Err(match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(path.to_string()),
        // 409: sha 与远端不一致；422: 文件已存在却没有提供 sha
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            StoreError::Conflict(format!("{path}: {message}"))
        }
        status => StoreError::Status { status, message },
    })
}

#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

/// Contents API 的响应：目录返回数组，文件返回对象
#[derive(Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Dir(Vec<GitHubFile>),
    Item(ContentItem),
}

#[derive(Deserialize)]
struct ContentItem {
    name: String,
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: EntryKind,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

impl ContentItem {
    fn into_file(self) -> Result<FileContent, StoreError> {
        if self.kind != EntryKind::File {
            return Err(StoreError::UnexpectedKind {
                path: self.path,
                expected: "file",
            });
        }

        let Some(encoded) = self
            .content
            .filter(|_| self.encoding.as_deref() == Some("base64"))
        else {
            return Err(StoreError::MissingContent(self.path));
        };

        // GitHub 返回的 base64 每 60 个字符换一次行
        let compact: String = encoded.split_ascii_whitespace().collect();
        let bytes = STANDARD.decode(compact)?;

        Ok(FileContent {
            name: self.name,
            path: self.path,
            sha: self.sha,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

#[derive(Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Deserialize)]
struct PutResponse {
    content: PutContent,
    commit: PutCommit,
}

#[derive(Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Deserialize)]
struct PutCommit {
    sha: String,
}

impl FileStore for GithubClient {
    async fn get_content(&self, path: &str) -> Result<RepoContent, StoreError> {
        let mut request = self.client.get(self.contents_url(path)?);
        if let Some(branch) = &self.branch {
            request = request.query(&[("ref", branch.as_str())]);
        }

        let resp = error_for_status(request.send().await?, path).await?;

        match resp.json::<ContentsResponse>().await? {
            ContentsResponse::Dir(entries) => Ok(RepoContent::Dir(entries)),
            ContentsResponse::Item(item) => item.into_file().map(RepoContent::File),
        }
    }

    async fn create_or_update_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> Result<CommitInfo, StoreError> {
        let body = PutRequest {
            message,
            content: STANDARD.encode(content),
            sha,
            branch: self.branch.as_deref(),
        };

        let resp = self
            .client
            .put(self.contents_url(path)?)
            .json(&body)
            .send()
            .await?;
        let resp = error_for_status(resp, path).await?;

        let data: PutResponse = resp.json().await?;

        Ok(CommitInfo {
            sha: data.content.sha,
            commit_sha: data.commit.sha,
        })
    }
}

/// 仓库信息
#[derive(Debug, Clone, Deserialize)]
pub struct RepoInfo {
    pub name: String,
    pub private: bool,
    pub default_branch: String,
}

/// [`GithubClient::diagnose`] 的检查结果
#[derive(Debug)]
pub struct Diagnosis {
    pub repository: RepoInfo,
    pub posts_path: String,
    pub posts: Option<Vec<GitHubFile>>,
}

impl fmt::Display for Diagnosis {
    /// 输出示例：
    /// ```text
    /// repository: church-site (private: false, default branch: main)
    /// posts: 2 entries in `posts`
    ///   [file] 1718000000000-welcome.md
    ///   [dir]  drafts
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "repository: {} (private: {}, default branch: {})",
            self.repository.name, self.repository.private, self.repository.default_branch
        )?;

        match &self.posts {
            None => write!(f, "posts: `{}` is missing or not a directory", self.posts_path),
            Some(entries) => {
                write!(f, "posts: {} entries in `{}`", entries.len(), self.posts_path)?;
                for entry in entries {
                    let kind = match entry.kind {
                        EntryKind::File => "[file]",
                        EntryKind::Dir => "[dir]",
                        EntryKind::Symlink => "[link]",
                        EntryKind::Submodule => "[sub]",
                    };
                    write!(f, "\n  {:<6} {}", kind, entry.name)?;
                }
                Ok(())
            }
        }
    }
}
