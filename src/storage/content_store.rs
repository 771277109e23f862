use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::instrument;

use crate::{
    content::{self, DecodedPost, MARKDOWN_EXT, PostForm, slugify},
    error::{Error, Result},
    github::{EntryKind, FileStore, GitHubFile, RepoContent, StoreError},
};

/// 标题生成不出 slug 时使用的名字
const FALLBACK_SLUG: &str = "post";

/// 一次成功写入的结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPost {
    /// 对外路由使用的 slug
    pub slug: String,
    /// `{毫秒时间戳}-{标题 slug}.md`
    pub filename: String,
    /// 仓库中的完整路径
    pub path: String,
    /// `true` 为新建，`false` 为覆盖已有文件
    pub created: bool,
    /// 新文件内容的 sha
    pub sha: String,
    pub commit_sha: String,
}

/// 以远程仓库目录作为文章存储。
///
/// 读取时列出目录中的 Markdown 文件并逐个解码，写入时生成文件名和 front matter
/// 后提交到 [`FileStore`]。不做任何缓存，每次读取都重新拉取。
pub struct ContentStore<S> {
    files: S,
    posts_path: String,
    fetch_concurrency: usize,
}

impl<S: FileStore> ContentStore<S> {
    pub fn new(files: S, posts_path: impl Into<String>) -> Self {
        Self {
            files,
            posts_path: posts_path.into().trim_matches('/').to_string(),
            fetch_concurrency: 1,
        }
    }

    /// 设置列表时同时拉取的文件数，最小为 1。
    ///
    /// 结果顺序与目录列表一致，不受并发影响。
    pub fn with_fetch_concurrency(mut self, n: usize) -> Self {
        self.fetch_concurrency = n.max(1);
        self
    }

    /// 底层文件存储
    pub fn files(&self) -> &S {
        &self.files
    }

    fn post_path(&self, filename: &str) -> String {
        format!("{}/{}", self.posts_path, filename)
    }

    /// 列出全部文章，按 `createdAt` 从新到旧排序。
    ///
    /// 出错时记录日志并返回空列表。
    pub async fn list_posts(&self) -> Vec<DecodedPost> {
        match self.try_list_posts().await {
            Ok(posts) => posts,
            Err(e) => {
                tracing::error!(%e, "failed to list posts");
                Vec::new()
            }
        }
    }

    /// 列出全部文章，按 `createdAt` 从新到旧排序，时间相同的保持目录顺序。
    ///
    /// - 文章目录不存在或不是目录：返回空列表
    /// - 单个文件无法解析或拉取失败：得到 [`DecodedPost::Synthetic`]，不会被丢弃
    /// - 目录列表本身失败：返回错误
    #[instrument(skip(self), fields(path = %self.posts_path))]
    pub async fn try_list_posts(&self) -> std::result::Result<Vec<DecodedPost>, StoreError> {
        let entries = match self.files.get_content(&self.posts_path).await {
            Ok(RepoContent::Dir(entries)) => entries,
            Ok(RepoContent::File(_)) => {
                tracing::warn!("posts path is a file, not a directory");
                return Ok(Vec::new());
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!("posts directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let markdown: Vec<&GitHubFile> = entries
            .iter()
            .filter(|e| e.kind == EntryKind::File && e.name.ends_with(MARKDOWN_EXT))
            .collect();
        tracing::debug!(total = entries.len(), markdown = markdown.len(), "listed posts");

        let fetches: Vec<_> = markdown
            .into_iter()
            .map(|entry| self.fetch_post(entry))
            .collect();
        let mut posts: Vec<DecodedPost> = stream::iter(fetches)
            .buffered(self.fetch_concurrency)
            .collect()
            .await;

        // sort_by 是稳定排序
        posts.sort_by(|a, b| b.post().created_at.cmp(&a.post().created_at));
        Ok(posts)
    }

    async fn fetch_post(&self, entry: &GitHubFile) -> DecodedPost {
        match self.files.get_file(&entry.path).await {
            Ok(file) => content::decode(&file.text, &entry.name),
            Err(e) => {
                tracing::warn!(%e, file = %entry.name, "failed to fetch post, using placeholder");
                content::decode("", &entry.name)
            }
        }
    }

    /// 按 slug 查找文章，找不到或出错时返回 `None`。
    ///
    /// 先在列表中按排序找第一篇 slug 相同的文章，
    /// 找不到再尝试旧格式的 `{slug}.md`。
    pub async fn get_post(&self, slug: &str) -> Option<DecodedPost> {
        if let Some(post) = find_slug(self.list_posts().await, slug) {
            return Some(post);
        }

        match self.fetch_by_filename(slug).await {
            Ok(post) => post,
            Err(e) => {
                tracing::error!(%e, slug, "failed to fetch post");
                None
            }
        }
    }

    /// 与 [`ContentStore::get_post`] 相同，但会返回存储错误，
    /// 以便区分“不存在”和“暂时失败”。
    pub async fn try_get_post(
        &self,
        slug: &str,
    ) -> std::result::Result<Option<DecodedPost>, StoreError> {
        if let Some(post) = find_slug(self.try_list_posts().await?, slug) {
            return Ok(Some(post));
        }
        self.fetch_by_filename(slug).await
    }

    /// 旧格式文件名直接等于 slug
    async fn fetch_by_filename(
        &self,
        slug: &str,
    ) -> std::result::Result<Option<DecodedPost>, StoreError> {
        if slug.is_empty() || slug.starts_with('.') || slug.contains(['/', '\\']) {
            return Ok(None);
        }

        let filename = format!("{slug}{MARKDOWN_EXT}");
        match self.files.get_file(&self.post_path(&filename)).await {
            Ok(file) => Ok(Some(content::decode(&file.text, &filename))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// 保存一篇新文章。
    ///
    /// 1. 校验表单
    /// 2. 文件名为 `{毫秒时间戳}-{标题 slug}.md`
    /// 3. slug 由标题生成，已被占用时追加 `-2`、`-3`……
    /// 4. 查询目标路径上已有文件的 sha，不存在则新建
    /// 5. 编码并提交，sha 过期时提交失败
    ///
    /// 任何一步失败都返回错误，不会留下不完整的文件。
    pub async fn save_post(&self, form: &PostForm) -> Result<SavedPost> {
        self.save_post_at(form, Utc::now()).await
    }

    #[instrument(skip_all, fields(title = %form.title))]
    async fn save_post_at(&self, form: &PostForm, now: DateTime<Utc>) -> Result<SavedPost> {
        form.validate().map_err(Error::InvalidForm)?;

        let title_slug = match slugify(&form.title) {
            s if s.is_empty() => FALLBACK_SLUG.to_string(),
            s => s,
        };
        let filename = format!("{}-{}{}", now.timestamp_millis(), title_slug, MARKDOWN_EXT);
        let path = self.post_path(&filename);
        let slug = self.unique_slug(&title_slug).await?;

        let sha = match self.files.get_content(&path).await {
            Ok(RepoContent::File(file)) => Some(file.sha),
            Ok(RepoContent::Dir(_)) => None,
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        };

        let raw = content::encode(form, &slug, &filename, now);
        let action = if sha.is_some() { "Update" } else { "Create" };
        let message = format!("{action} blog post: {}", form.title.trim());

        let commit = self
            .files
            .create_or_update_file(&path, &raw, &message, sha.as_deref())
            .await?;

        tracing::info!(%path, %slug, commit = %commit.commit_sha, "{action}d post");

        Ok(SavedPost {
            slug,
            filename,
            path,
            created: sha.is_none(),
            sha: commit.sha,
            commit_sha: commit.commit_sha,
        })
    }

    /// 在现有文章中为 `base` 找一个未被占用的 slug。
    ///
    /// 列表失败时返回错误，无法确认 slug 是否被占用。
    async fn unique_slug(&self, base: &str) -> std::result::Result<String, StoreError> {
        let taken: HashSet<String> = self
            .try_list_posts()
            .await?
            .into_iter()
            .map(|p| p.into_post().slug)
            .collect();

        if !taken.contains(base) {
            return Ok(base.to_string());
        }

        let mut n = 2;
        loop {
            let candidate = format!("{base}-{n}");
            if !taken.contains(&candidate) {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}

fn find_slug(posts: Vec<DecodedPost>, slug: &str) -> Option<DecodedPost> {
    posts.into_iter().find(|p| p.post().slug == slug)
}
