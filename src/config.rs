use std::{env, fs, path::Path};

use serde::Deserialize;

use crate::error::{Error, Result};

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_POSTS_PATH: &str = "posts";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// GitHub 仓库配置
#[derive(Clone)]
pub struct GithubConfig {
    pub token: String,
    pub owner: String,
    pub repo: String,
    /// 为空时使用仓库默认分支
    pub branch: Option<String>,
    pub api_url: String,
}

/// 应用配置
#[derive(Clone)]
pub struct Config {
    pub github: GithubConfig,
    /// 文章目录，相对于仓库根目录
    pub posts_path: String,
    /// 后台登录密码
    pub admin_password: String,
    /// 登录 cookie 的签名密钥，为空时随机生成
    pub session_key: Option<String>,
    pub listen_addr: String,
    /// 列表时同时拉取的文件数，`1` 为逐个拉取
    pub fetch_concurrency: usize,
}

/// 配置文件的内容，所有字段都可省略
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialConfig {
    github: PartialGithub,
    posts_path: Option<String>,
    admin_password: Option<String>,
    session_key: Option<String>,
    listen_addr: Option<String>,
    fetch_concurrency: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialGithub {
    token: Option<String>,
    owner: Option<String>,
    repo: Option<String>,
    branch: Option<String>,
    api_url: Option<String>,
}

impl Config {
    /// 从环境变量加载配置。
    ///
    /// 如果设置了 `GITPOST_CONFIG`，先读取该 TOML 文件，再用环境变量覆盖。
    pub fn from_env() -> Result<Config> {
        let var = |key: &str| env::var(key).ok();
        match env::var("GITPOST_CONFIG") {
            Ok(path) => Self::load_file(path, var),
            Err(_) => Self::load(None, var),
        }
    }

    /// 读取 TOML 配置文件，再用变量覆盖，见 [`Config::load`]。
    pub fn load_file(
        path: impl AsRef<Path>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Config> {
        let toml_str = fs::read_to_string(path)?;
        Self::load(Some(&toml_str), var)
    }

    /// 由 TOML 文本和变量查询函数构建配置，变量优先。
    ///
    /// | 字段 | 变量 |
    /// |---|---|
    /// | `github.token` | `GITHUB_TOKEN` |
    /// | `github.owner` | `GITHUB_OWNER` |
    /// | `github.repo` | `GITHUB_REPO` |
    /// | `github.branch` | `GITHUB_BRANCH` |
    /// | `github.api_url` | `GITHUB_API_URL` |
    /// | `posts_path` | `GITPOST_POSTS_PATH` |
    /// | `admin_password` | `GITPOST_ADMIN_PASSWORD` |
    /// | `session_key` | `GITPOST_SESSION_KEY` |
    /// | `listen_addr` | `GITPOST_ADDR` |
    /// | `fetch_concurrency` | `GITPOST_FETCH_CONCURRENCY` |
    pub fn load(toml_str: Option<&str>, var: impl Fn(&str) -> Option<String>) -> Result<Config> {
        let file: PartialConfig = match toml_str {
            Some(s) => toml::from_str(s)?,
            None => PartialConfig::default(),
        };

        // 空字符串视为未设置
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let fetch_concurrency = match var("GITPOST_FETCH_CONCURRENCY") {
            Some(v) => Some(v.trim().parse::<usize>().map_err(|_| {
                Error::Config("GITPOST_FETCH_CONCURRENCY must be a positive integer")
            })?),
            None => file.fetch_concurrency,
        };
        let fetch_concurrency = match fetch_concurrency {
            Some(0) => {
                return Err(Error::Config("fetch_concurrency must be a positive integer"));
            }
            Some(n) => n,
            None => 1,
        };

        let github = GithubConfig {
            token: var("GITHUB_TOKEN")
                .or(file.github.token)
                .ok_or(Error::Config("GITHUB_TOKEN not set"))?,
            owner: var("GITHUB_OWNER")
                .or(file.github.owner)
                .ok_or(Error::Config("GITHUB_OWNER not set"))?,
            repo: var("GITHUB_REPO")
                .or(file.github.repo)
                .ok_or(Error::Config("GITHUB_REPO not set"))?,
            branch: var("GITHUB_BRANCH").or(file.github.branch),
            api_url: var("GITHUB_API_URL")
                .or(file.github.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        };

        let posts_path = var("GITPOST_POSTS_PATH")
            .or(file.posts_path)
            .unwrap_or_else(|| DEFAULT_POSTS_PATH.to_string())
            .trim_matches('/')
            .to_string();
        if posts_path.is_empty() {
            return Err(Error::Config("posts_path must not be empty"));
        }

        Ok(Config {
            github,
            posts_path,
            admin_password: var("GITPOST_ADMIN_PASSWORD")
                .or(file.admin_password)
                .ok_or(Error::Config("GITPOST_ADMIN_PASSWORD not set"))?,
            session_key: var("GITPOST_SESSION_KEY").or(file.session_key),
            listen_addr: var("GITPOST_ADDR")
                .or(file.listen_addr)
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            fetch_concurrency,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("GITHUB_TOKEN", "ghp_x"),
        ("GITHUB_OWNER", "grace-church"),
        ("GITHUB_REPO", "site"),
        ("GITPOST_ADMIN_PASSWORD", "hallelujah"),
    ];

    #[test]
    fn test_load_from_vars_with_defaults() {
        let config = Config::load(None, vars(REQUIRED)).expect("Failed to load config");

        assert_eq!(config.github.token, "ghp_x");
        assert_eq!(config.github.owner, "grace-church");
        assert_eq!(config.github.repo, "site");
        assert_eq!(config.github.branch, None);
        assert_eq!(config.github.api_url, DEFAULT_API_URL);
        assert_eq!(config.posts_path, "posts");
        assert_eq!(config.admin_password, "hallelujah");
        assert_eq!(config.session_key, None);
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        assert_eq!(config.fetch_concurrency, 1);
    }

    #[test]
    fn test_missing_required() {
        let result = Config::load(None, vars(&REQUIRED[1..]));
        assert!(matches!(result, Err(Error::Config("GITHUB_TOKEN not set"))));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("GITHUB_TOKEN", "  "));
        pairs.remove(0);
        let result = Config::load(None, vars(&pairs));
        assert!(matches!(result, Err(Error::Config("GITHUB_TOKEN not set"))));
    }

    #[test]
    fn test_invalid_concurrency() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("GITPOST_FETCH_CONCURRENCY", "many"));
        assert!(matches!(
            Config::load(None, vars(&pairs)),
            Err(Error::Config(_))
        ));

        pairs.pop();
        pairs.push(("GITPOST_FETCH_CONCURRENCY", "0"));
        assert!(matches!(
            Config::load(None, vars(&pairs)),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_toml_file_overridden_by_vars() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        write!(
            file,
            r#"
            posts_path = "/content/posts/"
            admin_password = "from-file"
            fetch_concurrency = 4

            [github]
            token = "file-token"
            owner = "file-owner"
            repo = "file-repo"
            branch = "gh-pages"
            "#
        )
        .expect("Failed to write config");

        let config = Config::load_file(
            file.path(),
            vars(&[("GITHUB_OWNER", "env-owner"), ("GITPOST_ADDR", "127.0.0.1:8080")]),
        )
        .expect("Failed to load config");

        assert_eq!(config.github.token, "file-token");
        assert_eq!(config.github.owner, "env-owner");
        assert_eq!(config.github.repo, "file-repo");
        assert_eq!(config.github.branch.as_deref(), Some("gh-pages"));
        assert_eq!(config.posts_path, "content/posts");
        assert_eq!(config.admin_password, "from-file");
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.fetch_concurrency, 4);
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let result = Config::load_file(dir.path().join("gitpost.toml"), vars(REQUIRED));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::load(Some("github = 3"), vars(REQUIRED));
        assert!(matches!(result, Err(Error::Toml(_))));
    }
}
