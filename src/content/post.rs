use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 一篇文章。
///
/// `id` 来自存储文件名（去掉扩展名），写入后不再改变；
/// `slug` 是对外路由使用的标识，二者可以不同。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub author: String,
    pub content: String,
    pub excerpt: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub slug: String,
    pub tags: Vec<String>,
}

/// 解码结果。
///
/// - [`DecodedPost::Parsed`]：文件带有完整的 front matter
/// - [`DecodedPost::Synthetic`]：文件缺少 front matter，按文件名构造的兜底文章
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedPost {
    Parsed(Post),
    Synthetic(Post),
}

impl DecodedPost {
    pub fn post(&self) -> &Post {
        match self {
            DecodedPost::Parsed(post) | DecodedPost::Synthetic(post) => post,
        }
    }

    pub fn into_post(self) -> Post {
        match self {
            DecodedPost::Parsed(post) | DecodedPost::Synthetic(post) => post,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, DecodedPost::Synthetic(_))
    }
}

/// 后台表单提交的数据。
///
/// `tags` 为逗号分隔的文本，例如 `"worship, youth"`。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostForm {
    pub title: String,
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub tags: String,
}

impl PostForm {
    /// 检查必填字段。
    ///
    /// `title`、`content`、`author` 去掉空白后都不能为空，
    /// 否则返回第一个缺失字段的提示。
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("title is required");
        }
        if self.content.trim().is_empty() {
            return Err("content is required");
        }
        if self.author.trim().is_empty() {
            return Err("author is required");
        }
        Ok(())
    }

    /// 拆分标签文本，去掉空白和空项。
    pub fn tag_list(&self) -> Vec<String> {
        split_tags(&self.tags)
    }
}

/// 按逗号拆分标签，去掉两端空白并过滤空项，保持原有顺序。
pub(crate) fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(title: &str, content: &str, author: &str) -> PostForm {
        PostForm {
            title: title.to_string(),
            content: content.to_string(),
            author: author.to_string(),
            tags: String::new(),
        }
    }

    #[test]
    fn test_validate() {
        assert!(form("Title", "Body", "Pastor Lee").validate().is_ok());
        assert_eq!(form("  ", "Body", "A").validate(), Err("title is required"));
        assert_eq!(form("T", "\n\t", "A").validate(), Err("content is required"));
        assert_eq!(form("T", "Body", "").validate(), Err("author is required"));
    }

    #[test]
    fn test_tag_list() {
        let mut f = form("T", "B", "A");
        f.tags = " worship, ,youth ,, prayer ".to_string();
        assert_eq!(f.tag_list(), vec!["worship", "youth", "prayer"]);

        f.tags = String::new();
        assert!(f.tag_list().is_empty());
    }

    #[test]
    fn test_post_serializes_camel_case() {
        let now = Utc::now();
        let post = Post {
            id: "1-a".to_string(),
            title: "A".to_string(),
            author: "B".to_string(),
            content: "C".to_string(),
            excerpt: "C...".to_string(),
            created_at: now,
            updated_at: now,
            slug: "a".to_string(),
            tags: vec!["x".to_string()],
        };

        let value = serde_json::to_value(&post).expect("Failed to serialize");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn test_decoded_post_variants() {
        let now = Utc::now();
        let post = Post {
            id: "x".to_string(),
            title: "x".to_string(),
            author: "Unknown".to_string(),
            content: String::new(),
            excerpt: "...".to_string(),
            created_at: now,
            updated_at: now,
            slug: "x".to_string(),
            tags: vec![],
        };

        let parsed = DecodedPost::Parsed(post.clone());
        let synthetic = DecodedPost::Synthetic(post.clone());
        assert!(!parsed.is_synthetic());
        assert!(synthetic.is_synthetic());
        assert_eq!(synthetic.post(), &post);
        assert_eq!(parsed.into_post(), post);
    }
}
