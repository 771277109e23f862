//! 文章文件格式的编码与解码。
//!
//! 文件以 front matter 开头，由两行 `---` 包围，每行一个 `key: "value"`，
//! 之后空一行是 Markdown 正文：
//!
//! ```text
//! ---
//! title: "<text>"
//! author: "<text>"
//! createdAt: "<ISO-8601>"
//! updatedAt: "<ISO-8601>"
//! slug: "<url-safe text>"
//! filename: "<text>"
//! excerpt: "<text>"
//! tags: "<comma-space-separated text>"
//! ---
//!
//! <markdown body>
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use super::post::{DecodedPost, Post, PostForm, split_tags};
use super::slug::slugify;

/// Markdown 文件扩展名
pub const MARKDOWN_EXT: &str = ".md";

/// 缺少作者时使用的占位值
pub const UNKNOWN_AUTHOR: &str = "Unknown";

const UNTITLED: &str = "Untitled";
const DELIM: &str = "---";
const EXCERPT_CHARS: usize = 150;
const ELLIPSIS: &str = "...";

/// front matter 中识别的字段，未出现或为空的字段为 `None`。
#[derive(Debug, Default, PartialEq)]
struct FrontMatter {
    title: Option<String>,
    author: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
    slug: Option<String>,
    excerpt: Option<String>,
    tags: Option<String>,
}

impl FrontMatter {
    /// 逐行解析 `key: value`。
    ///
    /// 只按第一个 `:` 切分，值两端的一层引号会被去掉。
    /// 空行、没有 `:` 的行、key 或 value（去掉引号后）为空的行以及未知 key 都会被忽略。
    fn parse<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut fm = FrontMatter::default();

        for line in lines {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            let value = strip_quotes(value.trim());
            if key.is_empty() || value.is_empty() {
                continue;
            }

            let value = Some(value.to_string());
            match key {
                "title" => fm.title = value,
                "author" => fm.author = value,
                "createdAt" => fm.created_at = value,
                "updatedAt" => fm.updated_at = value,
                "slug" => fm.slug = value,
                // id 总是取自实际的存储文件名
                "filename" => (),
                "excerpt" => fm.excerpt = value,
                "tags" => fm.tags = value,
                _ => (),
            }
        }

        fm
    }
}

/// 解码文章文件，使用当前时间作为缺省时间戳。
///
/// 见 [`decode_at`]。
pub fn decode(raw: &str, filename: &str) -> DecodedPost {
    decode_at(raw, filename, Utc::now())
}

/// 解码文章文件。
///
/// 首行必须是 `---` 且之后还有一行 `---`，否则按无结构的旧文件处理，
/// 返回 [`DecodedPost::Synthetic`]：标题取自文件名，正文为整个文件。
/// 该函数不会失败，任何文件都能得到一篇可展示的文章。
///
/// 缺省值：
/// - `title` → `"Untitled"`
/// - `author` → `"Unknown"`
/// - `excerpt` → 正文前 150 个字符加 `...`
/// - `createdAt` → `now`
/// - `updatedAt` → `createdAt`
/// - `slug` → 由 `title`（没有时用文件名）生成
/// - `tags` → 空
pub fn decode_at(raw: &str, filename: &str, now: DateTime<Utc>) -> DecodedPost {
    let normalized = normalize_newlines(raw);

    let (start, end) = {
        let mut markers = normalized
            .split('\n')
            .enumerate()
            .filter(|(_, line)| line.trim() == DELIM)
            .map(|(idx, _)| idx);
        (markers.next(), markers.next())
    };

    let end = match (start, end) {
        (Some(0), Some(end)) => end,
        _ => {
            tracing::warn!(filename, ?start, ?end, "no valid front matter, recovering post");
            return DecodedPost::Synthetic(synthetic_post(normalized, filename, now));
        }
    };

    let lines: Vec<&str> = normalized.split('\n').collect();
    let fm = FrontMatter::parse(lines[1..end].iter().copied());
    // 正文前的空行是分隔符，其余原样保留
    let body = match lines.get(end + 1) {
        Some(line) if line.trim().is_empty() => &lines[end + 2..],
        _ => &lines[end + 1..],
    };
    let content = body.join("\n");

    let id = file_id(filename);
    let slug = match fm.slug {
        Some(slug) => slug,
        None => slugify(fm.title.as_deref().unwrap_or(id)),
    };

    let created_at = fm
        .created_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(now);
    let updated_at = fm
        .updated_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(created_at);

    DecodedPost::Parsed(Post {
        id: id.to_string(),
        title: fm.title.unwrap_or_else(|| UNTITLED.to_string()),
        author: fm.author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        excerpt: fm.excerpt.unwrap_or_else(|| excerpt(&content)),
        tags: fm.tags.as_deref().map(split_tags).unwrap_or_default(),
        created_at,
        updated_at,
        slug,
        content,
    })
}

/// 将表单编码为文章文件内容。
///
/// `createdAt` 与 `updatedAt` 都写为 `now`，正文原样写在空行之后。
/// 写入 front matter 的值会被压成单行，避免破坏逐行的格式。
pub fn encode(form: &PostForm, slug: &str, filename: &str, now: DateTime<Utc>) -> String {
    let now = format_timestamp(now);
    let tags = form
        .tag_list()
        .iter()
        .map(|t| single_line(t))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{DELIM}
title: \"{title}\"
author: \"{author}\"
createdAt: \"{now}\"
updatedAt: \"{now}\"
slug: \"{slug}\"
filename: \"{filename}\"
excerpt: \"{excerpt}\"
tags: \"{tags}\"
{DELIM}

{content}",
        title = single_line(form.title.trim()),
        author = single_line(form.author.trim()),
        excerpt = single_line(&excerpt(&form.content)),
        content = form.content,
    )
}

/// 文件名去掉 `.md` 后作为文章 id。
pub fn file_id(filename: &str) -> &str {
    filename.strip_suffix(MARKDOWN_EXT).unwrap_or(filename)
}

/// 正文前 150 个字符加上 `...`。
pub fn excerpt(content: &str) -> String {
    let mut excerpt: String = content.chars().take(EXCERPT_CHARS).collect();
    excerpt.push_str(ELLIPSIS);
    excerpt
}

/// 以 RFC 3339 格式（毫秒精度，`Z` 结尾）输出时间戳。
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 解析 front matter 中的时间。
///
/// 依次尝试 RFC 3339、不带时区的日期时间（按 UTC）以及纯日期。
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

fn synthetic_post(content: String, filename: &str, now: DateTime<Utc>) -> Post {
    let id = file_id(filename);

    Post {
        id: id.to_string(),
        title: id.replace(['-', '_'], " "),
        author: UNKNOWN_AUTHOR.to_string(),
        excerpt: excerpt(&content),
        created_at: now,
        updated_at: now,
        slug: id.to_string(),
        tags: Vec::new(),
        content,
    }
}

fn normalize_newlines(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n")
}

/// 去掉值开头和结尾各一个引号（`"` 或 `'`）。
fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix(['"', '\'']).unwrap_or(value);
    value.strip_suffix(['"', '\'']).unwrap_or(value)
}

/// 将所有空白序列压缩为单个空格。
fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
