/// 从标题生成 URL 安全的 slug。
///
/// 规则：
/// - 转为小写
/// - 只保留 ASCII 小写字母、数字、空白和 `-`
/// - 连续空白替换为单个 `-`
/// - 连续的 `-` 合并为一个
/// - 去掉首尾的 `-`
///
/// 结果只包含 `[a-z0-9-]`，对同一输入总是给出相同结果，且重复调用不变：
/// `slugify(&slugify(x)) == slugify(x)`。
/// 标题中没有任何 ASCII 字母或数字时返回空字符串。
///
/// ```
/// use gitpost::content::slugify;
///
/// assert_eq!(slugify("Q&A: Session 1"), "qa-session-1");
/// assert_eq!(slugify("  Sunday   Service -- Notes "), "sunday-service-notes");
/// assert_eq!(slugify("主日崇拜"), "");
/// ```
pub fn slugify(title: impl AsRef<str>) -> String {
    let mut slug = String::with_capacity(title.as_ref().len());

    for c in title.as_ref().chars().flat_map(char::to_lowercase) {
        let c = match c {
            'a'..='z' | '0'..='9' => c,
            '-' => '-',
            c if c.is_whitespace() => '-',
            _ => continue,
        };

        if c == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(c);
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}
