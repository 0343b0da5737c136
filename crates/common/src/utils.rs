//! 通用工具函数

/// 规范化邮箱地址（去空白、转小写）
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 截断字符串到指定字符数（按字符而非字节）
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Foo@Example.COM "), "foo@example.com");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("thợ sửa ống", 5), "thợ s");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
