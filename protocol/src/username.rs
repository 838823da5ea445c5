//! 用户名

use std::fmt;

use thiserror::Error;

use crate::MAX_USERNAME_LEN;

/// 用户名校验错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsernameError {
    #[error("username must be between 1 and {max} characters")]
    Empty { max: usize },

    #[error("username must be between 1 and {max} characters, got {len}")]
    TooLong { len: usize, max: usize },

    #[error("username can only contain letters")]
    NotAlphabetic,
}

/// 已校验的用户名：1 到 N 个 ASCII 字母，创建后不可变
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// 按默认长度上限校验
    pub fn new(name: impl Into<String>) -> Result<Self, UsernameError> {
        Self::with_max_len(name, MAX_USERNAME_LEN)
    }

    /// 按给定长度上限校验，超长时拒绝而不是截断
    pub fn with_max_len(name: impl Into<String>, max: usize) -> Result<Self, UsernameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(UsernameError::Empty { max });
        }
        if !name.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(UsernameError::NotAlphabetic);
        }
        // 全部为 ASCII，字符数与字节数一致
        if name.len() > max {
            return Err(UsernameError::TooLong {
                len: name.len(),
                max,
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// 字节长度
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 恒为 false，校验保证非空
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_ten_letters() {
        let name = Username::new("abcdefghij").unwrap();
        assert_eq!(name.len(), 10);
        assert_eq!(name.as_str(), "abcdefghij");
    }

    #[test]
    fn test_rejects_eleven_letters() {
        assert_eq!(
            Username::new("abcdefghijk"),
            Err(UsernameError::TooLong { len: 11, max: 10 })
        );
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(Username::new(""), Err(UsernameError::Empty { max: 10 }));
    }

    #[test]
    fn test_rejects_non_letters() {
        for bad in ["alice1", "bob smith", "eve_", "zoë", "a-b"] {
            assert_eq!(Username::new(bad), Err(UsernameError::NotAlphabetic), "{bad}");
        }
    }

    #[test]
    fn test_mixed_case_is_kept() {
        let name = Username::new("AliCe").unwrap();
        assert_eq!(name.to_string(), "AliCe");
    }

    #[test]
    fn test_custom_max_len() {
        assert!(Username::with_max_len("abcd", 3).is_err());
        assert!(Username::with_max_len("abc", 3).is_ok());
    }
}
