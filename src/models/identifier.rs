//! RUC 标识符
//!
//! 构造时完成校验，之后不可变

use std::fmt;

use serde::Serialize;

use crate::error::ValidationError;

/// RUC 长度
pub const RUC_LEN: usize = 11;

/// 经过校验的 11 位 RUC
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Ruc(String);

impl Ruc {
    /// 校验并创建 RUC
    ///
    /// 输入按原样校验：必须全部是 ASCII 数字且正好 11 位，空白也算非法字符
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let len = raw.chars().count();
        if len != RUC_LEN {
            return Err(ValidationError::WrongLength { len });
        }
        if !raw.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::NonNumeric {
                value: raw.to_string(),
            });
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ruc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ruc {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_eleven_digits() {
        let ruc = Ruc::parse("20100070970").unwrap();
        assert_eq!(ruc.as_str(), "20100070970");
        assert_eq!(ruc.to_string(), "20100070970");
    }

    #[test]
    fn rejects_surrounding_whitespace() {
        assert_eq!(
            Ruc::parse(" 20100070970 "),
            Err(ValidationError::WrongLength { len: 13 })
        );
        assert!(matches!(
            Ruc::parse("2010007097 "),
            Err(ValidationError::NonNumeric { .. })
        ));
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            Ruc::parse("2010007097"),
            Err(ValidationError::WrongLength { len: 10 })
        );
        assert_eq!(
            Ruc::parse("201000709701"),
            Err(ValidationError::WrongLength { len: 12 })
        );
        assert_eq!(Ruc::parse(""), Err(ValidationError::WrongLength { len: 0 }));
    }

    #[test]
    fn rejects_non_numeric() {
        assert!(matches!(
            Ruc::parse("2010007097A"),
            Err(ValidationError::NonNumeric { .. })
        ));
        // 全角数字不是 ASCII 数字
        assert!(Ruc::parse("２０１０００７０９７０").is_err());
    }
}
