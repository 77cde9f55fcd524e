//! 패턴 매칭 모듈
//!
//! 백업 파일 이름(basename)을 glob 패턴으로 걸러냅니다.

use glob::Pattern;
use std::path::Path;

use crate::error::{ConvertError, Result};

/// 데이터스토어 백업의 데이터 파일 이름 패턴 (`output-0`, `output-1`, ...)
pub const DEFAULT_PATTERN: &str = "output*";

/// 컴파일된 패턴 매처
pub struct PatternMatcher {
    pattern: Pattern,
}

impl PatternMatcher {
    /// 새 패턴 매처 생성
    ///
    /// # Examples
    /// ```
    /// use dsconvert::pattern::PatternMatcher;
    ///
    /// let matcher = PatternMatcher::new("output*").unwrap();
    /// assert!(matcher.matches("output-12"));
    /// assert!(!matcher.matches("overall_output"));
    /// ```
    pub fn new(pattern: &str) -> Result<Self> {
        let compiled = Pattern::new(pattern).map_err(|_| ConvertError::InvalidPattern {
            pattern: pattern.to_string(),
        })?;

        Ok(Self { pattern: compiled })
    }

    /// 파일 이름이 패턴과 일치하는지 확인
    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.matches(file_name)
    }

    /// 경로의 마지막 구성 요소가 패턴과 일치하는지 확인
    pub fn matches_path(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|s| s.to_str())
            .map(|s| self.matches(s))
            .unwrap_or(false)
    }
}
