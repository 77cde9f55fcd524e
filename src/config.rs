//! 실행 설정 모듈
//!
//! 워커 수, NUL 바이트 제거, 채널 용량 등 변환 정책을 담습니다.

use std::num::NonZeroUsize;

use crate::pattern::DEFAULT_PATTERN;
use crate::reader::ReadOptions;

/// 변환 실행 설정
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// 명시적 워커 수 (None이면 CPU 코어 수 기준)
    pub workers: Option<usize>,
    /// 디스패처 몫으로 코어 하나를 남길지 여부
    pub reserve_dispatcher_core: bool,
    /// 직렬화된 문서 앞뒤의 NUL 바이트 제거 여부
    pub trim_null_bytes: bool,
    /// 워커 내부 채널 용량 (0이면 랑데부 채널)
    pub channel_capacity: usize,
    /// 입력 파일 이름 글로브 패턴
    pub pattern: String,
    /// 파일 읽기 옵션
    pub read: ReadOptions,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            workers: None,
            reserve_dispatcher_core: false,
            trim_null_bytes: true,
            channel_capacity: 0,
            pattern: DEFAULT_PATTERN.to_string(),
            read: ReadOptions::default(),
        }
    }
}

impl ConvertConfig {
    /// 기본 설정 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 워커 수 설정
    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    /// 디스패처 코어 예약 설정
    pub fn with_reserve_dispatcher_core(mut self, reserve: bool) -> Self {
        self.reserve_dispatcher_core = reserve;
        self
    }

    /// NUL 바이트 제거 설정
    pub fn with_trim_null_bytes(mut self, trim: bool) -> Self {
        self.trim_null_bytes = trim;
        self
    }

    /// 채널 용량 설정
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// 파일 패턴 설정
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// 읽기 옵션 설정
    pub fn with_read_options(mut self, read: ReadOptions) -> Self {
        self.read = read;
        self
    }

    /// 실제로 사용할 워커 수
    pub fn worker_count(&self) -> usize {
        let available = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        resolve_worker_count(self.workers, available, self.reserve_dispatcher_core)
    }
}

/// 워커 수 결정 (항상 1 이상)
pub fn resolve_worker_count(explicit: Option<usize>, available: usize, reserve_core: bool) -> usize {
    let count = match explicit {
        Some(n) => n,
        None if reserve_core => available.saturating_sub(1),
        None => available,
    };
    count.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_worker_count() {
        assert_eq!(resolve_worker_count(None, 8, false), 8);
        assert_eq!(resolve_worker_count(None, 8, true), 7);
        assert_eq!(resolve_worker_count(None, 1, true), 1);
        assert_eq!(resolve_worker_count(Some(3), 8, true), 3);
        assert_eq!(resolve_worker_count(Some(0), 8, false), 1);
    }

    #[test]
    fn test_config_builder() {
        let config = ConvertConfig::new()
            .with_workers(Some(2))
            .with_trim_null_bytes(false)
            .with_channel_capacity(16)
            .with_pattern("backup-*");

        assert_eq!(config.worker_count(), 2);
        assert!(!config.trim_null_bytes);
        assert_eq!(config.channel_capacity, 16);
        assert_eq!(config.pattern, "backup-*");
    }

    #[test]
    fn test_defaults() {
        let config = ConvertConfig::default();
        assert!(config.trim_null_bytes);
        assert_eq!(config.channel_capacity, 0);
        assert_eq!(config.pattern, "output*");
        assert!(config.worker_count() >= 1);
    }
}
