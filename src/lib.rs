//! dsconvert - DATASTORE BACKUP TO JSONL CONVERTER
//!
//! 데이터스토어 백업 파일을 엔티티 하나당 JSON 한 줄로 변환하는 병렬 CLI 도구입니다.
//!
//! # 처리 흐름
//!
//! ```text
//! 디스패처 → 워커(N) → 저널 프레이밍 → 엔티티 디코딩 → 값 변환 → 채널 → 출력 싱크
//! ```
//!
//! # 주요 기능
//!
//! - 🚀 **병렬 처리**: 파일 묶음마다 워커 하나, 워커마다 생산자 1 + 싱크 2
//! - 🧩 **조각 재조립**: 32 KiB 블록 경계를 넘는 레코드 복원
//! - 🪆 **재귀 변환**: 중첩 엔티티, 키, 좌표, 시간, 반복 필드 지원
//! - 📝 **에러 격리**: 깨진 레코드는 `errors-<N>.json`에 기록하고 계속 진행
//! - 📈 **상세 통계**: 레코드/문서/에러 수와 입출력 용량 표시
//!
//! # 예제
//!
//! ```bash
//! # 기본 사용법
//! dsconvert ./backup ./out
//!
//! # 워커 수 지정
//! dsconvert ./backup ./out --workers 4
//! ```

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod entity;
pub mod error;
pub mod files;
pub mod journal;
pub mod pattern;
pub mod proto;
pub mod reader;
pub mod sink;
pub mod stats;
pub mod translate;
pub mod worker;

// Re-exports for convenient access
pub use cli::Args;
pub use config::ConvertConfig;
pub use dispatcher::{chunk, dispatch};
pub use entity::{Entity, Key, KeyId, Property, TypedValue};
pub use error::{ConvertError, Result};
pub use pattern::PatternMatcher;
pub use reader::{read_backup_file, ReadError, ReadOptions};
pub use stats::{format_bytes, Statistics};
pub use translate::{translate, JsonDocument};
pub use worker::{RunContext, Worker, WorkerSummary};
