//! 에러 타입 정의 모듈
//!
//! 실행 전체를 중단시키는 치명적 에러만 이곳에 정의합니다.
//! 레코드 단위로 복구 가능한 실패는 [`crate::reader::ReadError`]로 에러 채널에 기록됩니다.

use std::path::PathBuf;
use thiserror::Error;

/// dsconvert에서 발생할 수 있는 치명적 에러 타입
#[derive(Error, Debug)]
pub enum ConvertError {
    /// 입력 폴더 탐색 실패
    #[error("입력 폴더를 읽을 수 없습니다 ({path}): {reason}")]
    SourceWalk { path: PathBuf, reason: String },

    /// 입력이 폴더가 아님
    #[error("입력 경로가 폴더가 아닙니다: {path}")]
    NotADirectory { path: PathBuf },

    /// 출력 폴더 생성/정리 실패
    #[error("출력 폴더를 준비할 수 없습니다 ({path}): {reason}")]
    DestinationError { path: PathBuf, reason: String },

    /// 출력 파일 생성 실패
    #[error("출력 파일을 만들 수 없습니다 ({file}): {reason}")]
    OutputCreate { file: PathBuf, reason: String },

    /// JSON 직렬화 실패
    #[error("JSON 직렬화 실패 ({file}): {reason}")]
    SerializeError { file: PathBuf, reason: String },

    /// 파일 쓰기 실패
    #[error("파일 쓰기 실패 ({file}): {reason}")]
    WriteError { file: PathBuf, reason: String },

    /// 스레드 풀 초기화 실패
    #[error("스레드 풀 초기화 실패: {reason}")]
    ThreadPoolError { reason: String },

    /// 유효하지 않은 패턴
    #[error("유효하지 않은 패턴: {pattern}")]
    InvalidPattern { pattern: String },

    /// 워커 스레드 패닉
    #[error("워커 #{id} 스레드가 비정상 종료되었습니다")]
    WorkerPanicked { id: usize },
}

/// dsconvert 결과 타입 별칭
pub type Result<T> = std::result::Result<T, ConvertError>;
