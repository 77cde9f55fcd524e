//! 백업 파일 처리 모듈
//!
//! 파일 하나에 대해 레코드 프레이밍 → 엔티티 디코딩 → JSON 변환 파이프라인을 실행합니다.
//! 레코드 단위 실패는 [`ReadError`]로 내보내고 다음 레코드로 넘어갑니다.

use memmap2::Mmap;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::Path;
use thiserror::Error;

use crate::entity;
use crate::journal::{FramerOptions, Record, RecordFramer};
use crate::translate::{translate, JsonDocument};

/// 레코드 하나의 복구 가능한 실패 기록
///
/// `line`은 파일 내 레코드 순번(0부터)입니다.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("File: {file}. Line: #{line} | {message}")]
pub struct ReadError {
    pub message: String,
    pub file: String,
    pub line: usize,
}

impl ReadError {
    pub fn new(message: impl Into<String>, file: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            file: file.into(),
            line,
        }
    }
}

/// 레코드 하나의 변환 결과
#[derive(Debug)]
pub enum Converted {
    Document(JsonDocument),
    Error(ReadError),
}

/// 파일 하나의 처리 요약
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileSummary {
    /// 프레이밍된 레코드 수
    pub records: usize,
    /// 내보낸 문서 수
    pub documents: usize,
    /// 내보낸 에러 수
    pub errors: usize,
    /// 파일 크기
    pub bytes: u64,
    /// 소비자가 중단을 요청했는지 여부
    pub stopped: bool,
}

/// 파일 읽기 옵션
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// 저널 프레이밍 옵션
    pub framer: FramerOptions,
    /// 대용량 파일 임계값 (이상이면 메모리 매핑 사용)
    pub mmap_threshold: u64,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            framer: FramerOptions::default(),
            mmap_threshold: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl ReadOptions {
    /// 기본 옵션 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 체크섬 검증 설정
    pub fn with_verify_checksums(mut self, verify: bool) -> Self {
        self.framer.verify_checksums = verify;
        self
    }

    /// 손상 블록 건너뛰기 설정
    pub fn with_skip_corrupt_blocks(mut self, skip: bool) -> Self {
        self.framer.skip_corrupt_blocks = skip;
        self
    }

    /// 메모리 매핑 임계값 설정
    pub fn with_mmap_threshold(mut self, threshold: u64) -> Self {
        self.mmap_threshold = threshold;
        self
    }
}

/// 레코드 하나를 디코딩하고 변환
pub fn convert_record(record: &Record, file: &str) -> Converted {
    match entity::decode(&record.data) {
        Ok(entity) => Converted::Document(translate(&entity)),
        Err(e) => Converted::Error(ReadError::new(e.to_string(), file, record.index)),
    }
}

/// 백업 파일 열기
///
/// 작은 파일은 버퍼 리더로, 큰 파일은 메모리 매핑으로 읽습니다.
fn open_backup(path: &Path, file_size: u64, mmap_threshold: u64) -> io::Result<Box<dyn Read>> {
    let file = File::open(path)?;

    if file_size >= mmap_threshold && file_size > 0 {
        // 파일이 처리 도중 잘리지 않는다는 전제
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Box::new(Cursor::new(mmap)))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// 백업 파일 하나 처리
///
/// 결과는 레코드 순서대로 `emit`에 전달되며, `emit`이 `false`를 반환하면 중단합니다.
/// 파일을 열 수 없을 때만 에러를 반환합니다.
pub fn read_backup_file<F>(path: &Path, options: &ReadOptions, mut emit: F) -> io::Result<FileSummary>
where
    F: FnMut(Converted) -> bool,
{
    let bytes = std::fs::metadata(path)?.len();
    let reader = open_backup(path, bytes, options.mmap_threshold)?;
    let file = path.to_string_lossy();

    let mut summary = FileSummary {
        bytes,
        ..Default::default()
    };

    for record in RecordFramer::new(reader, options.framer) {
        summary.records += 1;

        let converted = convert_record(&record, &file);
        match converted {
            Converted::Document(_) => summary.documents += 1,
            Converted::Error(_) => summary.errors += 1,
        }

        if !emit(converted) {
            summary.stopped = true;
            break;
        }
    }

    Ok(summary)
}
