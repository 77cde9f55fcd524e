//! 출력 싱크 모듈
//!
//! 채널로 받은 문서와 에러를 워커별 파일에 한 줄씩 기록합니다.
//! serde_json은 `<`, `>`, `&`를 이스케이프하지 않으므로 HTML 이스케이프 없는 출력이 됩니다.

use crossbeam_channel::Receiver;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};

/// 워커별 JSON 문서 출력 파일 경로
pub fn documents_path(dest_dir: &Path, worker: usize) -> PathBuf {
    dest_dir.join(format!("converted-{}.json", worker))
}

/// 워커별 에러 출력 파일 경로
pub fn errors_path(dest_dir: &Path, worker: usize) -> PathBuf {
    dest_dir.join(format!("errors-{}.json", worker))
}

/// 앞뒤의 NUL 바이트 제거
pub fn trim_null_bytes(line: &[u8]) -> &[u8] {
    let start = line.iter().position(|&b| b != 0).unwrap_or(line.len());
    let end = line.iter().rposition(|&b| b != 0).map_or(start, |i| i + 1);
    &line[start..end]
}

/// 싱크 기록 요약
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SinkSummary {
    pub path: PathBuf,
    pub lines: usize,
    pub bytes: u64,
}

/// 한 줄에 JSON 값 하나를 기록하는 파일 싱크
pub struct LineSink {
    path: PathBuf,
    writer: BufWriter<File>,
    trim_null_bytes: bool,
    lines: usize,
    bytes: u64,
}

impl LineSink {
    /// 출력 파일을 만들거나 이어 쓰기로 열기
    pub fn create(path: PathBuf, trim_null_bytes: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ConvertError::OutputCreate {
                file: path.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            trim_null_bytes,
            lines: 0,
            bytes: 0,
        })
    }

    /// 값 하나를 직렬화하여 기록
    pub fn write<T: Serialize>(&mut self, item: &T) -> Result<()> {
        let serialized = serde_json::to_vec(item).map_err(|e| ConvertError::SerializeError {
            file: self.path.clone(),
            reason: e.to_string(),
        })?;

        let line = if self.trim_null_bytes {
            trim_null_bytes(&serialized)
        } else {
            &serialized[..]
        };

        self.writer
            .write_all(line)
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(|e| ConvertError::WriteError {
                file: self.path.clone(),
                reason: e.to_string(),
            })?;

        self.lines += 1;
        self.bytes += line.len() as u64 + 1; // +1 for newline
        Ok(())
    }

    /// 버퍼를 비우고 요약 반환
    pub fn finish(mut self) -> Result<SinkSummary> {
        self.writer.flush().map_err(|e| ConvertError::WriteError {
            file: self.path.clone(),
            reason: e.to_string(),
        })?;

        Ok(SinkSummary {
            path: self.path,
            lines: self.lines,
            bytes: self.bytes,
        })
    }
}

/// 채널이 닫힐 때까지 받은 값을 모두 기록
///
/// 직렬화나 쓰기에 실패하면 즉시 반환하며, 이때 수신자가 버려져 생산자의 전송도 실패합니다.
pub fn drain<T: Serialize>(receiver: Receiver<T>, mut sink: LineSink) -> Result<SinkSummary> {
    for item in receiver {
        sink.write(&item)?;
    }
    sink.finish()
}
