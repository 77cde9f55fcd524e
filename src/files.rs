//! 파일 시스템 유틸리티 모듈
//!
//! 입력 파일 탐색과 출력 폴더 준비를 담당합니다.

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{ConvertError, Result};
use crate::pattern::PatternMatcher;

/// 폴더를 재귀 탐색하여 패턴과 일치하는 일반 파일 목록을 반환
///
/// 결과는 파일 이름 순으로 정렬된 탐색 순서를 따릅니다.
/// 탐색 중 하나라도 읽을 수 없는 항목이 있으면 에러입니다.
pub fn walk_dir(root: &Path, matcher: &PatternMatcher) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(ConvertError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| ConvertError::SourceWalk {
            path: e.path().unwrap_or(root).to_path_buf(),
            reason: e.to_string(),
        })?;

        if entry.file_type().is_file() && matcher.matches_path(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// 폴더가 없으면 생성
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| ConvertError::DestinationError {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })
}

/// 폴더 안의 모든 파일과 하위 폴더 삭제 (폴더 자체는 유지)
pub fn clean_dir(dir: &Path) -> Result<()> {
    let destination_error = |e: std::io::Error| ConvertError::DestinationError {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    };

    for entry in fs::read_dir(dir).map_err(destination_error)? {
        let path = entry.map_err(destination_error)?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path).map_err(destination_error)?;
        } else {
            fs::remove_file(&path).map_err(destination_error)?;
        }
    }

    Ok(())
}
