//! 디스패처 모듈
//!
//! 전체 파일 목록을 위치 기준으로 나누어 워커 풀에 분배하고 모두 끝날 때까지 기다립니다.

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{ConvertError, Result};
use crate::worker::{RunContext, Worker, WorkerSummary};

/// 목록을 최대 `max`개의 연속 묶음으로 나눔
///
/// 묶음 크기는 올림 나눗셈으로 정하므로 마지막 묶음만 작을 수 있습니다.
///
/// # Examples
/// ```
/// use dsconvert::dispatcher::chunk;
///
/// let files: Vec<u32> = (0..10).collect();
/// let sizes: Vec<usize> = chunk(&files, 3).iter().map(Vec::len).collect();
/// assert_eq!(sizes, vec![4, 4, 2]);
/// ```
pub fn chunk<T: Clone>(items: &[T], max: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }

    let size = items.len().div_ceil(max.max(1));
    items.chunks(size).map(<[T]>::to_vec).collect()
}

/// 파일 목록을 워커들에게 분배하여 실행
///
/// 워커 번호는 묶음 순서와 같습니다. 첫 번째 치명적 에러를 반환합니다.
pub fn dispatch(files: Vec<PathBuf>, dest_dir: &Path, ctx: &RunContext) -> Result<Vec<WorkerSummary>> {
    let batches = chunk(&files, ctx.config.worker_count());
    if batches.is_empty() {
        info!("처리할 파일이 없습니다");
        return Ok(Vec::new());
    }

    info!(workers = batches.len(), files = files.len(), "워커 시작");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(batches.len())
        .thread_name(|i| format!("worker-{}", i))
        .build()
        .map_err(|e| ConvertError::ThreadPoolError {
            reason: e.to_string(),
        })?;

    let results: Vec<Result<WorkerSummary>> = pool.install(|| {
        batches
            .into_par_iter()
            .enumerate()
            .map(|(id, batch)| Worker::new(id, batch, dest_dir, ctx.clone()).run())
            .collect()
    });

    let summaries = results.into_iter().collect::<Result<Vec<_>>>()?;

    info!(
        records = ctx.stats.get_records_read(),
        "백업 파일에서 읽은 전체 레코드 수"
    );

    Ok(summaries)
}
