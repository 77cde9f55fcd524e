//! 워커 모듈
//!
//! 워커 하나는 할당받은 파일 묶음을 처리하며 세 개의 작업을 동시에 실행합니다.
//!
//! - 생산자: 파일마다 레코드를 읽어 문서/에러 채널로 전송 (워커 스레드 자신)
//! - 문서 소비자: 문서 채널 → `converted-<N>.json`
//! - 에러 소비자: 에러 채널 → `errors-<N>.json`
//!
//! 생산자는 모든 파일을 처리한 뒤 송신자를 버려 두 채널을 닫습니다.
//! 채널 용량이 0이면 느린 싱크가 디코딩 속도를 제한합니다.

use crossbeam_channel::{bounded, Sender};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

use crate::config::ConvertConfig;
use crate::error::{ConvertError, Result};
use crate::reader::{read_backup_file, Converted, ReadError};
use crate::sink::{self, documents_path, errors_path, LineSink, SinkSummary};
use crate::stats::Statistics;
use crate::translate::JsonDocument;

/// 워커들이 공유하는 실행 컨텍스트
#[derive(Clone)]
pub struct RunContext {
    pub config: Arc<ConvertConfig>,
    pub stats: Arc<Statistics>,
    /// 치명적 에러 발생 시 모든 생산자를 멈추는 플래그
    pub abort: Arc<AtomicBool>,
    /// 파일 단위 진행률
    pub progress: ProgressBar,
}

impl RunContext {
    pub fn new(config: ConvertConfig, total_files: usize) -> Self {
        Self {
            config: Arc::new(config),
            stats: Arc::new(Statistics::new(total_files)),
            abort: Arc::new(AtomicBool::new(false)),
            progress: ProgressBar::hidden(),
        }
    }

    /// 진행률 바 설정
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    fn aborted(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }
}

/// 워커 실행 결과
#[derive(Debug, Clone)]
pub struct WorkerSummary {
    pub id: usize,
    pub files: usize,
    pub documents: SinkSummary,
    pub errors: SinkSummary,
}

/// 파일 묶음 하나를 담당하는 워커
pub struct Worker {
    id: usize,
    files: Vec<PathBuf>,
    dest_dir: PathBuf,
    ctx: RunContext,
}

impl Worker {
    pub fn new(id: usize, files: Vec<PathBuf>, dest_dir: &Path, ctx: RunContext) -> Self {
        Self {
            id,
            files,
            dest_dir: dest_dir.to_path_buf(),
            ctx,
        }
    }

    /// 생산이 끝나고 두 싱크가 채널을 모두 비울 때까지 블록
    pub fn run(&self) -> Result<WorkerSummary> {
        info!(worker = self.id, files = self.files.len(), "워커 시작");

        let config = &self.ctx.config;
        let documents_sink = LineSink::create(
            documents_path(&self.dest_dir, self.id),
            config.trim_null_bytes,
        )?;
        let errors_sink = LineSink::create(errors_path(&self.dest_dir, self.id), false)?;

        let (document_tx, document_rx) = bounded::<JsonDocument>(config.channel_capacity);
        let (error_tx, error_rx) = bounded::<ReadError>(config.channel_capacity);

        thread::scope(|scope| -> Result<WorkerSummary> {
            let abort = &self.ctx.abort;
            let spawn_failed = |e: std::io::Error| ConvertError::ThreadPoolError {
                reason: e.to_string(),
            };

            let documents = thread::Builder::new()
                .name(format!("worker-{}-json", self.id))
                .spawn_scoped(scope, move || {
                    sink::drain(document_rx, documents_sink)
                        .inspect_err(|_| abort.store(true, Ordering::SeqCst))
                })
                .map_err(spawn_failed)?;

            let errors = thread::Builder::new()
                .name(format!("worker-{}-errors", self.id))
                .spawn_scoped(scope, move || {
                    sink::drain(error_rx, errors_sink)
                        .inspect_err(|_| abort.store(true, Ordering::SeqCst))
                })
                .map_err(spawn_failed)?;

            self.produce(document_tx, error_tx);

            let documents = documents
                .join()
                .map_err(|_| ConvertError::WorkerPanicked { id: self.id })??;
            let errors = errors
                .join()
                .map_err(|_| ConvertError::WorkerPanicked { id: self.id })??;

            self.ctx.stats.record_documents(&documents);
            self.ctx.stats.record_errors(&errors);

            info!(
                worker = self.id,
                documents = documents.lines,
                errors = errors.lines,
                output = %documents.path.display(),
                "워커 완료"
            );

            Ok(WorkerSummary {
                id: self.id,
                files: self.files.len(),
                documents,
                errors,
            })
        })
    }

    /// 할당된 파일을 순서대로 처리
    ///
    /// 송신자를 소유하므로 반환과 동시에 두 채널이 닫힙니다.
    fn produce(&self, documents: Sender<JsonDocument>, errors: Sender<ReadError>) {
        let options = &self.ctx.config.read;

        for path in &self.files {
            if self.ctx.aborted() {
                debug!(worker = self.id, "중단 플래그 감지, 생산 중지");
                break;
            }

            let result = read_backup_file(path, options, |converted| {
                if self.ctx.aborted() {
                    return false;
                }
                match converted {
                    Converted::Document(document) => documents.send(document).is_ok(),
                    Converted::Error(error) => errors.send(error).is_ok(),
                }
            });
            self.ctx.progress.inc(1);

            match result {
                Ok(summary) => {
                    let total = self.ctx.stats.record_file(&summary);
                    debug!(
                        worker = self.id,
                        file = %path.display(),
                        records = summary.records,
                        total_records = total,
                        "파일 처리 완료"
                    );
                    if summary.stopped {
                        break;
                    }
                }
                Err(e) => {
                    self.ctx.stats.increment_file_failed();
                    warn!(
                        worker = self.id,
                        file = %path.display(),
                        error = %e,
                        "파일을 읽을 수 없어 건너뜁니다"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::JournalWriter;
    use std::fs;
    use tempfile::TempDir;

    fn write_journal(path: &Path, records: &[&[u8]]) {
        let mut writer = JournalWriter::new(Vec::new());
        for record in records {
            writer.append(record).unwrap();
        }
        fs::write(path, writer.into_inner()).unwrap();
    }

    #[test]
    fn test_worker_writes_both_files_and_skips_missing_input() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        let first = src.path().join("output-0");
        write_journal(&first, &[b"\xff", b"\xff"]);
        let missing = src.path().join("output-missing");

        let ctx = RunContext::new(ConvertConfig::new(), 2);
        let worker = Worker::new(5, vec![missing, first], dest.path(), ctx.clone());
        let summary = worker.run().unwrap();

        assert_eq!(summary.id, 5);
        assert_eq!(summary.documents.lines, 0);
        assert_eq!(summary.errors.lines, 2);
        assert!(dest.path().join("converted-5.json").exists());
        assert!(dest.path().join("errors-5.json").exists());
        assert_eq!(ctx.stats.get_files_failed(), 1);
        assert_eq!(ctx.stats.get_records_read(), 2);
    }

    #[test]
    fn test_worker_fails_when_output_cannot_be_created() {
        let src = TempDir::new().unwrap();
        let dest = src.path().join("does-not-exist");

        let worker = Worker::new(0, vec![], &dest, RunContext::new(ConvertConfig::new(), 0));
        assert!(matches!(worker.run(), Err(ConvertError::OutputCreate { .. })));
    }

    #[test]
    fn test_aborted_context_produces_nothing() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let file = src.path().join("output-0");
        write_journal(&file, &[b"\xff"]);

        let ctx = RunContext::new(ConvertConfig::new(), 1);
        ctx.abort.store(true, Ordering::SeqCst);

        let summary = Worker::new(0, vec![file], dest.path(), ctx).run().unwrap();
        assert_eq!(summary.errors.lines, 0);
    }

    #[test]
    fn test_early_return_from_scope_closes_sink_channel() {
        let dest = TempDir::new().unwrap();
        let sink = LineSink::create(documents_path(dest.path(), 0), true).unwrap();
        let (tx, rx) = bounded::<JsonDocument>(0);

        // 싱크 스레드 시작 후 송신자를 쓰기 전에 에러로 빠져나가는 경로
        let result = thread::scope(|scope| -> Result<()> {
            scope.spawn(move || sink::drain(rx, sink));
            let second_spawn_failed = true;
            if second_spawn_failed {
                return Err(ConvertError::ThreadPoolError {
                    reason: "spawn failed".to_string(),
                });
            }
            drop(tx);
            Ok(())
        });

        assert!(matches!(result, Err(ConvertError::ThreadPoolError { .. })));
    }
}
