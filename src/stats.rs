//! 통계 및 유틸리티 모듈
//!
//! 워커들이 공유하는 실행 통계 수집과 요약 출력을 담당합니다.

use colored::Colorize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::reader::FileSummary;
use crate::sink::SinkSummary;

/// 실행 통계 구조체
#[derive(Debug, Default)]
pub struct Statistics {
    /// 총 입력 파일 수
    pub total_files: usize,
    /// 처리 완료 파일 수
    pub files_completed: AtomicUsize,
    /// 열 수 없어 건너뛴 파일 수
    pub files_failed: AtomicUsize,
    /// 읽은 레코드 수 (전체 워커 합계)
    pub records_read: AtomicU64,
    /// 기록된 JSON 문서 수
    pub documents_written: AtomicU64,
    /// 기록된 에러 수
    pub errors_written: AtomicU64,
    /// 읽은 총 바이트
    pub total_bytes_read: AtomicU64,
    /// 쓴 총 바이트
    pub total_bytes_written: AtomicU64,
    /// 처리 시작 시간
    start_time: Option<Instant>,
}

impl Statistics {
    /// 새 통계 인스턴스 생성
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// 파일 하나의 처리 결과 반영
    ///
    /// 지금까지 읽은 전체 레코드 수를 반환합니다.
    pub fn record_file(&self, summary: &FileSummary) -> u64 {
        self.files_completed.fetch_add(1, Ordering::Relaxed);
        self.total_bytes_read
            .fetch_add(summary.bytes, Ordering::Relaxed);
        self.records_read
            .fetch_add(summary.records as u64, Ordering::Relaxed)
            + summary.records as u64
    }

    /// 건너뛴 파일 카운트 증가
    pub fn increment_file_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// 문서 싱크 기록 결과 반영
    pub fn record_documents(&self, summary: &SinkSummary) {
        self.documents_written
            .fetch_add(summary.lines as u64, Ordering::Relaxed);
        self.total_bytes_written
            .fetch_add(summary.bytes, Ordering::Relaxed);
    }

    /// 에러 싱크 기록 결과 반영
    pub fn record_errors(&self, summary: &SinkSummary) {
        self.errors_written
            .fetch_add(summary.lines as u64, Ordering::Relaxed);
        self.total_bytes_written
            .fetch_add(summary.bytes, Ordering::Relaxed);
    }

    /// 읽은 레코드 수 반환
    pub fn get_records_read(&self) -> u64 {
        self.records_read.load(Ordering::Relaxed)
    }

    /// 기록된 문서 수 반환
    pub fn get_documents_written(&self) -> u64 {
        self.documents_written.load(Ordering::Relaxed)
    }

    /// 기록된 에러 수 반환
    pub fn get_errors_written(&self) -> u64 {
        self.errors_written.load(Ordering::Relaxed)
    }

    /// 건너뛴 파일 수 반환
    pub fn get_files_failed(&self) -> usize {
        self.files_failed.load(Ordering::Relaxed)
    }

    /// 경과 시간 반환
    pub fn elapsed(&self) -> Duration {
        self.start_time
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    /// 변환 통계 요약 출력
    pub fn print_summary(&self) {
        let completed = self.files_completed.load(Ordering::Relaxed);
        let failed = self.get_files_failed();
        let errors = self.get_errors_written();
        let bytes_read = self.total_bytes_read.load(Ordering::Relaxed);
        let bytes_written = self.total_bytes_written.load(Ordering::Relaxed);

        println!("\n{}", "═".repeat(50).bright_blue());
        println!("{}", " 📊 변환 통계".bright_white().bold());
        println!("{}", "═".repeat(50).bright_blue());

        println!(
            "  {} 전체 파일:    {} (완료 {}, 건너뜀 {})",
            "📁".bright_cyan(),
            self.total_files,
            completed.to_string().green(),
            if failed > 0 {
                failed.to_string().red()
            } else {
                "0".green()
            }
        );
        println!(
            "  {} 레코드:       {}",
            "🧾".bright_white(),
            self.get_records_read()
        );
        println!(
            "  {} 문서:         {}",
            "✅".bright_green(),
            self.get_documents_written().to_string().green()
        );

        if errors > 0 {
            println!(
                "  {} 에러:         {}",
                "❌".bright_red(),
                errors.to_string().red()
            );
        } else {
            println!("  {} 에러:         {}", "✅".bright_green(), "0".green());
        }

        println!(
            "  {} 입력 용량:    {}",
            "📥".bright_yellow(),
            format_bytes(bytes_read)
        );
        println!(
            "  {} 출력 용량:    {}",
            "📤".bright_magenta(),
            format_bytes(bytes_written)
        );
        println!(
            "  {} 처리 시간:    {}",
            "⏱️".bright_cyan(),
            format_duration(self.elapsed())
        );

        println!("{}", "═".repeat(50).bright_blue());
    }
}

/// 바이트를 읽기 쉬운 형식으로 변환
///
/// # Examples
/// ```
/// use dsconvert::stats::format_bytes;
///
/// assert_eq!(format_bytes(500), "500 B");
/// assert_eq!(format_bytes(1024), "1.00 KB");
/// assert_eq!(format_bytes(1048576), "1.00 MB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// 경과 시간을 읽기 쉬운 형식으로 변환
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs >= 3600 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}시간 {}분", hours, mins)
    } else if secs >= 60 {
        let mins = secs / 60;
        let remaining_secs = secs % 60;
        format!("{}분 {}초", mins, remaining_secs)
    } else if secs > 0 {
        format!("{}.{:03}초", secs, millis)
    } else {
        format!("{}ms", millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1073741824), "1.00 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(65)), "1분 5초");
        assert_eq!(format_duration(Duration::from_secs(3665)), "1시간 1분");
    }

    #[test]
    fn test_record_file_returns_running_total() {
        let stats = Statistics::new(3);
        let file = FileSummary {
            records: 4,
            bytes: 100,
            ..Default::default()
        };

        assert_eq!(stats.record_file(&file), 4);
        assert_eq!(stats.record_file(&file), 8);
        stats.increment_file_failed();

        assert_eq!(stats.get_records_read(), 8);
        assert_eq!(stats.get_files_failed(), 1);
        assert_eq!(stats.total_bytes_read.load(Ordering::Relaxed), 200);
    }

    #[test]
    fn test_sink_summaries_accumulate() {
        let stats = Statistics::new(1);
        let sink = SinkSummary {
            path: PathBuf::from("converted-0.json"),
            lines: 2,
            bytes: 30,
        };

        stats.record_documents(&sink);
        stats.record_errors(&SinkSummary { lines: 1, bytes: 10, ..sink.clone() });

        assert_eq!(stats.get_documents_written(), 2);
        assert_eq!(stats.get_errors_written(), 1);
        assert_eq!(stats.total_bytes_written.load(Ordering::Relaxed), 40);
    }
}
