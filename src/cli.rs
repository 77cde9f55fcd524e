//! CLI 인자 파싱 모듈
//!
//! clap을 사용한 명령줄 인자 정의 및 파싱을 담당합니다.

use clap::Parser;
use std::path::PathBuf;

use crate::config::ConvertConfig;
use crate::pattern::DEFAULT_PATTERN;
use crate::reader::ReadOptions;

/// dsconvert CLI 인자 구조체
#[derive(Parser, Debug)]
#[command(
    name = "dsconvert",
    author = "YourName <your@email.com>",
    version,
    about = "DATASTORE BACKUP TO JSONL CONVERTER - 데이터스토어 백업 파일을 JSONL로 변환하는 병렬 CLI 도구",
    long_about = r#"
DATASTORE BACKUP TO JSONL CONVERTER
===================================

입력 폴더에서 데이터스토어 백업 파일(output-*)을 찾아
엔티티 하나당 JSON 한 줄로 변환합니다.

워커마다 두 개의 파일을 출력 폴더에 만듭니다:
  • converted-<N>.json  변환된 엔티티 (JSON Lines)
  • errors-<N>.json     읽기/파싱에 실패한 레코드 (JSON Lines)

출력 폴더의 기존 내용은 실행 전에 모두 삭제됩니다.

예제:
  dsconvert ./backup ./out
  dsconvert ./backup ./out --workers 4
  dsconvert ./backup ./out --reserve-core --verbose
"#
)]
pub struct Args {
    /// 백업 파일이 있는 입력 폴더 경로
    pub source: PathBuf,

    /// 변환 결과를 쓸 출력 폴더 경로
    pub dest: PathBuf,

    /// 워커 수 (기본값: CPU 코어 수)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// 디스패처 몫으로 코어 하나를 남김
    #[arg(long)]
    pub reserve_core: bool,

    /// 직렬화된 문서의 앞뒤 NUL 바이트를 제거하지 않음
    #[arg(long)]
    pub keep_null_bytes: bool,

    /// 입력 파일 이름 패턴 (glob 형식)
    #[arg(short, long, default_value = DEFAULT_PATTERN)]
    pub pattern: String,

    /// 워커 내부 채널 용량 (0이면 생산자와 소비자가 직접 주고받음)
    #[arg(long, default_value_t = 0)]
    pub channel_capacity: usize,

    /// 손상된 저널 블록을 건너뛰고 계속 읽음
    #[arg(long)]
    pub skip_corrupt_blocks: bool,

    /// 저널 청크 체크섬 검증 생략
    #[arg(long)]
    pub no_checksum: bool,

    /// 상세 로그 출력
    #[arg(short, long)]
    pub verbose: bool,

    /// 경고 이상 로그만 출력하고 진행률/요약 생략
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// 인자를 실행 설정으로 변환
    pub fn to_config(&self) -> ConvertConfig {
        let read = ReadOptions::new()
            .with_verify_checksums(!self.no_checksum)
            .with_skip_corrupt_blocks(self.skip_corrupt_blocks);

        ConvertConfig::new()
            .with_workers(self.workers)
            .with_reserve_dispatcher_core(self.reserve_core)
            .with_trim_null_bytes(!self.keep_null_bytes)
            .with_channel_capacity(self.channel_capacity)
            .with_pattern(self.pattern.clone())
            .with_read_options(read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_arguments_only() {
        let args = Args::try_parse_from(["dsconvert", "/backup", "/out"]).unwrap();
        assert_eq!(args.source, PathBuf::from("/backup"));
        assert_eq!(args.dest, PathBuf::from("/out"));

        let config = args.to_config();
        assert!(config.workers.is_none());
        assert!(config.trim_null_bytes);
        assert_eq!(config.pattern, DEFAULT_PATTERN);
        assert!(config.read.framer.verify_checksums);
    }

    #[test]
    fn test_flags_map_to_config() {
        let args = Args::try_parse_from([
            "dsconvert",
            "src",
            "dst",
            "-j",
            "3",
            "--reserve-core",
            "--keep-null-bytes",
            "--skip-corrupt-blocks",
            "--no-checksum",
        ])
        .unwrap();

        let config = args.to_config();
        assert_eq!(config.workers, Some(3));
        assert!(config.reserve_dispatcher_core);
        assert!(!config.trim_null_bytes);
        assert!(config.read.framer.skip_corrupt_blocks);
        assert!(!config.read.framer.verify_checksums);
    }

    #[test]
    fn test_missing_destination_is_rejected() {
        assert!(Args::try_parse_from(["dsconvert", "/backup"]).is_err());
    }
}
