//! dsconvert - DATASTORE BACKUP TO JSONL CONVERTER
//!
//! 메인 엔트리포인트

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

use dsconvert::{
    cli::Args,
    dispatcher::dispatch,
    files::{clean_dir, ensure_dir, walk_dir},
    pattern::PatternMatcher,
    worker::RunContext,
};

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(&args);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("\n{} {:#}", "❌ 치명적 오류:".bright_red(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    // 입력 폴더 확인
    validate_input(args)?;

    let config = args.to_config();
    let worker_count = config.worker_count();

    if !args.quiet {
        print_header(args, worker_count);
    }

    // 출력 폴더 준비
    ensure_dir(&args.dest).context("출력 폴더 생성 실패")?;
    clean_dir(&args.dest).context("출력 폴더 정리 실패")?;

    // 백업 파일 수집
    let matcher = PatternMatcher::new(&config.pattern)?;
    let files = walk_dir(&args.source, &matcher)
        .with_context(|| format!("입력 폴더 탐색 실패: {:?}", args.source))?;

    if files.is_empty() {
        println!("{}", "⚠️ 처리할 백업 파일이 없습니다.".yellow());
        return Ok(());
    }

    if !args.quiet {
        println!(
            "  {} 발견된 파일 수: {}",
            "📋".bright_white(),
            files.len().to_string().bright_green()
        );
        println!("\n{}", "⚡ 병렬 변환 중...".bright_cyan());
    }

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        create_progress_bar(files.len())
    };

    let ctx = RunContext::new(config, files.len()).with_progress(progress.clone());
    let summaries = dispatch(files, &args.dest, &ctx).context("변환 실패")?;

    progress.finish_with_message("완료!");

    if !args.quiet {
        ctx.stats.print_summary();
        println!(
            "\n{} 저장 완료: {:?} (워커 {}개)\n",
            "✅".bright_green(),
            args.dest,
            summaries.len()
        );
    }

    Ok(())
}

/// 입력 경로 유효성 검사
fn validate_input(args: &Args) -> Result<()> {
    if !args.source.exists() {
        anyhow::bail!("입력 폴더가 존재하지 않습니다: {:?}", args.source);
    }

    if !args.source.is_dir() {
        anyhow::bail!("입력 경로가 폴더가 아닙니다: {:?}", args.source);
    }

    Ok(())
}

/// 로깅 초기화 (RUST_LOG가 있으면 우선)
fn setup_logging(args: &Args) {
    let default_filter = if args.verbose {
        "dsconvert=debug,warn"
    } else if args.quiet {
        "warn"
    } else {
        "dsconvert=info,warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// 헤더 출력
fn print_header(args: &Args, worker_count: usize) {
    println!("\n{}", "═".repeat(50).bright_blue());
    println!(
        "{}",
        " 🚀 DATASTORE BACKUP TO JSONL CONVERTER".bright_white().bold()
    );
    println!("{}", "═".repeat(50).bright_blue());
    println!("  {} 입력 폴더: {:?}", "📂".bright_cyan(), args.source);
    println!("  {} 출력 폴더: {:?}", "📄".bright_green(), args.dest);
    println!("  {} 워커 수: {}", "⚙️".bright_yellow(), worker_count);
    println!("  {} 파일 패턴: {}", "🔍".bright_magenta(), args.pattern);

    if args.skip_corrupt_blocks {
        println!(
            "  {} {}",
            "⚠️".bright_yellow(),
            "손상 블록 건너뛰기 모드".yellow()
        );
    }

    if args.no_checksum {
        println!(
            "  {} {}",
            "⚠️".bright_yellow(),
            "체크섬 검증 생략".yellow()
        );
    }

    println!("{}", "═".repeat(50).bright_blue());
    println!("\n{}", "📁 파일 검색 중...".bright_cyan());
}

/// 진행률 바 생성
fn create_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("█▓▒░"));
    }
    pb
}
