//! 백업 저널 프레이밍 모듈
//!
//! 데이터스토어 백업 파일은 32 KiB 고정 크기 블록의 연속이며,
//! 각 블록에는 다음 형식의 청크가 0개 이상 들어 있습니다.
//!
//! ```text
//! | checksum (4, LE) | length (2, LE) | type (1) | payload (length) |
//! ```
//!
//! 하나의 레코드는 블록 하나에 통째로 들어가거나(FULL),
//! 블록 경계를 넘어 FIRST → MIDDLE* → LAST 조각으로 나뉩니다.
//! [`RecordFramer`]는 조각을 다시 이어 붙여 논리 레코드 단위로 돌려줍니다.
//!
//! 스트림 끝과 손상된 헤더는 원본 포맷에서 구분할 수 없으므로
//! 둘 다 시퀀스의 정상 종료로 취급합니다. 에러는 보고하지 않습니다.

use std::io::{self, Read, Write};
use std::iter::FusedIterator;
use std::ops::Range;

use tracing::debug;

/// 물리 블록 크기
pub const BLOCK_SIZE: usize = 32 * 1024;

/// 청크 헤더 크기 (checksum 4 + length 2 + type 1)
pub const HEADER_SIZE: usize = 7;

const CRC_MASK_DELTA: u32 = 0xa282_ead8;

/// 청크 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChunkType {
    /// 블록 하나에 온전히 들어간 레코드
    Full = 1,
    /// 여러 블록에 걸친 레코드의 첫 조각
    First = 2,
    /// 중간 조각
    Middle = 3,
    /// 마지막 조각
    Last = 4,
}

impl ChunkType {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(ChunkType::Full),
            2 => Some(ChunkType::First),
            3 => Some(ChunkType::Middle),
            4 => Some(ChunkType::Last),
            _ => None,
        }
    }
}

/// 타입 바이트 + 페이로드에 대한 마스킹된 CRC32C
///
/// # Examples
/// ```
/// use dsconvert::journal::masked_crc;
///
/// assert_ne!(masked_crc(b"\x01hello"), crc32c::crc32c(b"\x01hello"));
/// ```
pub fn masked_crc(data: &[u8]) -> u32 {
    crc32c::crc32c(data)
        .rotate_right(15)
        .wrapping_add(CRC_MASK_DELTA)
}

/// 프레이밍 옵션
#[derive(Debug, Clone, Copy)]
pub struct FramerOptions {
    /// 청크 체크섬 검증 여부
    pub verify_checksums: bool,
    /// 손상된 블록을 버리고 다음 블록부터 계속 읽을지 여부
    ///
    /// 꺼져 있으면 첫 손상에서 시퀀스가 끝납니다.
    pub skip_corrupt_blocks: bool,
}

impl Default for FramerOptions {
    fn default() -> Self {
        Self {
            verify_checksums: true,
            skip_corrupt_blocks: false,
        }
    }
}

/// 파일에서 꺼낸 논리 레코드 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 파일 내 0부터 시작하는 순번
    pub index: usize,
    /// 재조립된 페이로드
    pub data: Vec<u8>,
}

enum Step {
    Chunk(ChunkType, Range<usize>),
    Corrupt(&'static str),
    End,
}

/// 바이트 스트림을 레코드 단위로 잘라내는 지연 이터레이터
///
/// 한 번 끝나면 다시 시작할 수 없습니다.
pub struct RecordFramer<R> {
    reader: R,
    options: FramerOptions,
    block: Vec<u8>,
    /// 현재 블록에서 유효한 바이트 수
    len: usize,
    /// 현재 블록 내 다음 청크 헤더 위치
    pos: usize,
    next_index: usize,
    done: bool,
}

impl<R: Read> RecordFramer<R> {
    /// 새 프레이머 생성
    pub fn new(reader: R, options: FramerOptions) -> Self {
        Self {
            reader,
            options,
            block: vec![0u8; BLOCK_SIZE],
            len: 0,
            pos: 0,
            next_index: 0,
            done: false,
        }
    }

    /// 블록을 끝까지 채워 읽음 (EOF면 읽은 만큼만)
    fn fill_block(&mut self) -> io::Result<usize> {
        let mut filled = 0;
        while filled < BLOCK_SIZE {
            match self.reader.read(&mut self.block[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    fn drop_block(&mut self, reason: &'static str) -> Step {
        self.pos = self.len;
        Step::Corrupt(reason)
    }

    fn next_chunk(&mut self) -> Step {
        loop {
            if self.pos + HEADER_SIZE <= self.len {
                let header = &self.block[self.pos..self.pos + HEADER_SIZE];
                let checksum = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
                let length = u16::from_le_bytes([header[4], header[5]]) as usize;
                let type_byte = header[6];

                if checksum == 0 && length == 0 && type_byte == 0 {
                    return self.drop_block("zero header");
                }
                let Some(chunk_type) = ChunkType::from_byte(type_byte) else {
                    return self.drop_block("invalid chunk type");
                };

                let start = self.pos + HEADER_SIZE;
                let end = start + length;
                if end > self.len {
                    return self.drop_block("chunk length overflows block");
                }
                // 타입 바이트(start - 1)부터 체크섬 대상
                if self.options.verify_checksums && checksum != masked_crc(&self.block[start - 1..end])
                {
                    return self.drop_block("checksum mismatch");
                }

                self.pos = end;
                return Step::Chunk(chunk_type, start..end);
            }

            // 짧은 블록은 파일의 마지막 블록
            if self.len > 0 && self.len < BLOCK_SIZE {
                return Step::End;
            }

            match self.fill_block() {
                Ok(0) => return Step::End,
                Ok(n) => {
                    self.len = n;
                    self.pos = 0;
                }
                Err(e) => {
                    debug!(error = %e, "저널 블록 읽기 실패, 스트림 종료로 처리");
                    return Step::End;
                }
            }
        }
    }

    fn finish(&mut self) -> Option<Record> {
        self.done = true;
        None
    }

    fn emit(&mut self, data: Vec<u8>) -> Option<Record> {
        let index = self.next_index;
        self.next_index += 1;
        Some(Record { index, data })
    }
}

impl<R: Read> Iterator for RecordFramer<R> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.done {
            return None;
        }

        let mut data = Vec::new();
        let mut in_record = false;

        loop {
            match self.next_chunk() {
                Step::End => {
                    if in_record {
                        debug!("레코드 조각이 끝나기 전에 스트림이 끝남");
                    }
                    return self.finish();
                }
                Step::Corrupt(reason) => {
                    debug!(reason, "손상된 저널 블록");
                    if in_record || !self.options.skip_corrupt_blocks {
                        return self.finish();
                    }
                }
                Step::Chunk(chunk_type, range) => match (in_record, chunk_type) {
                    (false, ChunkType::Full) => {
                        data.extend_from_slice(&self.block[range]);
                        return self.emit(data);
                    }
                    (false, ChunkType::First) => {
                        data.extend_from_slice(&self.block[range]);
                        in_record = true;
                    }
                    (false, ChunkType::Middle | ChunkType::Last) => {
                        debug!("고아 청크");
                        if !self.options.skip_corrupt_blocks {
                            return self.finish();
                        }
                    }
                    (true, ChunkType::Middle) => {
                        data.extend_from_slice(&self.block[range]);
                    }
                    (true, ChunkType::Last) => {
                        data.extend_from_slice(&self.block[range]);
                        return self.emit(data);
                    }
                    (true, ChunkType::Full | ChunkType::First) => {
                        debug!("조각 체인이 끊어짐");
                        return self.finish();
                    }
                },
            }
        }
    }
}

impl<R: Read> FusedIterator for RecordFramer<R> {}

/// 저널 포맷으로 레코드를 기록하는 라이터
///
/// 블록 끝에 헤더가 들어갈 자리가 없으면 0으로 채우고 다음 블록으로 넘어갑니다.
pub struct JournalWriter<W> {
    inner: W,
    block_offset: usize,
}

impl<W: Write> JournalWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            block_offset: 0,
        }
    }

    /// 레코드 하나를 필요한 만큼 조각내어 기록
    pub fn append(&mut self, payload: &[u8]) -> io::Result<()> {
        let mut left = payload;
        let mut begin = true;

        loop {
            let leftover = BLOCK_SIZE - self.block_offset;
            if leftover < HEADER_SIZE {
                self.inner.write_all(&[0u8; HEADER_SIZE][..leftover])?;
                self.block_offset = 0;
            }

            let avail = BLOCK_SIZE - self.block_offset - HEADER_SIZE;
            let fragment_len = left.len().min(avail);
            let end = fragment_len == left.len();

            let chunk_type = match (begin, end) {
                (true, true) => ChunkType::Full,
                (true, false) => ChunkType::First,
                (false, true) => ChunkType::Last,
                (false, false) => ChunkType::Middle,
            };

            self.write_chunk(chunk_type, &left[..fragment_len])?;
            left = &left[fragment_len..];
            begin = false;

            if end {
                return Ok(());
            }
        }
    }

    fn write_chunk(&mut self, chunk_type: ChunkType, fragment: &[u8]) -> io::Result<()> {
        let mut typed = Vec::with_capacity(fragment.len() + 1);
        typed.push(chunk_type as u8);
        typed.extend_from_slice(fragment);

        let mut header = [0u8; HEADER_SIZE];
        header[..4].copy_from_slice(&masked_crc(&typed).to_le_bytes());
        header[4..6].copy_from_slice(&(fragment.len() as u16).to_le_bytes());
        header[6] = chunk_type as u8;

        self.inner.write_all(&header)?;
        self.inner.write_all(fragment)?;
        self.block_offset += HEADER_SIZE + fragment.len();
        Ok(())
    }

    /// 내부 라이터 반환
    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn journal(records: &[&[u8]]) -> Vec<u8> {
        let mut writer = JournalWriter::new(Vec::new());
        for record in records {
            writer.append(record).unwrap();
        }
        writer.into_inner()
    }

    fn frame(bytes: Vec<u8>, options: FramerOptions) -> Vec<Record> {
        RecordFramer::new(Cursor::new(bytes), options).collect()
    }

    #[test]
    fn test_full_records_keep_order_and_index() {
        let bytes = journal(&[b"alpha", b"", b"gamma"]);
        let records = frame(bytes, FramerOptions::default());

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].data, b"alpha");
        assert!(records[1].data.is_empty());
        assert_eq!(records[2].index, 2);
    }

    #[test]
    fn test_fragments_reassembled_across_blocks() {
        let big: Vec<u8> = (0..(BLOCK_SIZE * 2 + 100)).map(|i| (i % 251) as u8).collect();
        let bytes = journal(&[b"head", &big, b"tail"]);
        assert!(bytes.len() > BLOCK_SIZE * 2);

        let records = frame(bytes, FramerOptions::default());
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].data, big);
        assert_eq!(records[2].data, b"tail");
    }

    #[test]
    fn test_block_trailer_padding_is_skipped() {
        // 첫 블록에 헤더보다 작은 3바이트만 남도록 채움
        let first = vec![7u8; BLOCK_SIZE - HEADER_SIZE - 3];
        let bytes = journal(&[&first, b"next"]);

        let records = frame(bytes, FramerOptions::default());
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].data, b"next");
    }

    #[test]
    fn test_checksum_mismatch_ends_sequence() {
        let mut bytes = journal(&[b"one", b"two", b"three"]);
        // 두 번째 레코드 페이로드 손상
        let second_payload = HEADER_SIZE + 3 + HEADER_SIZE;
        bytes[second_payload] ^= 0xff;

        let records = frame(bytes, FramerOptions::default());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data, b"one");
    }

    #[test]
    fn test_checksum_ignored_when_verification_disabled() {
        let mut bytes = journal(&[b"one", b"two"]);
        bytes[HEADER_SIZE] ^= 0xff;

        let options = FramerOptions {
            verify_checksums: false,
            ..Default::default()
        };
        assert_eq!(frame(bytes, options).len(), 2);
    }

    #[test]
    fn test_skip_corrupt_blocks_resumes_at_next_block() {
        let filler = vec![1u8; BLOCK_SIZE - HEADER_SIZE];
        let mut bytes = journal(&[&filler, b"survivor"]);
        bytes[HEADER_SIZE + 10] ^= 0xff;

        assert!(frame(bytes.clone(), FramerOptions::default()).is_empty());

        let lenient = FramerOptions {
            skip_corrupt_blocks: true,
            ..Default::default()
        };
        let records = frame(bytes, lenient);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data, b"survivor");
        assert_eq!(records[0].index, 0);
    }

    #[test]
    fn test_truncated_fragment_chain_ends_silently() {
        let big = vec![9u8; BLOCK_SIZE + 500];
        let mut bytes = journal(&[b"ok", &big]);
        bytes.truncate(BLOCK_SIZE + 10);

        let records = frame(bytes, FramerOptions::default());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data, b"ok");
    }

    #[test]
    fn test_zero_filled_block_ends_sequence() {
        let mut bytes = journal(&[b"only"]);
        bytes.resize(BLOCK_SIZE * 2, 0);

        let mut framer = RecordFramer::new(Cursor::new(bytes), FramerOptions::default());
        assert!(framer.next().is_some());
        assert!(framer.next().is_none());
        assert!(framer.next().is_none());
    }

    #[test]
    fn test_empty_stream() {
        assert!(frame(Vec::new(), FramerOptions::default()).is_empty());
    }
}
