//! End-to-end tests for streaming gzip extraction.

use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};
use rgunzip::gzip::{MAX_BUFFER_SIZE, locate_payload, working_buffer_size};
use rgunzip::{ErrorKind, GzipExtractor, gunzip};
use std::cell::RefCell;
use std::io::Write;

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Pseudo-random bytes that do not compress well
fn noise(len: usize) -> Vec<u8> {
    let mut state = 0x2545_F491_4F6C_DD1Du64;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}

#[test]
fn round_trip_various_sizes() {
    let dir = tempfile::tempdir().unwrap();

    for (i, len) in [1usize, 63, 64, 65, 4096, 65_536, 65_537, 1_000_000]
        .into_iter()
        .enumerate()
    {
        let original = noise(len);
        let data = gzip(&original);
        let path = dir.path().join(format!("out{}", i));

        let report = GzipExtractor::new(&data)
            .verify_crc32(true)
            .extract_to_file(&path)
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), original, "len {}", len);
        assert_eq!(report.file_size, len as u64);
    }
}

#[test]
fn round_trip_compressible_data() {
    let dir = tempfile::tempdir().unwrap();
    let patterns: [(&str, fn(usize) -> Vec<u8>); 3] = [
        ("zeros", |len| vec![0u8; len]),
        ("mod7", |len| (0..len).map(|i| (i % 7) as u8).collect()),
        ("text", |len| b"abcdefgh".iter().copied().cycle().take(len).collect()),
    ];

    for (name, make) in patterns {
        for len in [100_000usize, 1 << 20, 5 << 20] {
            for level in [1, 6, 9] {
                let original = make(len);
                let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level));
                encoder.write_all(&original).unwrap();
                let data = encoder.finish().unwrap();
                let path = dir.path().join(format!("{}-{}-{}", name, len, level));

                let report = GzipExtractor::new(&data)
                    .verify_crc32(true)
                    .extract_to_file(&path)
                    .unwrap_or_else(|e| panic!("{} len {} level {}: {}", name, len, level, e));

                assert_eq!(report.file_size, len as u64);
                assert!(
                    std::fs::read(&path).unwrap() == original,
                    "{} len {} level {}",
                    name,
                    len,
                    level
                );
            }
        }
    }
}

#[test]
fn large_run_of_zeros_round_trips() {
    let original = vec![0u8; 24 << 20];
    let data = gzip(&original);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zeros");

    assert!(gunzip(&data, &path));
    assert_eq!(std::fs::metadata(&path).unwrap().len(), original.len() as u64);
}

#[test]
fn empty_original_decodes_to_empty_file() {
    let data = gzip(b"");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty");

    assert!(gunzip(&data, &path));
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
}

#[test]
fn header_with_all_optional_fields() {
    let original = b"The quick brown fox jumps over the lazy dog".repeat(100);
    let mut encoder = GzBuilder::new()
        .filename("fox.txt")
        .comment("a comment")
        .extra(vec![b'A', b'B', 4, 0, 1, 2, 3, 4])
        .mtime(1_700_000_000)
        .write(Vec::new(), Compression::best());
    encoder.write_all(&original).unwrap();
    let data = encoder.finish().unwrap();

    let member = locate_payload(&data).unwrap();
    assert_eq!(member.header.filename, Some(&b"fox.txt"[..]));
    assert_eq!(member.header.comment, Some(&b"a comment"[..]));
    assert_eq!(member.header.mtime, 1_700_000_000);
    assert_eq!(member.payload_offset, 10 + (8 + 2) + 8 + 10);
    assert_eq!(member.footer.original_size, original.len() as u32);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fox");
    GzipExtractor::new(&data)
        .verify_crc32(true)
        .extract_to_file(&path)
        .unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), original);
}

#[test]
fn progress_is_monotonic_and_completes() {
    let original = noise(700_000);
    let data = gzip(&original);
    let dir = tempfile::tempdir().unwrap();

    let reports = RefCell::new(Vec::new());
    let report = GzipExtractor::new(&data)
        .on_progress(|p| reports.borrow_mut().push(p))
        .extract_to_file(&dir.path().join("out"))
        .unwrap();

    let reports = reports.into_inner();
    assert!(report.summary.cycles > 1);
    assert!(reports.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(reports.last().copied(), Some(1.0));
}

#[test]
fn cancellation_on_second_cycle() {
    let original = noise(1_000_000);
    let data = gzip(&original);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial");

    let checks = RefCell::new(0);
    let err = GzipExtractor::new(&data)
        .cancel_when(|| {
            *checks.borrow_mut() += 1;
            *checks.borrow() >= 2
        })
        .extract_to_file(&path)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    let written = std::fs::metadata(&path).unwrap().len();
    assert!(written <= 2 * MAX_BUFFER_SIZE as u64);
    assert_eq!(written, working_buffer_size(data.len() - 18) as u64);
}

#[test]
fn magic_flip_never_touches_destination() {
    let data = gzip(b"abc");
    let dir = tempfile::tempdir().unwrap();

    for index in [0usize, 1] {
        let mut corrupt = data.clone();
        corrupt[index] ^= 0x55;

        let fresh = dir.path().join(format!("fresh{}", index));
        assert!(!gunzip(&corrupt, &fresh));
        assert!(!fresh.exists());

        let existing = dir.path().join(format!("existing{}", index));
        std::fs::write(&existing, b"keep").unwrap();
        let err = GzipExtractor::new(&corrupt)
            .extract_to_file(&existing)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadMagicOrMethod);
        assert_eq!(std::fs::read(&existing).unwrap(), b"keep");
    }
}

#[test]
fn short_input_never_creates_destination() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out");

    for len in 0..18 {
        let data = vec![0x1F; len];
        let err = GzipExtractor::new(&data).extract_to_file(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooShort);
        assert!(!path.exists());
    }
}

#[test]
fn corrupt_deflate_data_fails() {
    let original = noise(200_000);
    let mut data = gzip(&original);
    let middle = data.len() / 2;
    for b in &mut data[middle..middle + 64] {
        *b = !*b;
    }
    let dir = tempfile::tempdir().unwrap();

    let result = GzipExtractor::new(&data)
        .verify_crc32(true)
        .extract_to_file(&dir.path().join("out"));

    // Depending on where the damage lands the decoder either rejects the
    // stream or produces the wrong bytes; both must fail.
    assert!(result.is_err());
}

#[test]
fn truncated_container_fails() {
    let data = gzip(&noise(100_000));
    let mut truncated = data[..data.len() / 2].to_vec();
    // Re-append a plausible footer so only the payload is short
    truncated.extend_from_slice(&data[data.len() - 8..]);
    let dir = tempfile::tempdir().unwrap();

    let err = GzipExtractor::new(&truncated)
        .extract_to_file(&dir.path().join("out"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecoderFailure);
}

#[test]
fn size_gate_detects_corrupted_isize() {
    let data = gzip(b"size matters");
    let dir = tempfile::tempdir().unwrap();

    let mut bad = data.clone();
    let last = bad.len() - 1;
    bad[last] = 1;
    let err = GzipExtractor::new(&bad)
        .extract_to_file(&dir.path().join("bad"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SizeMismatch);

    assert!(gunzip(&data, &dir.path().join("good")));
}
