//! File round trips through every supported codec.

use convo_core::PixelBuffer;
use convo_io::{Format, IoError, WriteOptions, read, write, write_with_options};

fn pattern(channels: u32) -> PixelBuffer {
    PixelBuffer::from_fn(13, 7, channels, |x, y| {
        [(x * 19) as u8, (y * 31) as u8, ((x ^ y) * 7) as u8, (100 + x) as u8]
    })
    .unwrap()
}

#[test]
fn test_lossless_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    for ext in ["png", "bmp", "tga"] {
        for channels in [3, 4] {
            let img = pattern(channels);
            let path = dir.path().join(format!("img_{channels}.{ext}"));
            write(&path, &img).unwrap();
            let back = read(&path).unwrap();
            assert_eq!(back, img, "{ext} with {channels} channels");
        }
    }
}

#[test]
fn test_jpeg_drops_alpha() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rgba.jpg");
    write(&path, &pattern(4)).unwrap();
    let back = read(&path).unwrap();
    assert_eq!(back.dimensions(), (13, 7, 3));
}

#[test]
fn test_jpeg_quality_changes_size() {
    let dir = tempfile::tempdir().unwrap();
    let img = pattern(3);
    let low = dir.path().join("low.jpg");
    let high = dir.path().join("high.jpg");
    write_with_options(&low, &img, &WriteOptions { jpeg_quality: 10 }).unwrap();
    write_with_options(&high, &img, &WriteOptions { jpeg_quality: 100 }).unwrap();
    let low_len = std::fs::metadata(&low).unwrap().len();
    let high_len = std::fs::metadata(&high).unwrap().len();
    assert!(low_len < high_len);
}

#[test]
fn test_magic_bytes_beat_extension() {
    let dir = tempfile::tempdir().unwrap();
    let png = dir.path().join("real.png");
    write(&png, &pattern(3)).unwrap();

    // Same bytes behind a misleading name
    let disguised = dir.path().join("disguised.bmp");
    std::fs::copy(&png, &disguised).unwrap();
    assert_eq!(Format::detect(&disguised).unwrap(), Format::Png);
    assert_eq!(read(&disguised).unwrap(), pattern(3));
}

#[test]
fn test_garbage_is_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3]).unwrap();
    assert!(matches!(read(&path), Err(IoError::DecodeError(_))));
}
