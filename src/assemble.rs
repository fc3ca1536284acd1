//! Animated GIF assembly

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use gif::{DisposalMethod, Encoder, Repeat};
use image::RgbaImage;

use crate::error::{EncodeCause, TileError};
use crate::models::{OutputFrame, OUTPUT_TRANSPARENT_INDEX};
use crate::palette::index_frame;

/// Largest canvas dimension a GIF can describe.
pub const MAX_GIF_DIMENSION: u32 = u16::MAX as u32;

/// Write `frames` as an infinitely looping GIF at `path`.
///
/// `durations` and `disposals` are matched to frames by position. The file
/// is encoded next to `path` and renamed into place once complete, so a
/// failed write never replaces an earlier good output.
///
/// # Errors
///
/// * [`TileError::InvariantViolation`] if the three lists differ in length,
///   the frame list is empty, or frames differ in size
/// * [`TileError::Encode`] on any IO or encoding failure
pub fn assemble(
    frames: &[RgbaImage],
    durations: &[u32],
    disposals: &[u8],
    path: &Path,
) -> Result<(), TileError> {
    if frames.len() != durations.len() || frames.len() != disposals.len() {
        return Err(TileError::InvariantViolation(format!(
            "{} frames, {} durations, {} disposal methods",
            frames.len(),
            durations.len(),
            disposals.len()
        )));
    }
    let parts: Vec<(&RgbaImage, u32, u8)> = frames
        .iter()
        .zip(durations)
        .zip(disposals)
        .map(|((image, &duration_ms), &dispose)| (image, duration_ms, dispose))
        .collect();
    write_atomic(&parts, path)
}

/// [`assemble`] for composited [`OutputFrame`]s.
pub fn assemble_frames(frames: &[OutputFrame], path: &Path) -> Result<(), TileError> {
    let parts: Vec<(&RgbaImage, u32, u8)> =
        frames.iter().map(|f| (&f.image, f.duration_ms, f.disposal_method)).collect();
    write_atomic(&parts, path)
}

fn write_atomic(frames: &[(&RgbaImage, u32, u8)], path: &Path) -> Result<(), TileError> {
    let Some((first, _, _)) = frames.first() else {
        return Err(TileError::InvariantViolation("no frames to assemble".to_string()));
    };
    let (width, height) = first.dimensions();
    if let Some(i) = frames.iter().position(|(f, _, _)| f.dimensions() != (width, height)) {
        return Err(TileError::InvariantViolation(format!(
            "frame {} is {}x{}, expected {}x{}",
            i,
            frames[i].0.width(),
            frames[i].0.height(),
            width,
            height
        )));
    }
    if width > MAX_GIF_DIMENSION || height > MAX_GIF_DIMENSION {
        return Err(TileError::encode(
            path,
            EncodeCause::Unsupported(format!(
                "{}x{} exceeds the GIF maximum of {}x{}",
                width, height, MAX_GIF_DIMENSION, MAX_GIF_DIMENSION
            )),
        ));
    }
    let disposals = frames
        .iter()
        .map(|&(_, _, d)| {
            DisposalMethod::from_u8(d).ok_or_else(|| {
                TileError::encode(
                    path,
                    EncodeCause::Unsupported(format!("disposal method {} has no GIF encoding", d)),
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| TileError::encode(path, e))?;
        }
    }

    let temp = temp_path(path);
    let written = write_gif(&temp, frames, &disposals, width as u16, height as u16)
        .and_then(|()| fs::rename(&temp, path).map_err(EncodeCause::from));
    if let Err(cause) = written {
        let _ = fs::remove_file(&temp);
        return Err(TileError::encode(path, cause));
    }
    Ok(())
}

/// GIF delays are centiseconds; round to the nearest one.
pub fn delay_centiseconds(duration_ms: u32) -> u16 {
    ((duration_ms as u64 + 5) / 10).min(u16::MAX as u64) as u16
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

fn write_gif(
    path: &Path,
    frames: &[(&RgbaImage, u32, u8)],
    disposals: &[DisposalMethod],
    width: u16,
    height: u16,
) -> Result<(), EncodeCause> {
    let file = File::create(path)?;
    let mut encoder = Encoder::new(BufWriter::new(file), width, height, &[])?;
    encoder.set_repeat(Repeat::Infinite)?;

    for (&(image, duration_ms, _), &dispose) in frames.iter().zip(disposals) {
        let indexed = index_frame(image);
        let mut frame = gif::Frame::default();
        frame.width = width;
        frame.height = height;
        frame.delay = delay_centiseconds(duration_ms);
        frame.dispose = dispose;
        frame.transparent = Some(OUTPUT_TRANSPARENT_INDEX);
        frame.palette = Some(indexed.palette);
        frame.buffer = Cow::Owned(indexed.indices);
        encoder.write_frame(&frame)?;
    }

    let mut writer = encoder.into_inner()?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::read_gif;
    use image::Rgba;
    use tempfile::tempdir;

    /// Create a simple test frame with a solid color
    fn create_test_frame(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
        RgbaImage::from_pixel(width, height, color)
    }

    #[test]
    fn test_assemble_creates_valid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.gif");

        let frames = vec![
            create_test_frame(2, 2, Rgba([255, 0, 0, 255])),
            create_test_frame(2, 2, Rgba([0, 255, 0, 255])),
        ];

        assemble(&frames, &[100, 250], &[2, 1], &path).unwrap();
        assert!(path.exists());
        assert!(image::open(&path).is_ok());
    }

    #[test]
    fn test_assemble_preserves_timing_and_disposal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("timing.gif");

        let frames = vec![
            create_test_frame(4, 4, Rgba([255, 255, 0, 255])),
            create_test_frame(4, 4, Rgba([0, 255, 255, 255])),
            create_test_frame(4, 4, Rgba([0, 0, 0, 0])),
        ];
        assemble(&frames, &[70, 1000, 30], &[0, 3, 2], &path).unwrap();

        let decoded = read_gif(&path);
        assert_eq!((decoded.width, decoded.height), (4, 4));
        assert_eq!(decoded.repeat, Repeat::Infinite);
        assert_eq!(decoded.frames.len(), 3);
        assert_eq!(decoded.frames.iter().map(|f| f.delay).collect::<Vec<_>>(), vec![7, 100, 3]);
        assert_eq!(
            decoded.frames.iter().map(|f| f.dispose as u8).collect::<Vec<_>>(),
            vec![0, 3, 2]
        );
        for frame in &decoded.frames {
            assert_eq!(frame.transparent, Some(OUTPUT_TRANSPARENT_INDEX));
        }
        assert!(decoded.frames[2].buffer.iter().all(|&i| i == OUTPUT_TRANSPARENT_INDEX));
    }

    #[test]
    fn test_assemble_length_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mismatch.gif");
        let frames = vec![create_test_frame(2, 2, Rgba([1, 2, 3, 255]))];

        let err = assemble(&frames, &[100, 100], &[2], &path).unwrap_err();
        assert!(matches!(err, TileError::InvariantViolation(_)));
        let err = assemble(&frames, &[100], &[], &path).unwrap_err();
        assert!(matches!(err, TileError::InvariantViolation(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_assemble_empty_is_invariant_violation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.gif");
        let err = assemble(&[], &[], &[], &path).unwrap_err();
        assert!(matches!(err, TileError::InvariantViolation(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_assemble_rejects_unencodable_disposal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("disposal.gif");
        let frames = vec![create_test_frame(2, 2, Rgba([1, 2, 3, 255]))];
        let err = assemble(&frames, &[100], &[7], &path).unwrap_err();
        assert!(matches!(err, TileError::Encode { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_assemble_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/dirs/test.gif");
        let frames = vec![create_test_frame(2, 2, Rgba([255, 0, 0, 255]))];

        assemble(&frames, &[100], &[2], &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_assemble_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clean.gif");
        let frames = vec![create_test_frame(2, 2, Rgba([9, 9, 9, 255]))];
        assemble(&frames, &[100], &[2], &path).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["clean.gif".to_string()]);
    }

    #[test]
    fn test_failed_write_keeps_previous_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keep.gif");
        fs::write(&path, b"previous").unwrap();

        let frames = vec![
            create_test_frame(2, 2, Rgba([1, 1, 1, 255])),
            create_test_frame(3, 3, Rgba([1, 1, 1, 255])),
        ];
        assert!(assemble(&frames, &[100, 100], &[2, 2], &path).is_err());
        assert_eq!(fs::read(&path).unwrap(), b"previous");
    }

    #[test]
    fn test_assemble_output_frames() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frames.gif");
        let mut first = OutputFrame::blank(crate::models::Size::new(3, 3), 250, 1);
        first.image.put_pixel(1, 1, Rgba([200, 10, 10, 255]));
        let second = OutputFrame::blank(crate::models::Size::new(3, 3), 60, 3);

        assemble_frames(&[first, second], &path).unwrap();
        let decoded = read_gif(&path);
        assert_eq!(decoded.frames.len(), 2);
        assert_eq!(decoded.frames[0].delay, 25);
        assert_eq!(decoded.frames[0].buffer[4], 1);
        assert_eq!(decoded.frames[1].dispose, DisposalMethod::Previous);
        assert!(decoded.frames[1].buffer.iter().all(|&i| i == OUTPUT_TRANSPARENT_INDEX));
    }

    #[test]
    fn test_delay_conversion() {
        assert_eq!(delay_centiseconds(100), 10);
        assert_eq!(delay_centiseconds(0), 0);
        assert_eq!(delay_centiseconds(4), 0);
        assert_eq!(delay_centiseconds(5), 1);
        assert_eq!(delay_centiseconds(u32::MAX), u16::MAX);
    }
}
