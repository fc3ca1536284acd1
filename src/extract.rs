//! Frame extraction from animated GIF and PNG sources
//!
//! [`Frames`] is a forward-only iterator over the decoded frames of one
//! source file. It ends when the source is exhausted and yields an `Err`
//! item (then stops) when the data is corrupt.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use gif::{ColorOutput, DecodeOptions, DisposalMethod};
use image::codecs::png::PngDecoder;
use image::{AnimationDecoder, DynamicImage, ImageDecoder, ImageFormat};

use crate::error::TileError;
use crate::models::{
    FramePixels, Size, SourceAnimation, SourceFormat, SourceFrame, DEFAULT_DISPOSAL,
    DEFAULT_DURATION_MS,
};

type GifDecoder = gif::Decoder<Cursor<Vec<u8>>>;

enum Source {
    Gif { decoder: Box<GifDecoder>, global_palette: Option<Vec<u8>>, canvas: Size },
    Apng(image::Frames<'static>),
    Still(Option<image::RgbaImage>),
}

/// Lazy frame sequence of an opened source animation.
pub struct Frames {
    path: PathBuf,
    info: SourceAnimation,
    source: Source,
    next_index: usize,
    finished: bool,
}

/// Open `path` and return its frame sequence.
///
/// # Errors
///
/// * [`TileError::SourceNotFound`] if `path` does not exist
/// * [`TileError::Decode`] if the header cannot be parsed or the format is unsupported
pub fn extract(path: &Path) -> Result<Frames, TileError> {
    Frames::open(path)
}

impl Frames {
    /// Open `path`, read its header and position before the first frame.
    pub fn open(path: &Path) -> Result<Self, TileError> {
        if !path.exists() {
            return Err(TileError::SourceNotFound { path: path.to_path_buf() });
        }
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TileError::SourceNotFound { path: path.to_path_buf() },
            _ => TileError::decode(path, e),
        })?;

        let format = image::guess_format(&bytes).map_err(|e| TileError::decode(path, e))?;
        let (info, source) = match format {
            ImageFormat::Gif => open_gif(path, bytes)?,
            ImageFormat::Png => open_png(path, bytes)?,
            other => {
                return Err(TileError::decode(path, format!("unsupported format {:?}", other)));
            }
        };

        Ok(Self { path: path.to_path_buf(), info, source, next_index: 0, finished: false })
    }

    /// Header information of the source.
    pub fn info(&self) -> &SourceAnimation {
        &self.info
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loop setting seen so far. Only GIF sources carry one, and it is
    /// only final once the iterator is exhausted.
    pub fn repeat(&self) -> Option<gif::Repeat> {
        match &self.source {
            Source::Gif { decoder, .. } => Some(decoder.repeat()),
            _ => None,
        }
    }

    fn read_next(&mut self) -> Result<Option<SourceFrame>, TileError> {
        let background = self.info.background_index;
        match &mut self.source {
            Source::Gif { decoder, global_palette, canvas } => {
                let frame = match decoder.read_next_frame() {
                    Ok(Some(frame)) => frame,
                    Ok(None) => return Ok(None),
                    Err(e) => {
                        return Err(TileError::decode(
                            &self.path,
                            format!("frame {}: {}", self.next_index, e),
                        ))
                    }
                };
                let palette = frame
                    .palette
                    .clone()
                    .or_else(|| global_palette.clone())
                    .ok_or_else(|| {
                        TileError::decode(
                            &self.path,
                            format!("frame {} has no colour table", self.next_index),
                        )
                    })?;
                *canvas = grow_canvas(*canvas, frame);
                Ok(Some(gif_frame_to_source(frame, palette, *canvas, background)))
            }
            Source::Apng(frames) => match frames.next() {
                None => Ok(None),
                Some(Err(e)) => Err(TileError::decode(
                    &self.path,
                    format!("frame {}: {}", self.next_index, e),
                )),
                Some(Ok(frame)) => {
                    let (numer, denom) = frame.delay().numer_denom_ms();
                    let delay_ms = if denom == 0 { 0 } else { numer / denom };
                    let mut source = SourceFrame::direct(frame.into_buffer());
                    source.duration_ms = delay_ms;
                    Ok(Some(source))
                }
            },
            Source::Still(image) => Ok(image.take().map(SourceFrame::direct)),
        }
    }
}

impl Iterator for Frames {
    type Item = Result<(SourceFrame, usize), TileError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_next() {
            Ok(Some(frame)) => {
                let index = self.next_index;
                self.next_index += 1;
                Some(Ok((frame, index)))
            }
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Frames {}

fn open_gif(path: &Path, bytes: Vec<u8>) -> Result<(SourceAnimation, Source), TileError> {
    let mut options = DecodeOptions::new();
    options.set_color_output(ColorOutput::Indexed);
    let decoder = options.read_info(Cursor::new(bytes)).map_err(|e| TileError::decode(path, e))?;

    let global_palette = decoder.global_palette().map(<[u8]>::to_vec);
    let background_index = match (&global_palette, decoder.bg_color()) {
        (Some(_), Some(bg)) => u8::try_from(bg).ok(),
        _ => None,
    };
    let size = Size::new(decoder.width() as u32, decoder.height() as u32);
    let info = SourceAnimation { format: SourceFormat::Gif, size, background_index };
    Ok((info, Source::Gif { decoder: Box::new(decoder), global_palette, canvas: size }))
}

fn open_png(path: &Path, bytes: Vec<u8>) -> Result<(SourceAnimation, Source), TileError> {
    let decoder = PngDecoder::new(Cursor::new(bytes)).map_err(|e| TileError::decode(path, e))?;
    let (width, height) = decoder.dimensions();
    let info = SourceAnimation {
        format: SourceFormat::Png,
        size: Size::new(width, height),
        background_index: None,
    };

    let source = if decoder.is_apng() {
        Source::Apng(decoder.apng().into_frames())
    } else {
        let image = DynamicImage::from_decoder(decoder).map_err(|e| TileError::decode(path, e))?;
        Source::Still(Some(image.to_rgba8()))
    };
    Ok((info, source))
}

/// Whether the decoder saw a graphic control extension for this frame.
///
/// The decoder reports a missing extension as all-default fields, which is
/// indistinguishable from an explicit extension holding those same values.
fn has_control_extension(frame: &gif::Frame<'_>) -> bool {
    frame.delay != 0
        || frame.transparent.is_some()
        || frame.dispose != DisposalMethod::Keep
        || frame.needs_user_input
}

/// Working canvas after `frame`: never smaller than before, and large
/// enough to hold the frame's image descriptor.
fn grow_canvas(canvas: Size, frame: &gif::Frame<'_>) -> Size {
    let right = frame.left as u32 + frame.width as u32;
    let bottom = frame.top as u32 + frame.height as u32;
    Size::new(canvas.width.max(right), canvas.height.max(bottom))
}

/// Place a (possibly sub-rectangle) GIF frame onto the working canvas.
///
/// The canvas always contains the frame rectangle. Uncovered pixels take
/// the transparency index when the frame declares one, otherwise the
/// background index.
fn gif_frame_to_source(
    frame: &gif::Frame<'_>,
    palette: Vec<u8>,
    canvas: Size,
    background_index: Option<u8>,
) -> SourceFrame {
    let fill = frame.transparent.or(background_index).unwrap_or(0);
    let mut indices = vec![fill; canvas.pixel_count()];

    let (fw, fh) = (frame.width as usize, frame.height as usize);
    let (left, top) = (frame.left as usize, frame.top as usize);
    let cw = canvas.width as usize;
    for row in 0..fh {
        let Some(src) = frame.buffer.get(row * fw..(row + 1) * fw) else {
            break;
        };
        let start = (top + row) * cw + left;
        indices[start..start + fw].copy_from_slice(src);
    }

    let (duration_ms, disposal_method) = if has_control_extension(frame) {
        (frame.delay as u32 * 10, frame.dispose as u8)
    } else {
        (DEFAULT_DURATION_MS, DEFAULT_DISPOSAL)
    };

    SourceFrame {
        width: canvas.width,
        height: canvas.height,
        pixels: FramePixels::Indexed { indices, palette },
        duration_ms,
        disposal_method,
        transparency_index: frame.transparent,
        background_index,
    }
}
