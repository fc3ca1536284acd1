//! GIF fixtures for unit tests

use std::borrow::Cow;
use std::fs::File;
use std::path::Path;

use gif::{DisposalMethod, Encoder, Repeat};

/// Global palette of every fixture: 0 magenta, 1 red, 2 green, 3 blue, 4 white, 5-15 greys.
pub fn fixture_palette() -> Vec<u8> {
    let mut palette = vec![255, 0, 255, 255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
    for i in 5..16u8 {
        let v = i * 15;
        palette.extend_from_slice(&[v, v, v]);
    }
    palette
}

/// One frame of a fixture GIF.
///
/// Defaults (delay 0, `Keep`, no transparency) read back as a frame without
/// a control extension.
#[derive(Debug, Clone)]
pub struct GifFixtureFrame {
    pub width: u16,
    pub height: u16,
    pub left: u16,
    pub top: u16,
    pub indices: Vec<u8>,
    pub delay_cs: u16,
    pub dispose: DisposalMethod,
    pub transparent: Option<u8>,
    pub palette: Option<Vec<u8>>,
}

impl GifFixtureFrame {
    pub fn from_indices(width: u16, height: u16, indices: Vec<u8>) -> Self {
        assert_eq!(indices.len(), width as usize * height as usize);
        Self {
            width,
            height,
            left: 0,
            top: 0,
            indices,
            delay_cs: 0,
            dispose: DisposalMethod::Keep,
            transparent: None,
            palette: None,
        }
    }

    pub fn solid(width: u16, height: u16, index: u8) -> Self {
        Self::from_indices(width, height, vec![index; width as usize * height as usize])
    }

    pub fn at(mut self, left: u16, top: u16) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    pub fn delay_cs(mut self, delay: u16) -> Self {
        self.delay_cs = delay;
        self
    }

    pub fn dispose(mut self, dispose: DisposalMethod) -> Self {
        self.dispose = dispose;
        self
    }

    pub fn transparent(mut self, index: u8) -> Self {
        self.transparent = Some(index);
        self
    }
}

/// Write an animated GIF fixture with the fixture palette as global colour table.
pub fn write_gif(path: &Path, width: u16, height: u16, frames: &[GifFixtureFrame]) {
    let file = File::create(path).unwrap();
    let mut encoder = Encoder::new(file, width, height, &fixture_palette()).unwrap();
    encoder.set_repeat(Repeat::Infinite).unwrap();
    for f in frames {
        let mut frame = gif::Frame::default();
        frame.width = f.width;
        frame.height = f.height;
        frame.left = f.left;
        frame.top = f.top;
        frame.delay = f.delay_cs;
        frame.dispose = f.dispose;
        frame.transparent = f.transparent;
        frame.palette = f.palette.clone();
        frame.buffer = Cow::Owned(f.indices.clone());
        encoder.write_frame(&frame).unwrap();
    }
}

/// Decoded view of a written GIF: `(frames, repeat)`.
pub struct DecodedGif {
    pub width: u16,
    pub height: u16,
    pub repeat: Repeat,
    pub frames: Vec<gif::Frame<'static>>,
}

pub fn read_gif(path: &Path) -> DecodedGif {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = options.read_info(File::open(path).unwrap()).unwrap();
    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame().unwrap() {
        frames.push(frame.clone());
    }
    let (width, height) = (decoder.width(), decoder.height());
    DecodedGif { width, height, repeat: decoder.repeat(), frames }
}
