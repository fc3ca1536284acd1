//! Shared GIF fixtures for integration tests

#![allow(dead_code)]

use std::borrow::Cow;
use std::fs::File;
use std::path::Path;

use gif::{ColorOutput, DecodeOptions, DisposalMethod, Encoder, Repeat};

/// 0 magenta, 1 red, 2 green, 3 blue, 4 white
pub const PALETTE: [u8; 15] = [255, 0, 255, 255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];

/// Full-screen fixture frame.
///
/// Defaults match the unit-test fixtures: delay 0 and `Keep` with no
/// transparency, which extraction treats as an absent control extension.
pub struct Frame {
    pub indices: Vec<u8>,
    pub delay_cs: u16,
    pub dispose: DisposalMethod,
    pub transparent: Option<u8>,
}

impl Frame {
    pub fn new(indices: Vec<u8>) -> Self {
        Self { indices, delay_cs: 0, dispose: DisposalMethod::Keep, transparent: None }
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

/// Write a full-screen-frame GIF using [`PALETTE`].
pub fn write_gif(path: &Path, width: u16, height: u16, frames: &[Frame]) {
    let file = File::create(path).expect("create fixture");
    let mut encoder = Encoder::new(file, width, height, &PALETTE).expect("gif header");
    encoder.set_repeat(Repeat::Infinite).expect("loop extension");
    for f in frames {
        let mut frame = gif::Frame::default();
        frame.width = width;
        frame.height = height;
        frame.delay = f.delay_cs;
        frame.dispose = f.dispose;
        frame.transparent = f.transparent;
        frame.buffer = Cow::Owned(f.indices.clone());
        encoder.write_frame(&frame).expect("write fixture frame");
    }
}

/// One decoded output frame, expanded to RGBA.
pub struct RgbaFrame {
    pub width: u16,
    pub height: u16,
    pub delay: u16,
    pub dispose: DisposalMethod,
    pub rgba: Vec<u8>,
}

impl RgbaFrame {
    pub fn pixel(&self, x: u16, y: u16) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]]
    }
}

/// Decode a GIF into `(screen size, repeat, frames)`.
pub fn read_gif(path: &Path) -> ((u16, u16), Repeat, Vec<RgbaFrame>) {
    let mut options = DecodeOptions::new();
    options.set_color_output(ColorOutput::RGBA);
    let file = File::open(path).expect("open output");
    let mut decoder = options.read_info(file).expect("gif header");
    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame().expect("decode frame") {
        frames.push(RgbaFrame {
            width: frame.width,
            height: frame.height,
            delay: frame.delay,
            dispose: frame.dispose,
            rgba: frame.buffer.to_vec(),
        });
    }
    ((decoder.width(), decoder.height()), decoder.repeat(), frames)
}
