#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(clippy::missing_panics_doc)]
#![deny(trivial_numeric_casts)]
#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read};
use std::rc::Rc;

use zoetrope_core::{Bitmap, ChunkDecoder, SourceMode};

mod error;
pub use error::DecodeError;

/// A streaming YUV4MPEG2 video decoder.
///
/// Chunk payloads are consecutive slices of one continuous `.y4m` bitstream;
/// the first chunk carries the stream header. The bitstream position is
/// carried across chunks: each [`decode_chunk`] call appends its payload to
/// the stream and pulls exactly the requested number of frames, in bitstream
/// order.
///
/// Every pulled frame is converted to RGBA right away, because the y4m frame
/// borrows the decoder's internal buffer, which the next pull overwrites.
///
/// Supported pixel formats are the 8-bit ones: 4:2:0 (all chroma siting
/// variants), 4:2:2, 4:4:4 and mono.
///
/// [`decode_chunk`]: ChunkDecoder::decode_chunk
pub struct Y4mDecoder {
    feed: StreamBuffer,
    stream: Option<y4m::Decoder<StreamBuffer>>,
}

impl ChunkDecoder for Y4mDecoder {
    type AdditionalOpts = ();
    type OpenError = std::convert::Infallible;
    type DecodeError = DecodeError;

    const MODE: SourceMode = SourceMode::Video;

    fn new(_additional_opts: ()) -> Result<Self, Self::OpenError> {
        Ok(Self {
            feed: StreamBuffer::new(),
            stream: None,
        })
    }

    fn decode_chunk(
        &mut self,
        payload: &[u8],
        num_frames: usize,
    ) -> Result<Vec<Bitmap>, DecodeError> {
        self.feed.push(payload);
        let stream = self.stream()?;

        let width = stream.get_width();
        let height = stream.get_height();
        let layout = chroma_layout(stream.get_colorspace())?;

        let mut frames = Vec::with_capacity(num_frames);
        for _ in 0..num_frames {
            let frame = stream.read_frame()?;

            let bitmap = match layout {
                ChromaLayout::Mono => render_mono(width, height, frame.get_y_plane()),
                ChromaLayout::Sub { .. } => render_yuv(
                    width,
                    height,
                    layout,
                    frame.get_y_plane(),
                    frame.get_u_plane(),
                    frame.get_v_plane(),
                ),
            };
            frames.push(bitmap);
        }

        Ok(frames)
    }
}

impl Y4mDecoder {
    /// The y4m stream, created lazily once the header has arrived with the
    /// first chunk.
    fn stream(&mut self) -> Result<&mut y4m::Decoder<StreamBuffer>, DecodeError> {
        if self.stream.is_none() {
            let stream = y4m::Decoder::new(self.feed.clone())?;

            // Reject unsupported formats up front, before any frame is
            // pulled.
            chroma_layout(stream.get_colorspace())?;

            log::debug!(
                "y4m stream opened: {}x{} {:?}",
                stream.get_width(),
                stream.get_height(),
                stream.get_colorspace()
            );

            self.stream = Some(stream);
        }

        // This check cannot fail because the stream was just created above
        // if it was missing.
        Ok(self.stream.as_mut().unwrap())
    }
}

/// An append-only byte queue behind a shared handle, so the decoder half can
/// keep reading while the chunk half keeps feeding.
///
/// Reading from an exhausted queue reports end-of-stream; the queue fills
/// back up when the next chunk arrives.
#[derive(Clone)]
struct StreamBuffer {
    queue: Rc<RefCell<VecDeque<u8>>>,
}

impl StreamBuffer {
    fn new() -> Self {
        Self {
            queue: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    fn push(&self, bytes: &[u8]) {
        self.queue.borrow_mut().extend(bytes);
    }
}

impl Read for StreamBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut queue = self.queue.borrow_mut();

        let n = buf.len().min(queue.len());
        for (dst, byte) in buf.iter_mut().zip(queue.drain(..n)) {
            *dst = byte;
        }

        Ok(n)
    }
}

#[derive(Debug, Clone, Copy)]
enum ChromaLayout {
    /// Luma only.
    Mono,
    /// Chroma planes subsampled by `1 << x` horizontally and `1 << y`
    /// vertically.
    Sub { x: u32, y: u32 },
}

fn chroma_layout(colorspace: y4m::Colorspace) -> Result<ChromaLayout, DecodeError> {
    use y4m::Colorspace::*;

    match colorspace {
        Cmono => Ok(ChromaLayout::Mono),
        C420 | C420jpeg | C420paldv | C420mpeg2 => Ok(ChromaLayout::Sub { x: 1, y: 1 }),
        C422 => Ok(ChromaLayout::Sub { x: 1, y: 0 }),
        C444 => Ok(ChromaLayout::Sub { x: 0, y: 0 }),
        other => Err(DecodeError::UnsupportedColorspace(other)),
    }
}

fn render_mono(width: usize, height: usize, y_plane: &[u8]) -> Bitmap {
    let mut data = Vec::with_capacity(width * height * 4);
    for &luma in &y_plane[..width * height] {
        let value = clamp_u8(((i32::from(luma) - 16) * 298 + 128) >> 8);
        data.extend_from_slice(&[value, value, value, 255]);
    }

    Bitmap::new(width as u32, height as u32, data)
}

fn render_yuv(
    width: usize,
    height: usize,
    layout: ChromaLayout,
    y_plane: &[u8],
    u_plane: &[u8],
    v_plane: &[u8],
) -> Bitmap {
    let (x_shift, y_shift) = match layout {
        ChromaLayout::Sub { x, y } => (x, y),
        // Mono frames never reach this function.
        ChromaLayout::Mono => (0, 0),
    };

    // Chroma plane dimensions round up, matching the y4m plane sizes.
    let chroma_width = (width + (1 << x_shift) - 1) >> x_shift;

    let mut data = Vec::with_capacity(width * height * 4);
    for row in 0..height {
        for col in 0..width {
            let luma = y_plane[row * width + col];
            let ci = (row >> y_shift) * chroma_width + (col >> x_shift);
            data.extend_from_slice(&yuv_to_rgba(luma, u_plane[ci], v_plane[ci]));
        }
    }

    Bitmap::new(width as u32, height as u32, data)
}

/// BT.601 limited-range YUV to RGBA, integer approximation.
fn yuv_to_rgba(y: u8, u: u8, v: u8) -> [u8; 4] {
    let c = (i32::from(y) - 16) * 298;
    let d = i32::from(u) - 128;
    let e = i32::from(v) - 128;

    let r = (c + 409 * e + 128) >> 8;
    let g = (c - 100 * d - 208 * e + 128) >> 8;
    let b = (c + 516 * d + 128) >> 8;

    [clamp_u8(r), clamp_u8(g), clamp_u8(b), 255]
}

fn clamp_u8(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: usize = 4;
    const HEIGHT: usize = 4;

    fn header(colorspace: &str) -> Vec<u8> {
        format!("YUV4MPEG2 W{WIDTH} H{HEIGHT} F25:1 Ip A1:1 {colorspace}\n").into_bytes()
    }

    /// One C420 frame with a uniform luma plane and neutral chroma.
    fn frame_c420(luma: u8) -> Vec<u8> {
        let mut bytes = b"FRAME\n".to_vec();
        bytes.extend(std::iter::repeat(luma).take(WIDTH * HEIGHT));
        bytes.extend(std::iter::repeat(128).take((WIDTH / 2) * (HEIGHT / 2) * 2));
        bytes
    }

    fn decoder() -> Y4mDecoder {
        Y4mDecoder::new(()).unwrap()
    }

    #[test]
    fn decodes_across_chunk_boundaries() {
        let mut decoder = decoder();

        // First chunk: header plus two frames. Second chunk: two more,
        // continuing the same bitstream.
        let mut chunk = header("C420");
        chunk.extend(frame_c420(50));
        chunk.extend(frame_c420(60));
        let first = decoder.decode_chunk(&chunk, 2).unwrap();

        let mut chunk = frame_c420(70);
        chunk.extend(frame_c420(80));
        let second = decoder.decode_chunk(&chunk, 2).unwrap();

        let frames: Vec<_> = first.iter().chain(second.iter()).collect();
        assert_eq!(frames.len(), 4);
        for (frame, luma) in frames.iter().zip([50u8, 60, 70, 80]) {
            assert_eq!(frame.width(), WIDTH as u32);
            assert_eq!(frame.height(), HEIGHT as u32);
            assert_eq!(frame.pixel(0, 0), yuv_to_rgba(luma, 128, 128));
            assert_eq!(frame.pixel(3, 3), yuv_to_rgba(luma, 128, 128));
        }
    }

    #[test]
    fn neutral_chroma_renders_gray() {
        // With u = v = 128 the conversion must stay achromatic.
        let [r, g, b, a] = yuv_to_rgba(100, 128, 128);
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(a, 255);

        assert_eq!(yuv_to_rgba(16, 128, 128), [0, 0, 0, 255]);
        assert_eq!(yuv_to_rgba(235, 128, 128), [255, 255, 255, 255]);
    }

    #[test]
    fn truncated_payload_fails() {
        let mut decoder = decoder();

        let mut chunk = header("C420");
        let frame = frame_c420(50);
        chunk.extend(&frame[..frame.len() / 2]);

        match decoder.decode_chunk(&chunk, 1) {
            Err(DecodeError::Bitstream(_)) => {}
            other => panic!("expected a bitstream error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn garbage_header_fails() {
        let mut decoder = decoder();

        match decoder.decode_chunk(b"definitely not a y4m stream", 1) {
            Err(DecodeError::Bitstream(_)) => {}
            other => panic!("expected a bitstream error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn high_bit_depth_is_unsupported() {
        let mut decoder = decoder();

        let mut chunk = header("C420p10");
        chunk.extend(frame_c420(50));

        match decoder.decode_chunk(&chunk, 1) {
            Err(DecodeError::UnsupportedColorspace(_)) => {}
            other => panic!(
                "expected an unsupported colorspace error, got {:?}",
                other.map(|_| ())
            ),
        }
    }

    #[test]
    fn mono_stream_renders_grayscale() {
        let mut decoder = decoder();

        let mut chunk = header("Cmono");
        chunk.extend(b"FRAME\n");
        chunk.extend(std::iter::repeat(126u8).take(WIDTH * HEIGHT));

        let frames = decoder.decode_chunk(&chunk, 1).unwrap();
        let gray = clamp_u8(((126 - 16) * 298 + 128) >> 8);
        assert_eq!(frames[0].pixel(1, 2), [gray, gray, gray, 255]);
    }
}
