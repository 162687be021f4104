#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(clippy::missing_panics_doc)]
#![deny(trivial_numeric_casts)]
#![forbid(unsafe_code)]

use std::io::{Cursor, Read};

use zoetrope_core::{Bitmap, ChunkDecoder, SourceMode};

mod error;
pub use error::DecodeError;

/// A still-image archive decoder.
///
/// Each chunk payload is an independent tar archive holding one encoded
/// still image (PNG or JPEG) per frame. Entries are decoded in archive
/// order; entry `i` of a chunk covering `[start, end)` becomes frame
/// `start + i`. No state is carried across chunks.
///
/// Non-file entries (directories, pax headers) are skipped. A single
/// unreadable or undecodable entry fails the whole batch.
pub struct ArchiveDecoder {}

impl ChunkDecoder for ArchiveDecoder {
    type AdditionalOpts = ();
    type OpenError = std::convert::Infallible;
    type DecodeError = DecodeError;

    const MODE: SourceMode = SourceMode::Images;

    fn new(_additional_opts: ()) -> Result<Self, Self::OpenError> {
        Ok(Self {})
    }

    fn decode_chunk(
        &mut self,
        payload: &[u8],
        num_frames: usize,
    ) -> Result<Vec<Bitmap>, DecodeError> {
        let mut archive = tar::Archive::new(Cursor::new(payload));

        let mut frames = Vec::with_capacity(num_frames);
        for entry in archive.entries()? {
            let mut entry = entry?;

            if !entry.header().entry_type().is_file() {
                log::debug!("skipping non-file archive entry");
                continue;
            }

            let name = entry
                .path()
                .map(|path| path.display().to_string())
                .unwrap_or_default();

            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut bytes)?;

            let image = image::load_from_memory(&bytes)
                .map_err(|source| DecodeError::Image {
                    entry: name,
                    source,
                })?
                .to_rgba8();

            let (width, height) = image.dimensions();
            frames.push(Bitmap::new(width, height, image.into_raw()));
        }

        log::debug!("unpacked {} frame(s) from archive", frames.len());

        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 2x2 PNG with a uniform color, `value` in the red channel.
    fn png_bytes(value: u8) -> Vec<u8> {
        let mut image = image::RgbaImage::new(2, 2);
        for pixel in image.pixels_mut() {
            *pixel = image::Rgba([value, 0, 0, 255]);
        }

        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn file_entry(builder: &mut tar::Builder<Vec<u8>>, name: &str, bytes: &[u8]) {
        let mut header = tar::Header::new_gnu();
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, bytes).unwrap();
    }

    fn archive(values: &[u8]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (i, &value) in values.iter().enumerate() {
            file_entry(&mut builder, &format!("{i:06}.png"), &png_bytes(value));
        }
        builder.into_inner().unwrap()
    }

    fn decoder() -> ArchiveDecoder {
        ArchiveDecoder::new(()).unwrap()
    }

    #[test]
    fn decodes_entries_in_archive_order() {
        let frames = decoder().decode_chunk(&archive(&[10, 20, 30]), 3).unwrap();

        assert_eq!(frames.len(), 3);
        for (frame, value) in frames.iter().zip([10u8, 20, 30]) {
            assert_eq!(frame.width(), 2);
            assert_eq!(frame.height(), 2);
            assert_eq!(frame.pixel(0, 0), [value, 0, 0, 255]);
            assert_eq!(frame.pixel(1, 1), [value, 0, 0, 255]);
        }
    }

    #[test]
    fn undecodable_entry_fails_the_batch() {
        let mut builder = tar::Builder::new(Vec::new());
        file_entry(&mut builder, "000000.png", &png_bytes(10));
        file_entry(&mut builder, "000001.png", b"this is not an image");
        let payload = builder.into_inner().unwrap();

        match decoder().decode_chunk(&payload, 2) {
            Err(DecodeError::Image { entry, .. }) => assert_eq!(entry, "000001.png"),
            other => panic!("expected an image error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn non_file_entries_are_skipped() {
        let mut builder = tar::Builder::new(Vec::new());

        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, "frames/", &[][..]).unwrap();

        file_entry(&mut builder, "frames/000000.png", &png_bytes(42));
        let payload = builder.into_inner().unwrap();

        let frames = decoder().decode_chunk(&payload, 1).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].pixel(0, 0), [42, 0, 0, 255]);
    }

    #[test]
    fn empty_archive_yields_no_frames() {
        let frames = decoder().decode_chunk(&archive(&[]), 0).unwrap();
        assert!(frames.is_empty());
    }

    #[test]
    fn garbage_payload_fails() {
        let garbage = vec![0xAB; 3000];
        assert!(decoder().decode_chunk(&garbage, 1).is_err());
    }
}
