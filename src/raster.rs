//! Decoder for the screenshots written by the headless backend.
//!
//! Only 8-bit RGBA with filter type 0 on every row is accepted. `IDAT`
//! payloads are concatenated and inflated once; chunk CRCs are skipped.

use std::io::Read;
use std::path::Path;

use flate2::read::ZlibDecoder;
use thiserror::Error;

use crate::error::{HarnessError, Result};

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

const BIT_DEPTH: u8 = 8;
const COLOR_TYPE_RGBA: u8 = 6;
const CHANNELS: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("Not a valid PNG file")]
    BadSignature,
    #[error("Truncated PNG data at byte {offset}")]
    Truncated { offset: usize },
    #[error("IHDR chunk has length {length}, expected 13")]
    InvalidHeader { length: usize },
    #[error("Only 8-bit RGBA PNGs supported (bit depth {bit_depth}, color type {color_type})")]
    UnsupportedFormat { bit_depth: u8, color_type: u8 },
    #[error("Pixel data before IHDR chunk")]
    MissingHeader,
    #[error("No IDAT chunk before IEND")]
    MissingPixelData,
    #[error("Image dimensions {width}x{height} are too large")]
    TooLarge { width: u32, height: u32 },
    #[error("Failed to inflate image data: {0}")]
    Decompress(String),
    #[error("Image data has {actual} bytes, expected {expected}")]
    ShortImageData { expected: usize, actual: usize },
    #[error("Row {row} uses filter type {filter}; only unfiltered rows are supported")]
    UnsupportedFilter { row: u32, filter: u8 },
}

/// Decoded image: `width * height` RGBA pixels, row-major, top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl Raster {
    /// Returns `None` unless `pixels.len() == width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 4]>) -> Option<Self> {
        let expected = (width as usize).checked_mul(height as usize)?;
        (pixels.len() == expected).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    pub fn pixel_count(&self) -> u64 {
        self.pixels.len() as u64
    }

    /// Mutable access for building fixtures.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        if x < self.width && y < self.height {
            let idx = y as usize * self.width as usize + x as usize;
            self.pixels[idx] = color;
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Header {
    width: u32,
    height: u32,
}

impl Header {
    /// Scanline length (filter byte included) and total unfiltered size.
    fn layout(&self) -> std::result::Result<(usize, usize), FormatError> {
        let too_large = || FormatError::TooLarge {
            width: self.width,
            height: self.height,
        };
        let row_bytes = (self.width as usize)
            .checked_mul(CHANNELS)
            .and_then(|n| n.checked_add(1))
            .ok_or_else(too_large)?;
        let expected = row_bytes
            .checked_mul(self.height as usize)
            .ok_or_else(too_large)?;
        Ok((row_bytes, expected))
    }
}

struct Chunk<'a> {
    kind: [u8; 4],
    data: &'a [u8],
}

struct ChunkReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ChunkReader<'a> {
    fn take(&mut self, len: usize) -> std::result::Result<&'a [u8], FormatError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(FormatError::Truncated {
                offset: self.offset,
            })?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn next_chunk(&mut self) -> std::result::Result<Chunk<'a>, FormatError> {
        let length = u32::from_be_bytes(to_array(self.take(4)?)) as usize;
        let kind = to_array(self.take(4)?);
        let data = self.take(length)?;
        // CRC
        self.take(4)?;
        Ok(Chunk { kind, data })
    }
}

fn to_array(slice: &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&slice[..4]);
    out
}

/// Decode an in-memory PNG produced by the headless backend.
pub fn decode(bytes: &[u8]) -> std::result::Result<Raster, FormatError> {
    if bytes.len() < PNG_SIGNATURE.len() || bytes[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
        return Err(FormatError::BadSignature);
    }

    let mut reader = ChunkReader {
        bytes,
        offset: PNG_SIGNATURE.len(),
    };
    let mut header: Option<Header> = None;
    let mut compressed = Vec::new();
    let mut saw_data = false;

    loop {
        let chunk = reader.next_chunk()?;
        match &chunk.kind {
            b"IHDR" => header = Some(parse_header(chunk.data)?),
            b"IDAT" => {
                if header.is_none() {
                    return Err(FormatError::MissingHeader);
                }
                saw_data = true;
                compressed.extend_from_slice(chunk.data);
            }
            b"IEND" => break,
            _ => {}
        }
    }

    let header = header.ok_or(FormatError::MissingHeader)?;
    if !saw_data {
        return Err(FormatError::MissingPixelData);
    }

    let (_, expected) = header.layout()?;
    let raw = inflate(&compressed, expected)?;
    unfilter(header, &raw)
}

/// Inflate at most `limit + 1` bytes; anything past `limit` is never used.
fn inflate(compressed: &[u8], limit: usize) -> std::result::Result<Vec<u8>, FormatError> {
    let mut raw = Vec::new();
    ZlibDecoder::new(compressed)
        .take(limit as u64 + 1)
        .read_to_end(&mut raw)
        .map_err(|e| FormatError::Decompress(e.to_string()))?;
    Ok(raw)
}

fn parse_header(data: &[u8]) -> std::result::Result<Header, FormatError> {
    if data.len() != 13 {
        return Err(FormatError::InvalidHeader { length: data.len() });
    }
    let width = u32::from_be_bytes(to_array(&data[0..4]));
    let height = u32::from_be_bytes(to_array(&data[4..8]));
    let bit_depth = data[8];
    let color_type = data[9];
    if bit_depth != BIT_DEPTH || color_type != COLOR_TYPE_RGBA {
        return Err(FormatError::UnsupportedFormat {
            bit_depth,
            color_type,
        });
    }
    Ok(Header { width, height })
}

fn unfilter(header: Header, raw: &[u8]) -> std::result::Result<Raster, FormatError> {
    let (row_bytes, expected) = header.layout()?;
    if raw.len() < expected {
        return Err(FormatError::ShortImageData {
            expected,
            actual: raw.len(),
        });
    }

    let mut pixels = Vec::with_capacity(header.width as usize * header.height as usize);
    for (row, line) in raw[..expected].chunks_exact(row_bytes).enumerate() {
        let filter = line[0];
        if filter != 0 {
            return Err(FormatError::UnsupportedFilter {
                row: row as u32,
                filter,
            });
        }
        pixels.extend(
            line[1..]
                .chunks_exact(CHANNELS)
                .map(|px| [px[0], px[1], px[2], px[3]]),
        );
    }

    Ok(Raster {
        width: header.width,
        height: header.height,
        pixels,
    })
}

/// Read and decode a PNG file.
pub fn decode_file(path: &Path) -> Result<Raster> {
    let bytes = std::fs::read(path)?;
    decode(&bytes).map_err(|source| HarnessError::Format {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use image::codecs::png::{CompressionType, FilterType, PngEncoder};
    use image::{ColorType, ImageEncoder};
    use std::io::Write;

    fn chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(kind);
        out.extend_from_slice(data);
        out.extend_from_slice(&[0, 0, 0, 0]);
        out
    }

    fn ihdr(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[bit_depth, color_type, 0, 0, 0]);
        chunk(b"IHDR", &data)
    }

    fn scanlines(width: u32, height: u32, color: [u8; 4], filter: u8) -> Vec<u8> {
        let mut raw = Vec::new();
        for _ in 0..height {
            raw.push(filter);
            for _ in 0..width {
                raw.extend_from_slice(&color);
            }
        }
        raw
    }

    fn deflate(raw: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(raw).unwrap();
        encoder.finish().unwrap()
    }

    /// Hand-built PNG with the compressed stream split across `splits` IDAT chunks.
    fn build_png(width: u32, height: u32, color: [u8; 4], splits: usize) -> Vec<u8> {
        let compressed = deflate(&scanlines(width, height, color, 0));
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend(ihdr(width, height, 8, 6));
        let part = compressed.len().div_ceil(splits.max(1)).max(1);
        for piece in compressed.chunks(part) {
            png.extend(chunk(b"IDAT", piece));
        }
        png.extend(chunk(b"IEND", &[]));
        png
    }

    #[test]
    fn decodes_unfiltered_png_from_image_encoder() {
        let (w, h) = (7u32, 3u32);
        let color = [12, 34, 56, 255];
        let buf: Vec<u8> = (0..w * h).flat_map(|_| color).collect();
        let mut png = Vec::new();
        PngEncoder::new_with_quality(&mut png, CompressionType::Default, FilterType::NoFilter)
            .write_image(&buf, w, h, ColorType::Rgba8)
            .expect("encode png");

        let raster = decode(&png).expect("decode png");
        assert_eq!(raster.width(), w);
        assert_eq!(raster.height(), h);
        assert_eq!(raster.pixels().len(), (w * h) as usize);
        assert!(raster.pixels().iter().all(|px| *px == color));
    }

    #[test]
    fn reassembles_split_idat_chunks() {
        let png = build_png(16, 9, [200, 100, 50, 128], 5);
        let raster = decode(&png).expect("decode split png");
        assert_eq!(raster.pixel_count(), 16 * 9);
        assert_eq!(raster.pixel(15, 8), Some([200, 100, 50, 128]));
    }

    #[test]
    fn keeps_row_major_order() {
        let mut raw = Vec::new();
        for y in 0..2u8 {
            raw.push(0);
            for x in 0..3u8 {
                raw.extend_from_slice(&[x, y, 0, 255]);
            }
        }
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend(ihdr(3, 2, 8, 6));
        png.extend(chunk(b"IDAT", &deflate(&raw)));
        png.extend(chunk(b"IEND", &[]));

        let raster = decode(&png).unwrap();
        assert_eq!(raster.pixel(2, 0), Some([2, 0, 0, 255]));
        assert_eq!(raster.pixel(0, 1), Some([0, 1, 0, 255]));
        assert_eq!(raster.pixels()[4], [1, 1, 0, 255]);
    }

    #[test]
    fn ignores_chunks_after_iend_and_unknown_chunks() {
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend(ihdr(2, 2, 8, 6));
        png.extend(chunk(b"tEXt", b"Software\0iui"));
        png.extend(chunk(b"IDAT", &deflate(&scanlines(2, 2, [1, 2, 3, 4], 0))));
        png.extend(chunk(b"IEND", &[]));
        png.extend(b"trailing garbage");

        let raster = decode(&png).unwrap();
        assert_eq!(raster.pixel(1, 1), Some([1, 2, 3, 4]));
    }

    #[test]
    fn rejects_bad_signature() {
        assert_eq!(decode(b"GIF89a......"), Err(FormatError::BadSignature));
        assert_eq!(decode(&[]), Err(FormatError::BadSignature));
    }

    #[test]
    fn rejects_unsupported_formats() {
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend(ihdr(2, 2, 8, 2));
        png.extend(chunk(b"IEND", &[]));
        assert_eq!(
            decode(&png),
            Err(FormatError::UnsupportedFormat {
                bit_depth: 8,
                color_type: 2
            })
        );

        let mut png = PNG_SIGNATURE.to_vec();
        png.extend(ihdr(2, 2, 16, 6));
        assert!(matches!(
            decode(&png),
            Err(FormatError::UnsupportedFormat { bit_depth: 16, .. })
        ));
    }

    #[test]
    fn rejects_pixel_data_before_header() {
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend(chunk(b"IDAT", &deflate(&scanlines(1, 1, [0; 4], 0))));
        png.extend(ihdr(1, 1, 8, 6));
        png.extend(chunk(b"IEND", &[]));
        assert_eq!(decode(&png), Err(FormatError::MissingHeader));

        let mut png = PNG_SIGNATURE.to_vec();
        png.extend(chunk(b"IEND", &[]));
        assert_eq!(decode(&png), Err(FormatError::MissingHeader));
    }

    #[test]
    fn rejects_missing_pixel_data_and_truncation() {
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend(ihdr(1, 1, 8, 6));
        png.extend(chunk(b"IEND", &[]));
        assert_eq!(decode(&png), Err(FormatError::MissingPixelData));

        let full = build_png(4, 4, [9, 9, 9, 9], 1);
        let cut = &full[..full.len() - 20];
        assert!(matches!(decode(cut), Err(FormatError::Truncated { .. })));
    }

    #[test]
    fn rejects_filtered_rows() {
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend(ihdr(2, 2, 8, 6));
        let mut raw = scanlines(2, 2, [5, 5, 5, 5], 0);
        raw[9] = 1;
        png.extend(chunk(b"IDAT", &deflate(&raw)));
        png.extend(chunk(b"IEND", &[]));
        assert_eq!(
            decode(&png),
            Err(FormatError::UnsupportedFilter { row: 1, filter: 1 })
        );
    }

    #[test]
    fn rejects_short_image_data() {
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend(ihdr(4, 4, 8, 6));
        png.extend(chunk(b"IDAT", &deflate(&scanlines(4, 2, [0; 4], 0))));
        png.extend(chunk(b"IEND", &[]));
        assert!(matches!(
            decode(&png),
            Err(FormatError::ShortImageData { .. })
        ));
    }

    #[test]
    fn inflation_stops_just_past_the_expected_size() {
        let compressed = deflate(&vec![0u8; 1 << 20]);
        let raw = inflate(&compressed, 100).unwrap();
        assert_eq!(raw.len(), 101);
    }

    #[test]
    fn oversized_image_data_decodes_from_the_leading_rows() {
        let mut raw = scanlines(2, 2, [9, 8, 7, 255], 0);
        raw.extend(std::iter::repeat(0u8).take(1 << 20));
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend(ihdr(2, 2, 8, 6));
        png.extend(chunk(b"IDAT", &deflate(&raw)));
        png.extend(chunk(b"IEND", &[]));

        let raster = decode(&png).unwrap();
        assert_eq!(raster.pixel_count(), 4);
        assert_eq!(raster.pixel(1, 1), Some([9, 8, 7, 255]));
    }

    #[test]
    fn raster_new_enforces_pixel_count() {
        assert!(Raster::new(2, 2, vec![[0; 4]; 4]).is_some());
        assert!(Raster::new(2, 2, vec![[0; 4]; 3]).is_none());
    }

    #[test]
    fn decode_file_reports_path_on_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        let err = decode_file(&path).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("broken.png"), "got: {msg}");
        assert!(msg.contains("Not a valid PNG"), "got: {msg}");
    }
}
