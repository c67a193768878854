// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Uncompressed 24-bit Windows bitmaps.
//!
//! The file is a 14-byte file header, a 40-byte info header, and then
//! the pixel rows from the bottom of the picture up, each pixel stored
//! blue, green, red.  Rows are zero-padded to four bytes.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use coordinator::OutputImage;
use error::{RenderError, Result};

/// Size of the file header.
pub const FILE_HEADER_LEN: usize = 14;
/// Size of the info header.
pub const INFO_HEADER_LEN: usize = 40;
/// Where the pixel rows begin.
pub const PIXEL_OFFSET: u32 = (FILE_HEADER_LEN + INFO_HEADER_LEN) as u32;

/// The fields of a bitmap header that matter to us.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BmpHeader {
    /// Total file size in bytes.
    pub file_size: u32,
    /// Offset of the first pixel row.
    pub pixel_offset: u32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels; positive means bottom-up.
    pub height: i32,
    /// Bits per pixel.
    pub bits_per_pixel: u16,
    /// Compression scheme; 0 is none.
    pub compression: u32,
}

/// Bytes in one stored row of a `width` pixel image.
pub fn row_stride(width: usize) -> usize {
    (width * 3 + 3) & !3
}

/// Total file size of a `width` by `height` bitmap.
pub fn file_size(width: usize, height: usize) -> usize {
    PIXEL_OFFSET as usize + row_stride(width) * height
}

fn header_bytes(width: usize, height: usize) -> Result<[u8; 54]> {
    let size = file_size(width, height);
    if size > u32::max_value() as usize || width > i32::max_value() as usize {
        return Err(RenderError::Config(format!(
            "a {}x{} image is too large for a bitmap",
            width, height
        )));
    }

    let mut h = [0u8; 54];
    h[0] = b'B';
    h[1] = b'M';
    h[2..6].copy_from_slice(&(size as u32).to_le_bytes());
    h[10..14].copy_from_slice(&PIXEL_OFFSET.to_le_bytes());

    h[14..18].copy_from_slice(&(INFO_HEADER_LEN as u32).to_le_bytes());
    h[18..22].copy_from_slice(&(width as i32).to_le_bytes());
    h[22..26].copy_from_slice(&(height as i32).to_le_bytes());
    h[26..28].copy_from_slice(&1u16.to_le_bytes());
    h[28..30].copy_from_slice(&24u16.to_le_bytes());
    Ok(h)
}

/// Serialises `image` to `out`.
pub fn write_bmp<W: Write>(mut out: W, image: &OutputImage) -> Result<()> {
    out.write_all(&header_bytes(image.width, image.height)?)?;

    let stride = row_stride(image.width);
    let mut row = vec![0u8; stride];
    for pixels in image.pixels.chunks(image.width.max(1)).rev() {
        for (p, bgr) in pixels.iter().zip(row.chunks_mut(3)) {
            bgr[0] = p.2;
            bgr[1] = p.1;
            bgr[2] = p.0;
        }
        out.write_all(&row)?;
    }
    out.flush()?;
    Ok(())
}

/// Writes `image` to the file at `path`.  If the file cannot be
/// created the image is left as it was and the caller may try
/// elsewhere.
pub fn write<P: AsRef<Path>>(path: P, image: &OutputImage) -> Result<()> {
    let path = path.as_ref();
    let output = File::create(path).map_err(|cause| RenderError::Output {
        path: path.display().to_string(),
        cause,
    })?;
    info!("writing bitmap to {}", path.display());
    write_bmp(BufWriter::new(output), image)
}

fn u16_at(b: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([b[at], b[at + 1]])
}

fn u32_at(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

/// Reads back the 54 header bytes of a bitmap.
pub fn read_header<R: Read>(mut input: R) -> Result<BmpHeader> {
    let mut h = [0u8; 54];
    input.read_exact(&mut h)?;
    if &h[0..2] != b"BM" {
        return Err(RenderError::Protocol("not a bitmap".to_string()));
    }
    Ok(BmpHeader {
        file_size: u32_at(&h, 2),
        pixel_offset: u32_at(&h, 10),
        width: u32_at(&h, 18) as i32,
        height: u32_at(&h, 22) as i32,
        bits_per_pixel: u16_at(&h, 28),
        compression: u32_at(&h, 30),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::Rgb;

    fn image(width: usize, height: usize) -> OutputImage {
        OutputImage {
            width,
            height,
            pixels: (0..width * height)
                .map(|i| Rgb(i as u8, (i * 2) as u8, (i * 3) as u8))
                .collect(),
        }
    }

    #[test]
    fn header_is_little_endian_at_the_documented_offsets() {
        let mut bytes = vec![];
        write_bmp(&mut bytes, &image(4, 2)).unwrap();
        assert_eq!(&bytes[0..2], b"BM");
        assert_eq!(&bytes[2..6], &[78, 0, 0, 0]);
        assert_eq!(&bytes[10..14], &[54, 0, 0, 0]);
        assert_eq!(&bytes[14..18], &[40, 0, 0, 0]);
        assert_eq!(&bytes[18..22], &[4, 0, 0, 0]);
        assert_eq!(&bytes[22..26], &[2, 0, 0, 0]);
        assert_eq!(&bytes[26..28], &[1, 0]);
        assert_eq!(&bytes[28..30], &[24, 0]);
        assert_eq!(&bytes[30..34], &[0, 0, 0, 0]);
        assert_eq!(bytes.len(), 54 + 3 * 4 * 2);
    }

    #[test]
    fn rows_are_bottom_up_and_bgr() {
        let mut bytes = vec![];
        write_bmp(&mut bytes, &image(4, 2)).unwrap();
        // The first stored row is image row 1, whose first pixel is
        // index 4: Rgb(4, 8, 12).
        assert_eq!(&bytes[54..57], &[12, 8, 4]);
        // The second stored row is image row 0.
        assert_eq!(&bytes[54 + 12..54 + 15], &[0, 0, 0]);
        assert_eq!(&bytes[54 + 15..54 + 18], &[3, 2, 1]);
    }

    #[test]
    fn odd_widths_are_padded() {
        assert_eq!(row_stride(800), 2400);
        assert_eq!(row_stride(3), 12);
        assert_eq!(row_stride(5), 16);
        let mut bytes = vec![];
        write_bmp(&mut bytes, &image(5, 3)).unwrap();
        assert_eq!(bytes.len(), file_size(5, 3));
        assert_eq!(bytes.len(), 54 + 16 * 3);
        assert_eq!(&bytes[54 + 15..54 + 16], &[0]);
    }

    #[test]
    fn header_round_trips() {
        let mut bytes = vec![];
        write_bmp(&mut bytes, &image(12, 7)).unwrap();
        let h = read_header(&bytes[..]).unwrap();
        assert_eq!((h.width, h.height), (12, 7));
        assert_eq!(h.file_size as usize, bytes.len());
        assert_eq!(h.pixel_offset, 54);
        assert_eq!(h.bits_per_pixel, 24);
        assert_eq!(h.compression, 0);
    }

    #[test]
    fn garbage_is_not_a_header() {
        assert!(read_header(&[0u8; 60][..]).is_err());
        assert!(read_header(&b"BM"[..]).is_err());
    }

    #[test]
    fn unopenable_path_is_reported() {
        let dir = ::tempfile::tempdir().unwrap();
        let img = image(4, 4);
        let bad = dir.path().join("missing").join("out.bmp");
        match write(&bad, &img) {
            Err(RenderError::Output { path, .. }) => assert!(path.ends_with("out.bmp")),
            other => panic!("expected Output, got {:?}", other),
        }
        // The image is untouched and a second attempt elsewhere works.
        let good = dir.path().join("out.bmp");
        write(&good, &img).unwrap();
        let h = read_header(File::open(&good).unwrap()).unwrap();
        assert_eq!((h.width, h.height), (4, 4));
    }
}
