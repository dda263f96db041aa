//! Row predictors (ISO 32000-1 Section 7.4.4.4)
//!
//! Reverses the byte-differencing transforms applied before Flate or LZW
//! compression. TIFF predictor 2 works per component; PNG predictors
//! (10–15) work per byte, each row carrying its own tag so every row can
//! use a different algorithm.

use crate::parser::filters::FilterError;
use crate::parser::objects::PdfDictionary;

/// Parameters from `/DecodeParms`.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorParams {
    pub predictor: u8,
    pub colors: usize,
    pub bits_per_component: usize,
    pub columns: usize,
    pub early_change: bool,
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
            early_change: true,
        }
    }
}

impl PredictorParams {
    pub fn from_dict(dict: Option<&PdfDictionary>) -> Self {
        let defaults = Self::default();
        let dict = match dict {
            Some(dict) => dict,
            None => return defaults,
        };
        let int = |key: &str, fallback: usize| {
            dict.get(key)
                .and_then(|o| o.as_integer())
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(fallback)
        };
        Self {
            predictor: int("Predictor", defaults.predictor as usize) as u8,
            colors: int("Colors", defaults.colors).max(1),
            bits_per_component: int("BitsPerComponent", defaults.bits_per_component).max(1),
            columns: int("Columns", defaults.columns).max(1),
            early_change: int("EarlyChange", 1) != 0,
        }
    }

    /// Bytes per pixel, at least one (sub-byte pixels round up).
    pub fn bytes_per_pixel(&self) -> usize {
        (self.colors * self.bits_per_component).div_ceil(8).max(1)
    }

    /// Bytes per decoded row.
    pub fn row_length(&self) -> usize {
        (self.columns * self.colors * self.bits_per_component).div_ceil(8)
    }
}

/// Undo the predictor transform on decompressed data.
pub fn undo(data: Vec<u8>, params: &PredictorParams) -> Result<Vec<u8>, FilterError> {
    match params.predictor {
        1 => Ok(data),
        2 => undo_tiff(data, params),
        10..=15 => undo_png(data, params),
        other => Err(FilterError::Unsupported(format!(
            "predictor {other} is not defined"
        ))),
    }
}

/// TIFF predictor 2: horizontal differencing per component.
fn undo_tiff(mut data: Vec<u8>, params: &PredictorParams) -> Result<Vec<u8>, FilterError> {
    let row_len = params.row_length();
    if row_len == 0 || data.len() % row_len != 0 {
        return Err(FilterError::Corrupt(format!(
            "TIFF predictor data of {} bytes does not divide into {row_len}-byte rows",
            data.len()
        )));
    }

    let bpc = params.bits_per_component;
    let colors = params.colors;
    let comps_per_row = params.columns * colors;

    if bpc == 8 {
        for row in data.chunks_mut(row_len) {
            for i in colors..comps_per_row {
                row[i] = row[i].wrapping_add(row[i - colors]);
            }
        }
        return Ok(data);
    }

    // Sub-byte and 16-bit components: unpack, accumulate, repack.
    let mask = if bpc >= 16 { 0xFFFF } else { (1u16 << bpc) - 1 };
    for row in data.chunks_mut(row_len) {
        let mut comps = unpack_components(row, bpc, comps_per_row);
        for i in colors..comps.len() {
            comps[i] = comps[i].wrapping_add(comps[i - colors]) & mask;
        }
        pack_components(&comps, bpc, row);
    }
    Ok(data)
}

/// PNG predictors: every row is prefixed by its own tag byte and undone
/// independently against the previous decoded row.
fn undo_png(data: Vec<u8>, params: &PredictorParams) -> Result<Vec<u8>, FilterError> {
    let row_len = params.row_length();
    if row_len == 0 || data.len() % (row_len + 1) != 0 {
        return Err(FilterError::Corrupt(format!(
            "PNG predictor data of {} bytes does not divide into {}-byte tagged rows",
            data.len(),
            row_len + 1
        )));
    }

    let bpp = params.bytes_per_pixel();
    let rows = data.len() / (row_len + 1);
    let mut output = vec![0u8; rows * row_len];

    for row_index in 0..rows {
        let tag = data[row_index * (row_len + 1)];
        let encoded = &data[row_index * (row_len + 1) + 1..(row_index + 1) * (row_len + 1)];

        let (previous, current) = if row_index == 0 {
            (None, &mut output[..row_len])
        } else {
            let (before, rest) = output.split_at_mut(row_index * row_len);
            (
                Some(&before[(row_index - 1) * row_len..]),
                &mut rest[..row_len],
            )
        };

        current.copy_from_slice(encoded);
        let up = |previous: &Option<&[u8]>, i: usize| previous.map_or(0, |p| p[i]);

        match tag {
            0 => {}
            1 => {
                for i in bpp..row_len {
                    current[i] = current[i].wrapping_add(current[i - bpp]);
                }
            }
            2 => {
                for i in 0..row_len {
                    current[i] = current[i].wrapping_add(up(&previous, i));
                }
            }
            3 => {
                for i in 0..row_len {
                    let left = if i >= bpp { current[i - bpp] } else { 0 };
                    let above = up(&previous, i);
                    let average = ((left as u16 + above as u16) / 2) as u8;
                    current[i] = current[i].wrapping_add(average);
                }
            }
            4 => {
                for i in 0..row_len {
                    let left = if i >= bpp { current[i - bpp] } else { 0 };
                    let above = up(&previous, i);
                    let upper_left = if i >= bpp { up(&previous, i - bpp) } else { 0 };
                    current[i] = current[i].wrapping_add(paeth(left, above, upper_left));
                }
            }
            other => {
                return Err(FilterError::Corrupt(format!(
                    "PNG row tag {other} in row {row_index}"
                )))
            }
        }
    }

    Ok(output)
}

/// The Paeth predictor from the PNG specification.
fn paeth(left: u8, above: u8, upper_left: u8) -> u8 {
    let p = left as i16 + above as i16 - upper_left as i16;
    let pa = (p - left as i16).abs();
    let pb = (p - above as i16).abs();
    let pc = (p - upper_left as i16).abs();
    if pa <= pb && pa <= pc {
        left
    } else if pb <= pc {
        above
    } else {
        upper_left
    }
}

fn unpack_components(row: &[u8], bpc: usize, count: usize) -> Vec<u16> {
    let mut comps = Vec::with_capacity(count);
    match bpc {
        16 => {
            for pair in row.chunks_exact(2).take(count) {
                comps.push(u16::from_be_bytes([pair[0], pair[1]]));
            }
        }
        _ => {
            let mut bit = 0usize;
            for _ in 0..count {
                let mut value = 0u16;
                for _ in 0..bpc {
                    let byte = row[bit / 8];
                    let shift = 7 - (bit % 8);
                    value = (value << 1) | u16::from((byte >> shift) & 1);
                    bit += 1;
                }
                comps.push(value);
            }
        }
    }
    comps
}

fn pack_components(comps: &[u16], bpc: usize, row: &mut [u8]) {
    match bpc {
        16 => {
            for (pair, comp) in row.chunks_exact_mut(2).zip(comps) {
                pair.copy_from_slice(&comp.to_be_bytes());
            }
        }
        _ => {
            row.fill(0);
            let mut bit = 0usize;
            for &comp in comps {
                for offset in (0..bpc).rev() {
                    if (comp >> offset) & 1 != 0 {
                        row[bit / 8] |= 1 << (7 - (bit % 8));
                    }
                    bit += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::objects::{PdfObject, PdfDictionary};

    fn params(predictor: u8, colors: usize, bpc: usize, columns: usize) -> PredictorParams {
        PredictorParams {
            predictor,
            colors,
            bits_per_component: bpc,
            columns,
            early_change: true,
        }
    }

    #[test]
    fn test_from_dict_defaults() {
        let p = PredictorParams::from_dict(None);
        assert_eq!(p, PredictorParams::default());
    }

    #[test]
    fn test_from_dict_values() {
        let mut dict = PdfDictionary::new();
        dict.insert("Predictor", PdfObject::Integer(12));
        dict.insert("Colors", PdfObject::Integer(3));
        dict.insert("BitsPerComponent", PdfObject::Integer(8));
        dict.insert("Columns", PdfObject::Integer(100));
        dict.insert("EarlyChange", PdfObject::Integer(0));
        let p = PredictorParams::from_dict(Some(&dict));
        assert_eq!(p.predictor, 12);
        assert_eq!(p.colors, 3);
        assert_eq!(p.columns, 100);
        assert!(!p.early_change);
        assert_eq!(p.bytes_per_pixel(), 3);
        assert_eq!(p.row_length(), 300);
    }

    #[test]
    fn test_predictor_one_is_identity() {
        let data = vec![1, 2, 3, 4];
        assert_eq!(undo(data.clone(), &params(1, 1, 8, 4)).unwrap(), data);
    }

    #[test]
    fn test_png_up_rows_accumulate() {
        // Tag 2 on both rows: row N = encoded row N + decoded row N-1.
        let data = vec![
            2, 10, 20, 30, // row 0: previous row is all zero
            2, 1, 2, 3, // row 1
        ];
        let decoded = undo(data, &params(12, 1, 8, 3)).unwrap();
        assert_eq!(decoded, vec![10, 20, 30, 11, 22, 33]);
    }

    #[test]
    fn test_png_sub_row() {
        let data = vec![1, 5, 5, 5];
        let decoded = undo(data, &params(11, 1, 8, 3)).unwrap();
        assert_eq!(decoded, vec![5, 10, 15]);
    }

    #[test]
    fn test_png_none_row() {
        let data = vec![0, 7, 8, 9];
        let decoded = undo(data, &params(10, 1, 8, 3)).unwrap();
        assert_eq!(decoded, vec![7, 8, 9]);
    }

    #[test]
    fn test_png_average_row() {
        // One row, tag 3, bpp 1: out[i] = in[i] + floor(left / 2).
        let data = vec![3, 10, 10, 10];
        let decoded = undo(data, &params(13, 1, 8, 3)).unwrap();
        assert_eq!(decoded, vec![10, 15, 17]);
    }

    #[test]
    fn test_png_paeth_row() {
        // With a zero previous row, Paeth degenerates to left.
        let data = vec![4, 10, 10, 10];
        let decoded = undo(data, &params(15, 1, 8, 3)).unwrap();
        assert_eq!(decoded, vec![10, 20, 30]);
    }

    #[test]
    fn test_png_rows_dispatch_independently() {
        // The "optimum" encoding: each row picks its own algorithm.
        let data = vec![
            0, 1, 2, // none
            1, 3, 3, // sub
            2, 1, 1, // up
        ];
        let decoded = undo(data, &params(12, 1, 8, 2)).unwrap();
        assert_eq!(decoded, vec![1, 2, 3, 6, 4, 7]);
    }

    #[test]
    fn test_png_multi_byte_pixels() {
        // RGB pixels: sub references the byte three positions back.
        let data = vec![1, 10, 20, 30, 1, 1, 1];
        let decoded = undo(data, &params(12, 3, 8, 2)).unwrap();
        assert_eq!(decoded, vec![10, 20, 30, 11, 21, 31]);
    }

    #[test]
    fn test_png_bad_tag_is_corrupt() {
        let data = vec![9, 1, 2, 3];
        assert!(matches!(
            undo(data, &params(12, 1, 8, 3)),
            Err(FilterError::Corrupt(_))
        ));
    }

    #[test]
    fn test_png_misaligned_data_is_corrupt() {
        let data = vec![2, 1, 2];
        assert!(matches!(
            undo(data, &params(12, 1, 8, 3)),
            Err(FilterError::Corrupt(_))
        ));
    }

    #[test]
    fn test_tiff_eight_bit() {
        // Two rows of three gray pixels, deltas of 1.
        let data = vec![5, 1, 1, 7, 1, 1];
        let decoded = undo(data, &params(2, 1, 8, 3)).unwrap();
        assert_eq!(decoded, vec![5, 6, 7, 7, 8, 9]);
    }

    #[test]
    fn test_tiff_components_track_their_channel() {
        // RGB: each channel accumulates separately.
        let data = vec![10, 20, 30, 1, 2, 3];
        let decoded = undo(data, &params(2, 3, 8, 2)).unwrap();
        assert_eq!(decoded, vec![10, 20, 30, 11, 22, 33]);
    }

    #[test]
    fn test_tiff_four_bit_components() {
        // Columns=4, bpc=4: one row is two bytes holding four nibbles.
        // Encoded nibbles 3,1,1,1 accumulate to 3,4,5,6.
        let data = vec![0x31, 0x11];
        let decoded = undo(data, &params(2, 1, 4, 4)).unwrap();
        assert_eq!(decoded, vec![0x34, 0x56]);
    }

    #[test]
    fn test_tiff_sixteen_bit_components() {
        // One row, two 16-bit components: 0x0102 then +0x0001.
        let data = vec![0x01, 0x02, 0x00, 0x01];
        let decoded = undo(data, &params(2, 1, 16, 2)).unwrap();
        assert_eq!(decoded, vec![0x01, 0x02, 0x01, 0x03]);
    }

    #[test]
    fn test_unknown_predictor_rejected() {
        assert!(matches!(
            undo(vec![0; 4], &params(7, 1, 8, 4)),
            Err(FilterError::Unsupported(_))
        ));
    }
}
