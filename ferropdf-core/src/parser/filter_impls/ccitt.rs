//! CCITT Group 3/4 fax parameters (ISO 32000-1 Section 7.4.6)
//!
//! Parameter parsing is complete; the decoder itself is inert and emits a
//! zero-filled raster of the declared geometry. Real T.4/T.6 decoding is
//! deliberately left out of this port until there is demand for it.

use crate::parser::filters::FilterError;
use crate::parser::objects::PdfDictionary;

/// `/K` selects the coding scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcittScheme {
    /// K < 0: pure two-dimensional (Group 4).
    Group4,
    /// K = 0: pure one-dimensional (Group 3, 1-D).
    Group3OneDimensional,
    /// K > 0: mixed one- and two-dimensional (Group 3, 2-D).
    Group3TwoDimensional,
}

/// Parameters from `/DecodeParms`.
#[derive(Debug, Clone, PartialEq)]
pub struct CcittParams {
    pub scheme: CcittScheme,
    pub columns: usize,
    pub rows: usize,
    pub encoded_byte_align: bool,
    pub black_is_1: bool,
}

impl Default for CcittParams {
    fn default() -> Self {
        Self {
            scheme: CcittScheme::Group3OneDimensional,
            columns: 1728,
            rows: 0,
            encoded_byte_align: false,
            black_is_1: false,
        }
    }
}

impl CcittParams {
    pub fn from_dict(dict: Option<&PdfDictionary>) -> Self {
        let defaults = Self::default();
        let dict = match dict {
            Some(dict) => dict,
            None => return defaults,
        };

        let k = dict.get("K").and_then(|o| o.as_integer()).unwrap_or(0);
        let scheme = match k {
            k if k < 0 => CcittScheme::Group4,
            0 => CcittScheme::Group3OneDimensional,
            _ => CcittScheme::Group3TwoDimensional,
        };

        Self {
            scheme,
            columns: dict
                .get("Columns")
                .and_then(|o| o.as_integer())
                .and_then(|n| usize::try_from(n).ok())
                .filter(|&n| n > 0)
                .unwrap_or(defaults.columns),
            rows: dict
                .get("Rows")
                .and_then(|o| o.as_integer())
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(0),
            encoded_byte_align: dict
                .get("EncodedByteAlign")
                .and_then(|o| o.as_bool())
                .unwrap_or(false),
            black_is_1: dict
                .get("BlackIs1")
                .and_then(|o| o.as_bool())
                .unwrap_or(false),
        }
    }

    /// Bytes per output row at one bit per pixel.
    pub fn row_bytes(&self) -> usize {
        self.columns.div_ceil(8)
    }
}

/// Inert decode: the declared raster geometry filled with zero bytes.
pub fn decode(_data: &[u8], params_dict: Option<&PdfDictionary>) -> Result<Vec<u8>, FilterError> {
    let params = CcittParams::from_dict(params_dict);
    if params.rows == 0 {
        return Err(FilterError::Unsupported(
            "CCITT decode without /Rows".to_string(),
        ));
    }
    tracing::debug!(
        columns = params.columns,
        rows = params.rows,
        "CCITT decode is inert, emitting blank raster"
    );
    Ok(vec![0u8; params.row_bytes() * params.rows])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::objects::PdfObject;

    #[test]
    fn test_default_params() {
        let p = CcittParams::from_dict(None);
        assert_eq!(p.scheme, CcittScheme::Group3OneDimensional);
        assert_eq!(p.columns, 1728);
        assert_eq!(p.row_bytes(), 216);
    }

    #[test]
    fn test_scheme_from_k() {
        let mut dict = PdfDictionary::new();
        dict.insert("K", PdfObject::Integer(-1));
        assert_eq!(
            CcittParams::from_dict(Some(&dict)).scheme,
            CcittScheme::Group4
        );

        dict.insert("K", PdfObject::Integer(4));
        assert_eq!(
            CcittParams::from_dict(Some(&dict)).scheme,
            CcittScheme::Group3TwoDimensional
        );
    }

    #[test]
    fn test_blank_raster_output() {
        let mut dict = PdfDictionary::new();
        dict.insert("Columns", PdfObject::Integer(16));
        dict.insert("Rows", PdfObject::Integer(4));
        let out = decode(b"whatever", Some(&dict)).unwrap();
        assert_eq!(out.len(), 2 * 4);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_missing_rows_unsupported() {
        let mut dict = PdfDictionary::new();
        dict.insert("Columns", PdfObject::Integer(16));
        assert!(matches!(
            decode(b"x", Some(&dict)),
            Err(FilterError::Unsupported(_))
        ));
    }
}
