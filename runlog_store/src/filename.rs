use chrono::NaiveDate;
use thiserror::Error;

/// Suffix every uploaded telemetry CSV carries.
pub const TELEMETRY_SUFFIX: &str = "_PQR.csv";
/// Replacement suffix naming the binary companion of a telemetry file.
pub const DATA_SUFFIX: &str = ".MF4";
/// Replacement suffix naming the rendered route map.
pub const MAP_SUFFIX: &str = "_Map.html";

const FORBIDDEN_CHARS: &[char] = &['<', '>', '"', '\'', '&'];
const VIN_RANGE: std::ops::Range<usize> = 0..6;
const DATE_RANGE: std::ops::Range<usize> = 7..17;
const DATE_FORMAT: &str = "%Y_%m_%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FilenameError {
    #[error("Invalid filename: forbidden characters")]
    InvalidCharacters,
    #[error("Invalid filename")]
    InvalidFormat,
    #[error("Invalid VIN")]
    InvalidVin,
    #[error("Invalid date")]
    InvalidDate,
}

impl FilenameError {
    /// Every rejection is a client error; a malformed key never becomes
    /// valid on redelivery.
    pub fn status_code(&self) -> u16 {
        400
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FilenameError::InvalidCharacters => "InvalidCharacters",
            FilenameError::InvalidFormat => "InvalidFormat",
            FilenameError::InvalidVin => "InvalidVin",
            FilenameError::InvalidDate => "InvalidDate",
        }
    }
}

/// A validated telemetry object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryFilename {
    pub vin: String,
    pub date: NaiveDate,
    pub filename: String,
    pub data_filename: String,
}

impl TelemetryFilename {
    /// Validates an uploaded object key of the form
    /// `E9####_YYYY_MM_DD_PQR.csv`.
    pub fn parse(key: &str) -> Result<TelemetryFilename, FilenameError> {
        if key.contains(FORBIDDEN_CHARS) {
            return Err(FilenameError::InvalidCharacters);
        }
        if key.is_empty() || !key.chars().all(is_filename_char) {
            return Err(FilenameError::InvalidFormat);
        }

        // Only ASCII survives the checks above, so byte slicing is safe.
        let vin = key.get(VIN_RANGE).ok_or(FilenameError::InvalidVin)?;
        if !is_vin(vin) {
            return Err(FilenameError::InvalidVin);
        }

        let date = key.get(DATE_RANGE).ok_or(FilenameError::InvalidDate)?;
        if !is_date_field(date) {
            return Err(FilenameError::InvalidDate);
        }
        let date = NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|_| FilenameError::InvalidDate)?;

        Ok(TelemetryFilename {
            vin: vin.to_string(),
            date,
            filename: key.to_string(),
            data_filename: data_filename_for(key),
        })
    }
}

pub fn data_filename_for(filename: &str) -> String {
    filename.replace(TELEMETRY_SUFFIX, DATA_SUFFIX)
}

pub fn map_key_for(filename: &str) -> String {
    filename.replace(TELEMETRY_SUFFIX, MAP_SUFFIX)
}

fn is_filename_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// `E9` followed by four digits; the leading letter may be lower case.
pub fn is_vin(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    bytes.len() == 6
        && bytes[0].eq_ignore_ascii_case(&b'E')
        && bytes[1] == b'9'
        && bytes[2..].iter().all(u8::is_ascii_digit)
}

fn is_date_field(field: &str) -> bool {
    let bytes = field.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'_',
            _ => b.is_ascii_digit(),
        })
}
