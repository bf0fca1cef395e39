//! File entries -> catalog resources

use crate::lookup::{LookupTables, OTHER_FORMAT};
use crate::schema::{FileEntry, LANGUAGE, ResourceEntry};

const KIB: f64 = 1024.0;
const MIB: f64 = 1_048_576.0;
const GIB: f64 = 1_073_741_824.0;

/// Why a record's resource list could not be built
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// English and French file lists differ in length
    LengthMismatch { en: usize, fr: usize },
    MissingSize { index: usize },
    InvalidSize { index: usize, size: String },
    MissingLink { index: usize },
}

impl std::fmt::Display for ResourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LengthMismatch { en, fr } => {
                write!(f, "{en} English files but {fr} French files")
            }
            Self::MissingSize { index } => write!(f, "file {index} has no size"),
            Self::InvalidSize { index, size } => {
                write!(f, "file {index} has unreadable size {size:?}")
            }
            Self::MissingLink { index } => write!(f, "file {index} has no link"),
        }
    }
}

impl std::error::Error for ResourceError {}

/// Parse `"<number> <unit>"` into bytes, rounded to the nearest 10.
///
/// KB/MB/GB are binary multiples. Any other unit yields 0; a malformed number
/// under a known unit is `None`.
pub fn parse_size(size: &str) -> Option<u64> {
    let mut parts = size.split_whitespace();
    let number = parts.next()?;
    let multiplier = match parts.next() {
        Some("KB") => KIB,
        Some("MB") => MIB,
        Some("GB") => GIB,
        _ => return Some(0),
    };
    let value: f64 = number.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(((value * multiplier / 10.0).round() * 10.0) as u64)
}

/// Pair English and French file lists by position into resources.
///
/// Any malformed entry voids the whole list.
pub fn build_resources(
    en: &[FileEntry],
    fr: &[FileEntry],
    tables: &LookupTables,
) -> Result<Vec<ResourceEntry>, ResourceError> {
    // Upstream carries no key shared by both variants; position is all we have.
    if en.len() != fr.len() {
        return Err(ResourceError::LengthMismatch {
            en: en.len(),
            fr: fr.len(),
        });
    }

    en.iter()
        .zip(fr)
        .enumerate()
        .map(|(index, (file_en, file_fr))| {
            let raw_size = file_en
                .size
                .as_deref()
                .ok_or(ResourceError::MissingSize { index })?;
            let size = parse_size(raw_size).ok_or_else(|| ResourceError::InvalidSize {
                index,
                size: raw_size.to_string(),
            })?;
            let url = file_en
                .link
                .clone()
                .filter(|l| !l.is_empty())
                .ok_or(ResourceError::MissingLink { index })?;
            let format = file_en
                .file_type
                .as_deref()
                .map_or(OTHER_FORMAT, |t| tables.format_key(t));

            Ok(ResourceEntry {
                name: file_en.description.clone().unwrap_or_default(),
                name_fra: file_fr.description.clone().unwrap_or_default(),
                url,
                size,
                format: format.to_string(),
                language: LANGUAGE,
            })
        })
        .collect()
}
