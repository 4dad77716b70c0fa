//! Completion codes for session certificates.
//!
//! A completed session can be summarized as a short validation code that the
//! external certificate renderer prints alongside the QR/PDF output. The code
//! carries the technique, the rounded final score and the completion date,
//! guarded by a plain mod-97 checksum. This is a transcription check, not a
//! cryptographic integrity measure.

use crate::{technique::Technique, Error, Result};

/// Code layout: `WT-<TAG><SCORE>-<YYYYMMDD>-<CHK>` where TAG is the 3-letter
/// technique tag, SCORE a zero-padded integer in 0-100, CHK the mod-97
/// checksum of the payload between prefix and checksum.
const CODE_PREFIX: &str = "WT";
const CHECKSUM_MODULUS: u32 = 97;

/// Parsed contents of a completion code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCode {
    pub technique: Technique,
    /// Final score rounded to the nearest integer
    pub score: u8,
    /// Completion date as YYYYMMDD
    pub date: String,
}

/// Encode a completed session into a validation code.
///
/// `date` must be an 8-digit YYYYMMDD string supplied by the caller; the
/// engine reads no clock of its own.
pub fn encode(technique: Technique, score: f64, date: &str) -> Result<String> {
    if !score.is_finite() || !(0.0..=100.0).contains(&score) {
        return Err(Error::InvalidInput(format!(
            "score must be within 0-100, got {score}"
        )));
    }
    validate_date(date)?;

    let rounded = score.round() as u8;
    let payload = format!("{}{:03}-{}", technique.tag(), rounded, date);
    let checksum = checksum(&payload);

    Ok(format!("{CODE_PREFIX}-{payload}-{checksum:02}"))
}

/// Parse and verify a validation code back into its contents
pub fn parse(code: &str) -> Result<CompletionCode> {
    let rest = code
        .strip_prefix(CODE_PREFIX)
        .and_then(|r| r.strip_prefix('-'))
        .ok_or_else(|| Error::InvalidInput(format!("missing {CODE_PREFIX} prefix: {code}")))?;

    let (payload, check_str) = rest
        .rsplit_once('-')
        .ok_or_else(|| Error::InvalidInput(format!("missing checksum: {code}")))?;

    let claimed: u32 = check_str
        .parse()
        .map_err(|_| Error::InvalidInput(format!("malformed checksum: {code}")))?;
    if claimed != checksum(payload) {
        return Err(Error::InvalidInput(format!("checksum mismatch: {code}")));
    }

    let (body, date) = payload
        .split_once('-')
        .ok_or_else(|| Error::InvalidInput(format!("missing date field: {code}")))?;
    validate_date(date)?;

    if body.len() != 6 || !body.is_ascii() {
        return Err(Error::InvalidInput(format!("malformed body: {code}")));
    }
    let technique = Technique::from_tag(&body[..3])?;
    let score: u8 = body[3..]
        .parse()
        .map_err(|_| Error::InvalidInput(format!("malformed score: {code}")))?;
    if score > 100 {
        return Err(Error::InvalidInput(format!("score out of range: {code}")));
    }

    Ok(CompletionCode {
        technique,
        score,
        date: date.to_string(),
    })
}

fn validate_date(date: &str) -> Result<()> {
    if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidInput(format!(
            "date must be 8 digits (YYYYMMDD), got {date:?}"
        )));
    }
    Ok(())
}

fn checksum(payload: &str) -> u32 {
    payload.bytes().map(u32::from).sum::<u32>() % CHECKSUM_MODULUS
}
