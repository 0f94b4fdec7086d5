use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt::Write;
use thiserror::Error;

/// Characters a rendered name may not contain: path separators, and the
/// names log field separator.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', ':', '\0'];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MaskError {
    #[error("the mask is empty")]
    Empty,
    #[error("unsupported strftime directive in {0:?}")]
    InvalidDirective(String),
    #[error("{mask:?} would produce a name containing {ch:?}")]
    ForbiddenChar { mask: String, ch: char },
}

pub fn validate_mask(mask: &str) -> Result<(), MaskError> {
    if mask.is_empty() {
        return Err(MaskError::Empty);
    }
    if StrftimeItems::new(mask).any(|item| matches!(item, Item::Error)) {
        return Err(MaskError::InvalidDirective(mask.to_string()));
    }
    let sample = NaiveDate::from_ymd_opt(2001, 12, 31)
        .and_then(|d| d.and_hms_opt(23, 59, 58))
        .ok_or_else(|| MaskError::InvalidDirective(mask.to_string()))?;
    let rendered = render_mask(mask, &sample)?;
    if rendered.is_empty() {
        return Err(MaskError::Empty);
    }
    Ok(())
}

pub fn render_mask(mask: &str, timestamp: &NaiveDateTime) -> Result<String, MaskError> {
    let mut out = String::new();
    write!(out, "{}", timestamp.format_with_items(StrftimeItems::new(mask)))
        .map_err(|_| MaskError::InvalidDirective(mask.to_string()))?;
    if let Some(ch) = out.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(MaskError::ForbiddenChar {
            mask: mask.to_string(),
            ch,
        });
    }
    Ok(out)
}

pub fn validate_extension(ext: &str) -> Result<(), MaskError> {
    if ext.is_empty() {
        return Ok(());
    }
    if !ext.starts_with('.') {
        return Err(MaskError::InvalidDirective(ext.to_string()));
    }
    if let Some(ch) = ext.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(MaskError::ForbiddenChar {
            mask: ext.to_string(),
            ch,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 8, 29)
            .and_then(|d| d.and_hms_opt(15, 24, 20))
            .expect("valid date")
    }

    #[test]
    fn default_mask_renders_compact_timestamp() {
        let rendered = render_mask("%Y%m%d_%H%M%S", &timestamp()).expect("must render");
        assert_eq!(rendered, "20180829_152420");
    }

    #[test]
    fn validate_rejects_empty_mask() {
        assert_eq!(validate_mask(""), Err(MaskError::Empty));
    }

    #[test]
    fn validate_rejects_unknown_directive() {
        let err = validate_mask("%Y%Q").expect_err("must fail");
        assert!(matches!(err, MaskError::InvalidDirective(_)));
    }

    #[test]
    fn validate_rejects_timezone_directive_on_naive_time() {
        let err = validate_mask("%Y%m%d%z").expect_err("must fail");
        assert!(matches!(err, MaskError::InvalidDirective(_)));
    }

    #[test]
    fn validate_rejects_separators_in_output() {
        let err = validate_mask("%D").expect_err("slash must be rejected");
        assert_eq!(
            err,
            MaskError::ForbiddenChar {
                mask: "%D".to_string(),
                ch: '/'
            }
        );
        let err = validate_mask("%H:%M").expect_err("colon must be rejected");
        assert!(matches!(err, MaskError::ForbiddenChar { ch: ':', .. }));
    }

    #[test]
    fn extension_must_start_with_dot() {
        assert!(validate_extension(".jpg").is_ok());
        assert!(validate_extension("").is_ok());
        assert!(validate_extension("jpg").is_err());
    }
}
