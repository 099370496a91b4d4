//! Encode/decode parameter limits and input validation.
//!
//! The limits mirror the conversion service's request schema so that bad
//! input is rejected before a network round trip.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Smallest pixel-block size accepted by the encoder.
pub const MIN_BLOCK_SIZE: u32 = 1;

/// Largest pixel-block size accepted by the encoder.
pub const MAX_BLOCK_SIZE: u32 = 16;

/// Block size used when none is configured.
pub const DEFAULT_BLOCK_SIZE: u32 = 1;

/// Smallest decode scale factor.
pub const MIN_SCALE: u32 = 1;

/// Largest decode scale factor.
pub const MAX_SCALE: u32 = 20;

/// Scale used for previews when none is configured.
pub const DEFAULT_SCALE: u32 = 10;

/// Opening of the markup document's root element.
pub const MARKUP_ROOT_TAG: &str = "<pxvg";

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate an encoder block size against
/// [`MIN_BLOCK_SIZE`]..=[`MAX_BLOCK_SIZE`].
pub fn validate_block_size(block_size: u32) -> Result<(), CoreError> {
    if (MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&block_size) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Block size {block_size} must be between {MIN_BLOCK_SIZE} and {MAX_BLOCK_SIZE}"
        )))
    }
}

/// Validate a decode scale against [`MIN_SCALE`]..=[`MAX_SCALE`].
pub fn validate_scale(scale: u32) -> Result<(), CoreError> {
    if (MIN_SCALE..=MAX_SCALE).contains(&scale) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Scale {scale} must be between {MIN_SCALE} and {MAX_SCALE}"
        )))
    }
}

/// Validate that a markup code is non-blank and carries the root element.
///
/// The tag check is case-insensitive. Nothing else about the document is
/// inspected; the grammar belongs to the conversion service.
pub fn validate_markup(code: &str) -> Result<(), CoreError> {
    if code.trim().is_empty() {
        return Err(CoreError::Validation(
            "Markup code must not be empty".to_string(),
        ));
    }
    if !code.to_ascii_lowercase().contains(MARKUP_ROOT_TAG) {
        return Err(CoreError::Validation(format!(
            "Invalid markup: missing {MARKUP_ROOT_TAG}> root element"
        )));
    }
    Ok(())
}

/// Validate a natural-language edit instruction: must not be blank.
pub fn validate_instruction(instruction: &str) -> Result<(), CoreError> {
    if instruction.trim().is_empty() {
        Err(CoreError::Validation(
            "Edit instruction must not be empty".to_string(),
        ))
    } else {
        Ok(())
    }
}
