//! School name lookup.
//!
//! The report template reserves a fixed block for the school name. The
//! name is the first line of that block.

use monthly_report_extract_models::UNKNOWN_SCHOOL;
use monthly_report_pdf::Block;

use crate::NAME_BLOCK_INDEX;

/// Returns the school name from the template's name block, or
/// [`UNKNOWN_SCHOOL`] if the layout is too short or the block is empty.
#[must_use]
pub fn locate(blocks: &[Block]) -> String {
    locate_at(blocks, NAME_BLOCK_INDEX)
}

/// Like [`locate`] with an explicit block index.
#[must_use]
pub fn locate_at(blocks: &[Block], block_index: usize) -> String {
    let Some(block) = blocks.get(block_index) else {
        log::debug!(
            "Layout has {} block(s), name block {block_index} is missing",
            blocks.len()
        );
        return UNKNOWN_SCHOOL.to_owned();
    };

    let name = block
        .lines
        .first()
        .map(monthly_report_pdf::Line::text)
        .unwrap_or_default();
    let name = name.trim();

    if name.is_empty() {
        log::debug!("Name block {block_index} has no text");
        return UNKNOWN_SCHOOL.to_owned();
    }

    name.to_owned()
}
