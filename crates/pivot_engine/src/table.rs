//! Flat table paging

use contracts::{ContractError, NormalizedRow, TablePage};

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: usize = 500;

/// Slice one page (1-based) out of the joined rows
///
/// Pages past the end are valid and come back empty.
///
/// # Errors
/// `ConfigValidation` if `page` is 0 or `page_size` is outside `1..=500`
pub fn paginate(
    rows: &[NormalizedRow],
    page: usize,
    page_size: usize,
) -> Result<TablePage, ContractError> {
    if page == 0 {
        return Err(ContractError::config_validation("page", "page must be >= 1"));
    }
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ContractError::config_validation(
            "page_size",
            format!("page_size must be in 1..={MAX_PAGE_SIZE}, got {page_size}"),
        ));
    }

    let total_rows = rows.len();
    let start = (page - 1).saturating_mul(page_size).min(total_rows);
    let end = start.saturating_add(page_size).min(total_rows);

    Ok(TablePage {
        page,
        page_size,
        total_rows,
        total_pages: total_rows.div_ceil(page_size),
        rows: rows[start..end].to_vec(),
    })
}
