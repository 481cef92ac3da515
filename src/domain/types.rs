use serde::Deserialize;

/// Listing sort order requested by the caller.
///
/// `Unsorted` and `Price` share the price index on the warm path; the backing
/// store resolves `Unsorted` to insertion (id) order on the cold path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Unsorted,
    Price,
    Title,
}
