//! BPF filter builders for 802.11 captures
//!
//! These expressions only compile on 802.11 or radiotap link types.

/// All management frames
pub fn management_filter() -> String {
    "type mgt".to_string()
}

/// All data frames
pub fn data_filter() -> String {
    "type data".to_string()
}

/// Everything the analyzer looks at; control frames are dropped in the kernel
pub fn analyzer_filter() -> String {
    combine_filters_or(&[&management_filter(), &data_filter()])
}

/// Combine multiple filters with OR logic
pub fn combine_filters_or(filters: &[&str]) -> String {
    filters
        .iter()
        .map(|f| format!("({})", f))
        .collect::<Vec<_>>()
        .join(" or ")
}
