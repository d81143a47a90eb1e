//! Element id convention of the catalog admin page
//!
//! Fields are addressed as `product_<name>` and buttons as `<label>-btn`, both
//! lowercased with spaces turned into underscores.

/// Prefix shared by every form field id
pub const ID_PREFIX: &str = "product_";

/// Container the search results are rendered into
pub const RESULTS_ID: &str = "product-list";

/// Container holding the status message of the last action
pub const MESSAGE_ID: &str = "flash_message";

/// Id of the search button, pressed by the search shortcut steps
pub const SEARCH_BUTTON_ID: &str = "search-btn";

fn normalize(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "_")
}

/// `"Name"` → `product_name`, `"Long Name"` → `product_long_name`
pub fn element_id(field_name: &str) -> String {
    format!("{}{}", ID_PREFIX, normalize(field_name))
}

/// `"Search"` → `search-btn`
pub fn button_id(label: &str) -> String {
    format!("{}-btn", normalize(label))
}
