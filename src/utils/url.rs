//! URL utilities for consistent URL handling
//!
//! This module provides utilities for normalizing URLs to prevent issues
//! with trailing slashes when constructing backend endpoints.

/// Normalize a base URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use textwo::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://api.textwo.app/api/users"), "https://api.textwo.app/api/users");
/// assert_eq!(normalize_base_url("https://api.textwo.app/api/users/"), "https://api.textwo.app/api/users");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Construct a complete endpoint URL from a base URL and a path segment,
/// ensuring there are no double slashes in the result.
///
/// # Examples
///
/// ```
/// use textwo::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.textwo.app/api/users", "u1"),
///     "https://api.textwo.app/api/users/u1"
/// );
/// assert_eq!(
///     construct_api_url("https://api.textwo.app/api/users/", "/u1"),
///     "https://api.textwo.app/api/users/u1"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}
