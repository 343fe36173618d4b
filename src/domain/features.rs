//! Feature extraction from raw site-creation request parameters
//!
//! The provisioner forwards the original request parameter map untouched;
//! the repository list travels in a single URL-encoded JSON parameter.

use std::collections::HashMap;

use super::deploy::RepoDescriptor;

/// Request parameter carrying the URL-encoded JSON repository array
pub const REPOS_PARAM: &str = "jn_pr_repos";

/// Extract the repository list from a raw request parameter map.
///
/// Returns `None` when the parameter is absent or does not decode to a
/// well-formed descriptor array. Never fails: malformed input is silently
/// dropped and surfaces as an empty deployment run, matching the lenient
/// contract of the request surface.
pub fn extract_repos(params: &HashMap<String, String>) -> Option<Vec<RepoDescriptor>> {
    let raw = params.get(REPOS_PARAM)?;
    let decoded = urlencoding::decode(raw).ok()?;
    serde_json::from_str(&decoded).ok()
}
