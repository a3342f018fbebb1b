pub mod bitwarden;
pub mod github;

// TOML basic strings share their escape syntax with JSON strings for the
// characters that can occur here, so serde_json produces the quoting.
pub(crate) fn toml_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
