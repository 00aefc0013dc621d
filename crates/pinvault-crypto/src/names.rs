//! Filename suffix handling for encrypted files
//!
//! `report.pdf` → `report.pdf.encrypted` → `report.pdf`

use crate::ENCRYPTED_SUFFIX;

/// Returns true if the name ends with `.encrypted`.
pub fn is_encrypted_name(name: &str) -> bool {
    name.ends_with(ENCRYPTED_SUFFIX)
}

/// Convert a plaintext filename to its envelope name by appending `.encrypted`.
///
/// `main.go` → `main.go.encrypted`
pub fn rename_for_encryption(name: &str) -> String {
    format!("{name}{ENCRYPTED_SUFFIX}")
}

/// Convert an envelope name back by stripping one trailing `.encrypted`.
///
/// Names without the suffix come back unchanged, and an occurrence in the
/// middle of the name is left alone:
/// `a.encrypted.txt` → `a.encrypted.txt`, `a.encrypted.encrypted` → `a.encrypted`
pub fn rename_for_decryption(name: &str) -> String {
    name.strip_suffix(ENCRYPTED_SUFFIX)
        .unwrap_or(name)
        .to_string()
}
