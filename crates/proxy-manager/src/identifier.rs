//! Identifier utilities: build-suffixed and unique identifiers, name validation.

use std::sync::OnceLock;

use crate::version::BuildFingerprint;

/// Replacement base for names that are not valid identifiers.
pub const DEFAULT_IDENTIFIER: &str = "g";

/// Number of digest characters appended by [`IdentifierSuffixer`].
pub const SUFFIX_LENGTH: usize = 5;

/// Namespace separator of class paths.
pub const NAMESPACE_SEPARATOR: char = '\\';

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c as u32 >= 0x7f
}

fn is_identifier_char(c: char) -> bool {
    is_identifier_start(c) || c.is_ascii_digit()
}

/// Whether `name` is a valid suffixable identifier: a letter, underscore or
/// non-ASCII character followed by at least one identifier character.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_identifier_start(c) => {}
        _ => return false,
    }
    let mut rest = 0usize;
    for c in chars {
        if !is_identifier_char(c) {
            return false;
        }
        rest += 1;
    }
    rest > 0
}

/// Whether `name` is a valid class path (`Segment\Segment\...`), tolerating a
/// single leading separator. Single-character segments are allowed.
pub fn is_valid_class_name(name: &str) -> bool {
    let name = name.strip_prefix(NAMESPACE_SEPARATOR).unwrap_or(name);
    !name.is_empty()
        && name.split(NAMESPACE_SEPARATOR).all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if is_identifier_start(c)) && chars.all(is_identifier_char)
        })
}

/// Derives identifiers that are stable within one build and differ across builds.
///
/// `get_identifier(name)` is `name` (or [`DEFAULT_IDENTIFIER`] when `name` is not
/// a valid identifier) followed by the first [`SUFFIX_LENGTH`] hex characters of
/// `blake3(name ++ salt)`, where `salt` is the hex digest of the build fingerprint.
pub struct IdentifierSuffixer;

impl IdentifierSuffixer {
    pub fn get_identifier(name: &str) -> String {
        static SALT: OnceLock<String> = OnceLock::new();
        let salt = SALT.get_or_init(|| BuildFingerprint::current().digest());
        suffixed(name, salt)
    }

    /// Same derivation against an explicit fingerprint.
    pub fn with_fingerprint(name: &str, fingerprint: &BuildFingerprint) -> String {
        suffixed(name, &fingerprint.digest())
    }

    /// The suffix alone, for a given salt.
    pub fn suffix(name: &str, salt: &str) -> String {
        let digest = blake3::hash(format!("{}{}", name, salt).as_bytes()).to_hex();
        digest.as_str()[..SUFFIX_LENGTH].to_string()
    }
}

fn suffixed(name: &str, salt: &str) -> String {
    let suffix = IdentifierSuffixer::suffix(name, salt);
    if is_valid_identifier(name) {
        format!("{}{}", name, suffix)
    } else {
        format!("{}{}", DEFAULT_IDENTIFIER, suffix)
    }
}

/// Produces a fresh identifier on every call.
pub struct UniqueIdentifierGenerator;

impl UniqueIdentifierGenerator {
    pub fn get_identifier(name: &str) -> String {
        let base = if is_valid_identifier(name) {
            name
        } else {
            DEFAULT_IDENTIFIER
        };
        format!("{}{}", base, uuid::Uuid::new_v4().simple())
    }
}
