//! Name and path validation for tree entities.
//!
//! A name is a single path segment. It must be non-empty, no longer than the
//! configured maximum, free of `/`, `*` and control characters, and not `.`
//! or `..`. Docs and files at the top level additionally may not use
//! JavaScript object property names, which downstream consumers treat
//! specially.

use projtree_core::config::ProjectLimitsConfig;
use projtree_core::error::AppError;
use projtree_core::result::AppResult;
use projtree_entity::{EntityType, Folder};

/// Names rejected for top-level docs and files.
pub const BLOCKED_FILENAMES: &[&str] = &[
    "prototype",
    "constructor",
    "toString",
    "toLocaleString",
    "valueOf",
    "hasOwnProperty",
    "isPrototypeOf",
    "propertyIsEnumerable",
    "__defineGetter__",
    "__lookupGetter__",
    "__defineSetter__",
    "__lookupSetter__",
    "__proto__",
];

/// Whether `c` may never appear in a name.
pub fn is_bad_char(c: char) -> bool {
    matches!(c, '/' | '*' | '\u{0000}'..='\u{001F}' | '\u{007F}' | '\u{0080}'..='\u{009F}')
}

/// Whether `name` is one of the reserved top-level names.
pub fn is_blocked_filename(name: &str) -> bool {
    BLOCKED_FILENAMES.contains(&name)
}

/// Turn an arbitrary string into a legal name.
///
/// Bad characters become `_`, and `.` and `..` become `_` and `__`. Length
/// is not adjusted, and an empty input stays empty.
pub fn clean(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if is_bad_char(c) { '_' } else { c })
        .collect();

    match cleaned.as_str() {
        "." => "_".to_string(),
        ".." => "__".to_string(),
        _ => cleaned,
    }
}

/// [`clean`] a name for an entity of `entity_type`, prefixing blocked names
/// with `@` when the entity is a doc or file directly in the root folder.
pub fn clean_element_name(name: &str, entity_type: EntityType, top_level: bool) -> String {
    let cleaned = clean(name);
    if top_level && entity_type != EntityType::Folder && is_blocked_filename(&cleaned) {
        return format!("@{cleaned}");
    }
    cleaned
}

/// Fail with `DuplicateName` if any child of `folder` is named `name`.
pub fn ensure_unique(folder: &Folder, name: &str) -> AppResult<()> {
    if folder.has_child_named(name) {
        return Err(AppError::duplicate_name("file already exists"));
    }
    Ok(())
}

/// Length-aware name validator.
#[derive(Debug, Clone, Copy)]
pub struct NameValidator {
    max_length: usize,
}

impl NameValidator {
    /// Create a validator with an explicit maximum length.
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    /// Create a validator from the project limits.
    pub fn from_config(config: &ProjectLimitsConfig) -> Self {
        Self::new(config.max_path_length)
    }

    /// Maximum allowed length in characters.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Whether `s` has between 1 and the maximum number of characters.
    pub fn is_allowed_length(&self, s: &str) -> bool {
        let len = s.chars().count();
        len > 0 && len <= self.max_length
    }

    /// Whether `name` is a legal single path segment.
    pub fn is_clean_filename(&self, name: &str) -> bool {
        self.is_allowed_length(name)
            && !name.chars().any(is_bad_char)
            && name != "."
            && name != ".."
    }

    /// Whether every segment of `path` is a legal name and the whole path
    /// fits the length limit. Leading, trailing and doubled slashes are
    /// ignored.
    pub fn is_clean_path(&self, path: &str) -> bool {
        if !self.is_allowed_length(path) {
            return false;
        }
        let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
        if segments.peek().is_none() {
            return false;
        }
        segments.all(|segment| self.is_clean_filename(segment))
    }

    /// Fail with `InvalidName` unless `name` is a legal name.
    pub fn validate(&self, name: &str) -> AppResult<()> {
        if !self.is_clean_filename(name) {
            return Err(AppError::invalid_name("invalid element name"));
        }
        Ok(())
    }

    /// Fail with `InvalidName` unless `path` is a legal path.
    pub fn validate_path(&self, path: &str) -> AppResult<()> {
        if !self.is_clean_path(path) {
            return Err(AppError::invalid_name("invalid path"));
        }
        Ok(())
    }
}

impl Default for NameValidator {
    fn default() -> Self {
        Self::from_config(&ProjectLimitsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projtree_core::ErrorKind;
    use projtree_entity::Doc;

    #[test]
    fn test_clean_filenames() {
        let v = NameValidator::default();
        assert!(v.is_clean_filename("main.tex"));
        assert!(v.is_clean_filename("a file with spaces (1).png"));
        assert!(v.is_clean_filename("\u{00e9}t\u{00e9}.tex"));
        assert!(!v.is_clean_filename(""));
        assert!(!v.is_clean_filename("."));
        assert!(!v.is_clean_filename(".."));
        assert!(!v.is_clean_filename("a/b"));
        assert!(!v.is_clean_filename("A*.png"));
        assert!(!v.is_clean_filename("tab\there"));
        assert!(!v.is_clean_filename("del\u{007F}"));
        assert!(!v.is_clean_filename("c1\u{0085}"));
    }

    #[test]
    fn test_length_limit() {
        let v = NameValidator::new(10);
        assert!(v.is_allowed_length("0123456789"));
        assert!(!v.is_allowed_length("0123456789a"));
        assert!(!v.is_allowed_length(""));
        assert!(NameValidator::default().is_clean_filename(&"a".repeat(1024)));
        assert!(!NameValidator::default().is_clean_filename(&"a".repeat(1025)));
    }

    #[test]
    fn test_clean_paths() {
        let v = NameValidator::default();
        assert!(v.is_clean_path("/chapters/intro.tex"));
        assert!(v.is_clean_path("chapters/figures/"));
        assert!(!v.is_clean_path("/"));
        assert!(!v.is_clean_path("/chapters/../intro.tex"));
        assert!(!v.is_clean_path("/chap*ters/intro.tex"));
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean("A*.png"), "A_.png");
        assert_eq!(clean("/d/e/f/test.tex"), "_d_e_f_test.tex");
        assert_eq!(clean("bell\u{0007}"), "bell_");
        assert_eq!(clean("."), "_");
        assert_eq!(clean(".."), "__");
        assert_eq!(clean("prototype"), "prototype");
        assert_eq!(clean(""), "");
        assert_eq!(clean("fine.tex"), "fine.tex");
    }

    #[test]
    fn test_clean_element_name_prefixes_only_top_level_files() {
        assert_eq!(
            clean_element_name("prototype", EntityType::Doc, true),
            "@prototype"
        );
        assert_eq!(
            clean_element_name("constructor", EntityType::File, true),
            "@constructor"
        );
        assert_eq!(
            clean_element_name("constructor", EntityType::Folder, true),
            "constructor"
        );
        assert_eq!(
            clean_element_name("prototype", EntityType::Doc, false),
            "prototype"
        );
        assert_eq!(clean_element_name("a*b", EntityType::Folder, false), "a_b");
    }

    #[test]
    fn test_blocked_names() {
        assert!(is_blocked_filename("__proto__"));
        assert!(is_blocked_filename("hasOwnProperty"));
        assert!(!is_blocked_filename("proto"));
    }

    #[test]
    fn test_validate_and_unique() {
        let v = NameValidator::default();
        let err = v.validate("bad*name").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidName);

        let mut folder = Folder::new("rootFolder");
        folder.docs.push(Doc::new("main.tex"));
        assert!(ensure_unique(&folder, "other.tex").is_ok());
        let err = ensure_unique(&folder, "main.tex").unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateName);
    }
}
