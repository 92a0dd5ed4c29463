/// Path prefix of the root object.
pub const ROOT_PREFIX: &str = ".";

/// Restricts which field paths a validation visits.
///
/// A field at path `p` (e.g. `.Address.Street`, `.Items[2].Name`) is in scope
/// when no scope was requested, or when the requested scope starts with `p`.
/// Both `.Address` and `.Address.Street` are in scope for `.Address.Street`;
/// `.LastName` is not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scope<'a>(Option<&'a str>);

impl<'a> Scope<'a> {
    pub fn new(path: Option<&'a str>) -> Self {
        Self(path)
    }

    /// Scope that includes every field.
    pub fn all() -> Self {
        Self(None)
    }

    pub fn path(&self) -> Option<&'a str> {
        self.0
    }

    pub fn includes(&self, field_path: &str) -> bool {
        self.0.is_none_or(|scope| scope.starts_with(field_path))
    }
}

pub(crate) fn field_path(prefix: &str, field: &str) -> String {
    format!("{prefix}{field}")
}

pub(crate) fn nested_prefix(field_path: &str) -> String {
    format!("{field_path}.")
}

pub(crate) fn element_prefix(field_path: &str, index: usize) -> String {
    format!("{field_path}[{index}].")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscoped_includes_everything() {
        assert!(Scope::all().includes(".Anything"));
        assert!(Scope::new(None).includes(".Items[3].Name"));
    }

    #[test]
    fn ancestors_of_scope_are_included() {
        let scope = Scope::new(Some(".Address.Street"));
        assert!(scope.includes(".Address"));
        assert!(scope.includes(".Address.Street"));
        assert!(!scope.includes(".LastName"));
        assert!(!scope.includes(".Address.City"));
    }

    #[test]
    fn element_paths_follow_index() {
        let scope = Scope::new(Some(".Items[2].Name"));
        assert!(scope.includes(".Items"));
        assert!(scope.includes(".Items[2].Name"));
        assert!(!scope.includes(".Items[1].Name"));
    }

    #[test]
    fn paths_are_built_from_prefixes() {
        let items = field_path(ROOT_PREFIX, "Items");
        assert_eq!(items, ".Items");
        assert_eq!(field_path(&element_prefix(&items, 2), "Name"), ".Items[2].Name");
        assert_eq!(field_path(&nested_prefix(".Address"), "Street"), ".Address.Street");
    }
}
