//! Checker configuration.

/// Options controlling a [`Program`](crate::Program) check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerOptions {
    /// Check `#test` blocks.
    pub test_mode: bool,
    /// Bit width of pointers and function pointers.
    pub pointer_width: u32,
    /// Prefix of mangled names; defaults to each file's module name.
    pub mangle_root: Option<String>,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        Self {
            test_mode: false,
            pointer_width: 64,
            mangle_root: None,
        }
    }
}

impl CheckerOptions {
    pub fn with_test_mode(mut self, enabled: bool) -> Self {
        self.test_mode = enabled;
        self
    }

    pub fn with_pointer_width(mut self, bits: u32) -> Self {
        self.pointer_width = bits;
        self
    }

    pub fn with_mangle_root(mut self, root: impl Into<String>) -> Self {
        self.mangle_root = Some(root.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = CheckerOptions::default();
        assert!(!options.test_mode);
        assert_eq!(options.pointer_width, 64);
        assert!(options.mangle_root.is_none());
    }

    #[test]
    fn builders() {
        let options = CheckerOptions::default()
            .with_test_mode(true)
            .with_pointer_width(32)
            .with_mangle_root("app");
        assert!(options.test_mode);
        assert_eq!(options.pointer_width, 32);
        assert_eq!(options.mangle_root.as_deref(), Some("app"));
    }
}
