//! Language frontends
//!
//! A frontend walks one parsed source file and drives the factory, builders
//! and composer to produce a translation unit. The construction layer never
//! sees language-specific syntax; frontends never touch the engine directly.

pub mod golang;

pub use golang::GoFrontend;

use crate::declarations::TranslationUnitDeclaration;
use crate::position::SourceFile;
use crate::session::Session;
use crate::Result;
use std::path::Path;

/// Trait for language frontends
///
/// Each frontend is responsible for:
/// 1. Identifying files it can translate
/// 2. Parsing them with tree-sitter
/// 3. Creating one located node per relevant syntax node
/// 4. Linking declarations into their unit, namespace and records
pub trait Frontend: Send + Sync {
    /// Get the language name (for display)
    fn language_name(&self) -> &str;

    /// Get file extensions this frontend handles
    fn file_extensions(&self) -> &[&str];

    /// Check if this frontend can handle a file
    fn can_handle(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            self.file_extensions().contains(&ext)
        } else {
            false
        }
    }

    /// Translate a file registered in the session's file set
    fn translate(&self, s: &mut Session<'_>, file: &SourceFile) -> Result<TranslationUnitDeclaration>;
}

/// Registry of language frontends
#[derive(Default)]
pub struct FrontendRegistry {
    frontends: Vec<Box<dyn Frontend>>,
}

impl FrontendRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a frontend
    pub fn register(&mut self, frontend: impl Frontend + 'static) {
        self.frontends.push(Box::new(frontend));
    }

    /// Find a frontend for a file
    pub fn find_frontend(&self, path: &Path) -> Option<&dyn Frontend> {
        self.frontends
            .iter()
            .find(|f| f.can_handle(path))
            .map(|f| f.as_ref())
    }

    /// Get all registered frontends
    pub fn frontends(&self) -> &[Box<dyn Frontend>] {
        &self.frontends
    }

    /// Whether any frontend handles this file
    pub fn can_handle(&self, path: &Path) -> bool {
        self.find_frontend(path).is_some()
    }
}

/// Create a default registry with all built-in frontends
pub fn default_registry() -> FrontendRegistry {
    let mut registry = FrontendRegistry::new();
    registry.register(GoFrontend::new());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory;

    struct TestFrontend;

    impl Frontend for TestFrontend {
        fn language_name(&self) -> &str {
            "test"
        }

        fn file_extensions(&self) -> &[&str] {
            &["test"]
        }

        fn translate(&self, s: &mut Session<'_>, file: &SourceFile) -> Result<TranslationUnitDeclaration> {
            factory::new_translation_unit_declaration(s, None, file.name(), file.content())
        }
    }

    #[test]
    fn test_registry() {
        let mut registry = FrontendRegistry::new();
        registry.register(TestFrontend);

        assert!(registry.find_frontend(Path::new("foo.test")).is_some());
        assert!(registry.find_frontend(Path::new("foo.other")).is_none());
    }

    #[test]
    fn test_default_registry_handles_go() {
        let registry = default_registry();
        let frontend = registry.find_frontend(Path::new("cmd/main.go")).unwrap();
        assert_eq!(frontend.language_name(), "Go");
        assert!(!registry.can_handle(Path::new("README.md")));
    }
}
