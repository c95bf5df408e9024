use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::options::TransformOptions;

/// A resolved dependency edge, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    /// Specifier as written in the importing file.
    pub specifier: String,
    /// Absolute path of the resolved module.
    pub path: String,
    /// True for `import()` edges.
    #[serde(default)]
    pub is_async: bool,
}

/// A transformed module as seen by the bundler graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    /// Absolute file path. Identity of the module.
    pub path: String,
    /// Transformed code, before module wrapping.
    pub code: String,
    pub dependencies: Vec<Dependency>,
    /// Paths of modules that depend on this one.
    #[serde(default)]
    pub inverse_dependencies: Vec<String>,
    /// Options this module was transformed with.
    #[serde(default)]
    pub transform_options: TransformOptions,
}

impl Module {
    pub fn builder(path: impl Into<String>) -> ModuleBuilder {
        ModuleBuilder {
            module: Module {
                path: path.into(),
                code: String::new(),
                dependencies: Vec::new(),
                inverse_dependencies: Vec::new(),
                transform_options: TransformOptions::default(),
            },
        }
    }
}

pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.module.code = code.into();
        self
    }

    pub fn dependency(mut self, specifier: impl Into<String>, path: impl Into<String>) -> Self {
        self.module.dependencies.push(Dependency {
            specifier: specifier.into(),
            path: path.into(),
            is_async: false,
        });
        self
    }

    pub fn async_dependency(
        mut self,
        specifier: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        self.module.dependencies.push(Dependency {
            specifier: specifier.into(),
            path: path.into(),
            is_async: true,
        });
        self
    }

    pub fn inverse_dependency(mut self, path: impl Into<String>) -> Self {
        self.module.inverse_dependencies.push(path.into());
        self
    }

    pub fn transform_options(mut self, options: TransformOptions) -> Self {
        self.module.transform_options = options;
        self
    }

    pub fn build(self) -> Module {
        self.module
    }
}

/// Immutable snapshot of a dependency graph.
///
/// Modules are stored in the order the bundler discovered them. Nothing
/// downstream may rely on that order for output; see
/// [`crate::sorted_modules`].
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub entry_points: Vec<String>,
    pub dependencies: IndexMap<String, Arc<Module>>,
    /// Options the whole graph was built with.
    pub transform_options: TransformOptions,
}

impl Graph {
    pub fn new(transform_options: TransformOptions) -> Self {
        Self {
            entry_points: Vec::new(),
            dependencies: IndexMap::new(),
            transform_options,
        }
    }

    pub fn with_entry_point(mut self, path: impl Into<String>) -> Self {
        self.entry_points.push(path.into());
        self
    }

    pub fn with_module(mut self, module: Module) -> Self {
        self.insert(module);
        self
    }

    /// Insert or replace a module, keeping its original position when replaced.
    pub fn insert(&mut self, module: Module) {
        self.dependencies
            .insert(module.path.clone(), Arc::new(module));
    }

    /// Remove a module. Later modules keep their relative order.
    pub fn remove(&mut self, path: &str) -> Option<Arc<Module>> {
        self.dependencies.shift_remove(path)
    }

    pub fn get(&self, path: &str) -> Option<&Arc<Module>> {
        self.dependencies.get(path)
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn modules(&self) -> impl Iterator<Item = &Arc<Module>> {
        self.dependencies.values()
    }
}
