use std::collections::HashSet;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("shader gallery is empty")]
    Empty,
    #[error("shader '{0}' is registered more than once")]
    DuplicateName(String),
    #[error("shader '{0}' not found")]
    UnknownShader(String),
    #[error("shader index {index} out of range (gallery holds {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// A named fragment shader source. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderVariant {
    name: String,
    source: String,
}

impl ShaderVariant {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Collects variants during setup; consumed by [`RegistryBuilder::build`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    variants: Vec<ShaderVariant>,
    start: Option<String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a variant in display order.
    pub fn register(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.variants.push(ShaderVariant::new(name, source));
        self
    }

    /// Selects the initially active variant by name (defaults to the first).
    pub fn start_with(mut self, name: impl Into<String>) -> Self {
        self.start = Some(name.into());
        self
    }

    pub fn build(self) -> Result<ShaderRegistry, RegistryError> {
        if self.variants.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::new();
        for variant in &self.variants {
            if !seen.insert(variant.name.as_str()) {
                return Err(RegistryError::DuplicateName(variant.name.clone()));
            }
        }

        let mut registry = ShaderRegistry {
            variants: self.variants,
            active: 0,
        };
        if let Some(start) = self.start {
            registry.active = registry
                .position(&start)
                .ok_or(RegistryError::UnknownShader(start))?;
        }
        Ok(registry)
    }
}

/// Ordered shader variants plus the currently active index.
///
/// Invariant: `active < variants.len()` and `variants` is never empty.
#[derive(Debug, Clone)]
pub struct ShaderRegistry {
    variants: Vec<ShaderVariant>,
    active: usize,
}

impl ShaderRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Assembles a registry from variants already known to be non-empty and unique.
    pub(crate) fn from_parts(variants: Vec<ShaderVariant>, active: usize) -> Self {
        debug_assert!(active < variants.len());
        Self { variants, active }
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    /// The active variant, for labels and titles.
    pub fn current(&self) -> &ShaderVariant {
        &self.variants[self.active]
    }

    pub fn get(&self, index: usize) -> Option<&ShaderVariant> {
        self.variants.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShaderVariant> {
        self.variants.iter()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.variants
            .iter()
            .position(|variant| variant.name == name)
    }

    /// Index `next()` would move to, wrapping past the end.
    pub fn next_index(&self) -> usize {
        (self.active + 1) % self.variants.len()
    }

    /// Index `previous()` would move to, wrapping before the start.
    pub fn previous_index(&self) -> usize {
        (self.active + self.variants.len() - 1) % self.variants.len()
    }

    pub fn set_active(&mut self, index: usize) -> Result<(), RegistryError> {
        if index >= self.variants.len() {
            return Err(RegistryError::IndexOutOfRange {
                index,
                len: self.variants.len(),
            });
        }
        self.active = index;
        Ok(())
    }

    pub fn advance_next(&mut self) -> usize {
        self.active = self.next_index();
        self.active
    }

    pub fn advance_previous(&mut self) -> usize {
        self.active = self.previous_index();
        self.active
    }
}
