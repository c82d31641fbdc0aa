//! Name-to-constructor table for training modules.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::RegistryError;
use crate::module::TrainingModule;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        })
    }
}

pub type ModuleConstructor = Rc<dyn Fn() -> Box<dyn TrainingModule>>;

#[derive(Clone)]
pub struct ModuleDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub category: String,
    constructor: ModuleConstructor,
}

impl ModuleDescriptor {
    pub fn new<M, F>(id: impl Into<String>, constructor: F) -> Self
    where
        M: TrainingModule + 'static,
        F: Fn() -> M + 'static,
    {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            difficulty: Difficulty::default(),
            category: "general".to_owned(),
            constructor: Rc::new(move || -> Box<dyn TrainingModule> { Box::new(constructor()) }),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn instantiate(&self) -> Box<dyn TrainingModule> {
        (self.constructor)()
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("difficulty", &self.difficulty)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

/// Registered modules in registration order.
#[derive(Clone, Debug, Default)]
pub struct ModuleRegistry {
    modules: IndexMap<String, ModuleDescriptor>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: ModuleDescriptor) -> Result<(), RegistryError> {
        if self.modules.contains_key(&descriptor.id) {
            return Err(RegistryError::Duplicate(descriptor.id));
        }
        log::debug!("registered training module `{}`", descriptor.id);
        self.modules.insert(descriptor.id.clone(), descriptor);
        Ok(())
    }

    pub fn with(mut self, descriptor: ModuleDescriptor) -> Result<Self, RegistryError> {
        self.register(descriptor)?;
        Ok(self)
    }

    pub fn resolve(&self, id: &str) -> Result<&ModuleDescriptor, RegistryError> {
        self.modules
            .get(id)
            .ok_or_else(|| RegistryError::Unknown(id.to_owned()))
    }

    pub fn instantiate(&self, id: &str) -> Result<Box<dyn TrainingModule>, RegistryError> {
        Ok(self.resolve(id)?.instantiate())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.values()
    }

    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a ModuleDescriptor> {
        self.modules.values().filter(move |module| module.category == category)
    }

    pub fn by_difficulty(&self, difficulty: Difficulty) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules
            .values()
            .filter(move |module| module.difficulty == difficulty)
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
