//! Name-to-factory tables.

use std::path::Path;
use std::sync::Arc;

use patchwork_core::{Module, Settings, VoiceFactory, WaveTable};

use crate::error::BuildError;

/// Everything a factory needs besides its settings.
#[derive(Clone, Copy)]
pub struct BuildContext<'a> {
    /// Registry for nested lookups.
    pub registry: &'a Arc<Registry>,
    /// Block length of the graph the module joins.
    pub block_length: usize,
    /// Sample rate in Hz.
    pub sample_rate: f32,
    /// Directory relative file references resolve against.
    pub directory: Option<&'a Path>,
}

impl<'a> BuildContext<'a> {
    /// Context with no base directory.
    pub fn new(registry: &'a Arc<Registry>, block_length: usize, sample_rate: f32) -> Self {
        Self {
            registry,
            block_length,
            sample_rate,
            directory: None,
        }
    }

    /// Same context resolving relative paths against `directory`.
    pub fn with_directory<'b>(&self, directory: Option<&'b Path>) -> BuildContext<'b>
    where
        'a: 'b,
    {
        BuildContext {
            registry: self.registry,
            block_length: self.block_length,
            sample_rate: self.sample_rate,
            directory,
        }
    }
}

/// Builds a module from its settings.
pub type ModuleFactory = fn(&Settings, &BuildContext<'_>) -> Result<Box<dyn Module>, BuildError>;

/// Builds the per-pool voice factory handed to a `PolyVoice`.
pub type VoiceFactoryBuilder = fn(&BuildContext<'_>) -> Result<Box<dyn VoiceFactory>, BuildError>;

/// Name and one-line description of a registered entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Lookup name.
    pub name: String,
    /// Short human-readable description.
    pub description: String,
}

struct Entry<T> {
    info: EntryInfo,
    value: T,
}

struct VoiceEntry {
    builder: VoiceFactoryBuilder,
    outlets: usize,
}

fn upsert<T>(entries: &mut Vec<Entry<T>>, kind: &str, info: EntryInfo, value: T) {
    if let Some(entry) = entries.iter_mut().find(|e| e.info.name == info.name) {
        tracing::debug!(name = %info.name, kind, "replacing registry entry");
        *entry = Entry { info, value };
    } else {
        entries.push(Entry { info, value });
    }
}

fn lookup<'e, T>(entries: &'e [Entry<T>], name: &str) -> Option<&'e T> {
    entries.iter().find(|e| e.info.name == name).map(|e| &e.value)
}

/// Registry of module factories, voice factories and wave tables.
///
/// Fill it once at startup, then share it behind an [`Arc`]; construction
/// only reads. Registering a name twice replaces the earlier entry.
#[derive(Default)]
pub struct Registry {
    modules: Vec<Entry<ModuleFactory>>,
    voices: Vec<Entry<VoiceEntry>>,
    tables: Vec<Entry<WaveTable>>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in factory and table.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtins::register_builtins(&mut registry);
        registry
    }

    /// Registers a module factory.
    pub fn register_module(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        factory: ModuleFactory,
    ) {
        let info = EntryInfo {
            name: name.into(),
            description: description.into(),
        };
        upsert(&mut self.modules, "module", info, factory);
    }

    /// Registers a voice factory for `poly` modules.
    ///
    /// `outlets` is the outlet count of every voice the factory creates; a
    /// `poly` pool built on it sums that many channels.
    pub fn register_voice(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        outlets: usize,
        builder: VoiceFactoryBuilder,
    ) {
        let info = EntryInfo {
            name: name.into(),
            description: description.into(),
        };
        upsert(&mut self.voices, "voice", info, VoiceEntry { builder, outlets });
    }

    /// Registers a wave table.
    pub fn register_table(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        table: WaveTable,
    ) {
        let info = EntryInfo {
            name: name.into(),
            description: description.into(),
        };
        upsert(&mut self.tables, "table", info, table);
    }

    /// Creates a module of type `kind`.
    pub fn create_module(
        &self,
        kind: &str,
        settings: &Settings,
        context: &BuildContext<'_>,
    ) -> Result<Box<dyn Module>, BuildError> {
        let factory = lookup(&self.modules, kind)
            .ok_or_else(|| BuildError::UnknownFactory(kind.to_string()))?;
        factory(settings, context)
    }

    /// Creates the voice factory registered as `name`.
    pub fn create_voice_factory(
        &self,
        name: &str,
        context: &BuildContext<'_>,
    ) -> Result<Box<dyn VoiceFactory>, BuildError> {
        let entry = lookup(&self.voices, name)
            .ok_or_else(|| BuildError::UnknownVoiceFactory(name.to_string()))?;
        (entry.builder)(context)
    }

    /// Outlet count of the voices registered as `name`.
    pub fn voice_outlets(&self, name: &str) -> Result<usize, BuildError> {
        lookup(&self.voices, name)
            .map(|entry| entry.outlets)
            .ok_or_else(|| BuildError::UnknownVoiceFactory(name.to_string()))
    }

    /// Shared handle to the wave table registered as `name`.
    pub fn wave_table(&self, name: &str) -> Result<WaveTable, BuildError> {
        lookup(&self.tables, name)
            .cloned()
            .ok_or_else(|| BuildError::UnknownWaveTable(name.to_string()))
    }

    /// True if a module factory is registered as `name`.
    pub fn has_module(&self, name: &str) -> bool {
        lookup(&self.modules, name).is_some()
    }

    /// Registered module factories, in registration order.
    pub fn modules(&self) -> impl Iterator<Item = &EntryInfo> {
        self.modules.iter().map(|e| &e.info)
    }

    /// Registered voice factories.
    pub fn voices(&self) -> impl Iterator<Item = &EntryInfo> {
        self.voices.iter().map(|e| &e.info)
    }

    /// Registered wave tables.
    pub fn tables(&self) -> impl Iterator<Item = &EntryInfo> {
        self.tables.iter().map(|e| &e.info)
    }
}

fn names<'e>(infos: impl Iterator<Item = &'e EntryInfo>) -> Vec<&'e str> {
    infos.map(|info| info.name.as_str()).collect()
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("modules", &names(self.modules()))
            .field("voices", &names(self.voices()))
            .field("tables", &names(self.tables()))
            .finish()
    }
}
