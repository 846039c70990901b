//! Subcommand implementations.

pub mod devices;
pub mod modules;
pub mod play;
pub mod render;

use anyhow::Context;
use patchwork_config::{Script, load_score};
use patchwork_core::{Engine, ScorePlayer};
use patchwork_registry::{Registry, build_script};
use std::path::Path;
use std::sync::Arc;

/// A built engine plus the optional score that drives it.
pub(crate) struct Session {
    pub engine: Engine,
    pub player: Option<ScorePlayer>,
}

impl Session {
    pub fn load(script_path: &Path, score_path: Option<&Path>) -> anyhow::Result<Self> {
        let script = Script::load(script_path)
            .with_context(|| format!("failed to load script {}", script_path.display()))?;
        let registry = Arc::new(Registry::with_builtins());
        let engine = build_script(&script, &registry)
            .with_context(|| format!("failed to build patch from {}", script_path.display()))?;

        let player = score_path
            .map(|path| {
                load_score(path)
                    .map(ScorePlayer::new)
                    .with_context(|| format!("failed to load score {}", path.display()))
            })
            .transpose()?;

        Ok(Self { engine, player })
    }
}
