//! Dynamic construction of patches and engines from descriptions.

use std::sync::Arc;

use patchwork_config::{PatchDescriptor, Script};
use patchwork_core::{Engine, Patch};

use crate::error::BuildError;
use crate::registry::{BuildContext, Registry};

/// Builds a patch: bridges first, then every module in identifier order,
/// then the connections.
///
/// A connection naming an unknown module is skipped with a warning. A
/// connection the graph refuses (port out of range, duplicate) is ignored.
pub fn build_patch(
    descriptor: &PatchDescriptor,
    context: &BuildContext<'_>,
) -> Result<Patch, BuildError> {
    let mut patch = Patch::new(
        descriptor.num_inlets,
        descriptor.num_outlets,
        context.block_length,
        context.sample_rate,
    );

    for (id, module) in &descriptor.modules {
        let built = context
            .registry
            .create_module(&module.kind, &module.settings, context)?;
        patch.add(id.as_str(), built)?;
    }

    for connection in &descriptor.connections {
        let (Some(from), Some(to)) = (patch.find(&connection.from), patch.find(&connection.to))
        else {
            tracing::warn!(
                from = %connection.from,
                to = %connection.to,
                "skipping connection with unresolved endpoint"
            );
            continue;
        };
        if !patch.connect(from, connection.outlet, to, connection.inlet) {
            tracing::debug!(
                from = %connection.from,
                outlet = connection.outlet,
                to = %connection.to,
                inlet = connection.inlet,
                "connection ignored"
            );
        }
    }

    Ok(patch)
}

/// Builds the engine for a script, hosting its patch as `main`.
pub fn build_script(script: &Script, registry: &Arc<Registry>) -> Result<Engine, BuildError> {
    let context = BuildContext::new(registry, script.buffer_length, script.sample_rate)
        .with_directory(script.directory());
    let patch = build_patch(&script.patch, &context)?;
    tracing::info!(
        sample_rate = script.sample_rate,
        buffer_length = script.buffer_length,
        inlets = script.patch.num_inlets,
        outlets = script.patch.num_outlets,
        "built main patch"
    );
    Ok(Engine::new(
        "main",
        Box::new(patch),
        script.buffer_length,
        script.sample_rate,
    )?)
}
