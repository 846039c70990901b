//! Built-in factories: processors, containers, voices and tables.

use std::path::Path;
use std::sync::Arc;

use patchwork_config::PatchSource;
use patchwork_core::{Module, PolyVoice, Settings, Voice, VoiceFactory, WaveTable};
use patchwork_processors::{
    AdsrModule, AdsrSettings, Allpass, AllpassSettings, Delay, DelaySettings, GranulatorSettings,
    Oscillator, OscillatorSettings, SineVoice, decode_settings, granulator,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::build::build_patch;
use crate::error::BuildError;
use crate::patch_voice::PatchVoice;
use crate::registry::{BuildContext, Registry};

/// Settings of the `poly` module.
///
/// The pool sums as many outlets as the voice factory registered under
/// `factory` declares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolySettings {
    /// Voice factory name.
    pub factory: String,
}

impl Default for PolySettings {
    fn default() -> Self {
        Self {
            factory: String::from("sine"),
        }
    }
}

pub(crate) fn register_builtins(registry: &mut Registry) {
    registry.register_table("sine", "8192-point sine cycle", WaveTable::default());

    registry.register_module("osc", "Wave table oscillator", build_oscillator);
    registry.register_module("square", "Square oscillator", build_square);
    registry.register_module("adsr", "Exponential ADSR envelope", build_adsr);
    registry.register_module("delay", "Interpolating delay line", build_delay);
    registry.register_module("allpass", "Schroeder allpass filter", build_allpass);
    registry.register_module("patch", "Nested patch, inline or from a file", build_patch_module);
    registry.register_module("poly", "Polyphonic voice pool", build_poly);
    registry.register_module("granulator", "Periodic wave table grains", build_granulator);

    registry.register_voice("sine", "Sine oscillator through an ADSR", 2, sine_voices);
    registry.register_voice("patch", "Sub-patch with linear attack and release", 2, patch_voices);
    // Older scripts name the voices this way.
    registry.register_voice("sinvoice", "Same as sine", 2, sine_voices);
    registry.register_voice("patchvoice", "Same as patch", 2, patch_voices);
}

fn decode<T: DeserializeOwned + Default>(
    factory: &str,
    settings: &Settings,
) -> Result<T, BuildError> {
    decode_settings(settings).map_err(|source| BuildError::invalid_settings(factory, source))
}

fn build_oscillator(
    settings: &Settings,
    context: &BuildContext<'_>,
) -> Result<Box<dyn Module>, BuildError> {
    let settings: OscillatorSettings = decode("osc", settings)?;
    let table = context.registry.wave_table(&settings.table)?;
    Ok(Box::new(Oscillator::table(table, &settings, context.sample_rate)))
}

fn build_square(
    settings: &Settings,
    context: &BuildContext<'_>,
) -> Result<Box<dyn Module>, BuildError> {
    let settings: OscillatorSettings = decode("square", settings)?;
    Ok(Box::new(Oscillator::square(&settings, context.sample_rate)))
}

fn build_adsr(
    settings: &Settings,
    context: &BuildContext<'_>,
) -> Result<Box<dyn Module>, BuildError> {
    let settings: AdsrSettings = decode("adsr", settings)?;
    Ok(Box::new(AdsrModule::new(&settings, context.sample_rate)))
}

fn build_delay(
    settings: &Settings,
    context: &BuildContext<'_>,
) -> Result<Box<dyn Module>, BuildError> {
    let settings: DelaySettings = decode("delay", settings)?;
    Ok(Box::new(Delay::new(&settings, context.sample_rate)))
}

fn build_allpass(
    settings: &Settings,
    context: &BuildContext<'_>,
) -> Result<Box<dyn Module>, BuildError> {
    let settings: AllpassSettings = decode("allpass", settings)?;
    Ok(Box::new(Allpass::new(&settings, context.sample_rate)))
}

fn build_patch_module(
    settings: &Settings,
    context: &BuildContext<'_>,
) -> Result<Box<dyn Module>, BuildError> {
    let source = PatchSource::deserialize(settings)
        .map_err(|source| BuildError::invalid_settings("patch", source))?;
    let loaded = source.resolve(context.directory)?;
    let nested = context.with_directory(loaded.directory.as_deref());
    Ok(Box::new(build_patch(&loaded.descriptor, &nested)?))
}

fn build_poly(
    settings: &Settings,
    context: &BuildContext<'_>,
) -> Result<Box<dyn Module>, BuildError> {
    let settings: PolySettings = decode("poly", settings)?;
    let outlets = context.registry.voice_outlets(&settings.factory)?;
    let factory = context.registry.create_voice_factory(&settings.factory, context)?;
    Ok(Box::new(PolyVoice::with_factory(
        factory,
        outlets,
        context.block_length,
        context.sample_rate,
    )))
}

fn build_granulator(
    settings: &Settings,
    context: &BuildContext<'_>,
) -> Result<Box<dyn Module>, BuildError> {
    let settings: GranulatorSettings = decode("granulator", settings)?;
    let table = context.registry.wave_table(&settings.table)?;
    Ok(Box::new(granulator(table, &settings, context.sample_rate)))
}

fn sine_voices(context: &BuildContext<'_>) -> Result<Box<dyn VoiceFactory>, BuildError> {
    let table = context.registry.wave_table("sine")?;
    Ok(Box::new(move |_: usize, sample_rate: f32| -> Box<dyn Voice> {
        Box::new(SineVoice::new(table.clone(), sample_rate))
    }))
}

fn patch_voices(context: &BuildContext<'_>) -> Result<Box<dyn VoiceFactory>, BuildError> {
    let registry = Arc::clone(context.registry);
    let directory = context.directory.map(Path::to_path_buf);
    Ok(Box::new(move |block_length: usize, sample_rate: f32| -> Box<dyn Voice> {
        Box::new(PatchVoice::new(
            Arc::clone(&registry),
            directory.clone(),
            block_length,
            sample_rate,
        ))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwork_core::{Inputs, Outputs};
    use serde_json::json;

    fn context(registry: &Arc<Registry>) -> BuildContext<'_> {
        BuildContext::new(registry, 8, 8.0)
    }

    #[test]
    fn every_module_builds_with_defaults() {
        let registry = Arc::new(Registry::with_builtins());
        let context = context(&registry);
        for name in ["osc", "square", "adsr", "delay", "allpass", "poly", "granulator"] {
            assert!(
                registry.create_module(name, &Settings::Null, &context).is_ok(),
                "{name} failed"
            );
        }
    }

    #[test]
    fn port_counts_match_documentation() {
        let registry = Arc::new(Registry::with_builtins());
        let context = context(&registry);
        let ports = |name: &str| {
            let module = registry.create_module(name, &Settings::Null, &context).unwrap();
            (module.inlet_count(), module.outlet_count())
        };
        assert_eq!(ports("osc"), (3, 1));
        assert_eq!(ports("square"), (3, 1));
        assert_eq!(ports("adsr"), (1, 1));
        assert_eq!(ports("delay"), (2, 1));
        assert_eq!(ports("allpass"), (3, 1));
        assert_eq!(ports("poly"), (0, 2));
        assert_eq!(ports("granulator"), (0, 2));
    }

    #[test]
    fn wrong_setting_types_are_reported() {
        let registry = Arc::new(Registry::with_builtins());
        let context = context(&registry);
        for name in ["osc", "granulator"] {
            let result = registry.create_module(name, &json!({"frequency": "high"}), &context);
            let Err(BuildError::InvalidSettings { factory, .. }) = result else {
                panic!("{name} accepted a string frequency");
            };
            assert_eq!(factory, name);
        }
    }

    #[test]
    fn unknown_table_and_voice_are_reported() {
        let registry = Arc::new(Registry::with_builtins());
        let context = context(&registry);
        assert!(matches!(
            registry.create_module("osc", &json!({"table": "saw"}), &context),
            Err(BuildError::UnknownWaveTable(_))
        ));
        assert!(matches!(
            registry.create_module("poly", &json!({"factory": "organ"}), &context),
            Err(BuildError::UnknownVoiceFactory(_))
        ));
    }

    #[test]
    fn inline_patch_module_builds() {
        let registry = Arc::new(Registry::with_builtins());
        let settings = json!({
            "numInlets": 1,
            "numOutlets": 2,
            "modules": {"d": {"type": "delay"}},
        });
        let module = registry.create_module("patch", &settings, &context(&registry)).unwrap();
        assert_eq!((module.inlet_count(), module.outlet_count()), (1, 2));
    }

    /// One-outlet voice that plays a constant while held.
    struct Mono {
        level: f32,
    }

    impl Module for Mono {
        fn inlet_count(&self) -> usize {
            0
        }
        fn outlet_count(&self) -> usize {
            1
        }
        fn process(&mut self, _: Inputs<'_>, mut outputs: Outputs<'_>, _: u64) {
            outputs.fill(self.level);
        }
        fn as_voice(&self) -> Option<&dyn Voice> {
            Some(self)
        }
        fn as_voice_mut(&mut self) -> Option<&mut dyn Voice> {
            Some(self)
        }
    }

    impl Voice for Mono {
        fn note_on(&mut self, _: Option<f32>, _: f32, _: &Settings) {
            self.level = 1.0;
        }
        fn note_off(&mut self) {
            self.level = 0.0;
        }
        fn is_finished(&self) -> bool {
            self.level == 0.0
        }
    }

    fn mono_voices(_: &BuildContext<'_>) -> Result<Box<dyn VoiceFactory>, BuildError> {
        Ok(Box::new(|_: usize, _: f32| -> Box<dyn Voice> {
            Box::new(Mono { level: 0.0 })
        }))
    }

    #[test]
    fn poly_outlets_follow_the_voice_factory() {
        let mut registry = Registry::with_builtins();
        registry.register_voice("mono", "Constant while held", 1, mono_voices);
        let registry = Arc::new(registry);
        let context = context(&registry);

        let mono = registry.create_module("poly", &json!({"factory": "mono"}), &context).unwrap();
        assert_eq!(mono.outlet_count(), 1);
        let sine = registry.create_module("poly", &json!({"factory": "sine"}), &context).unwrap();
        assert_eq!(sine.outlet_count(), 2);
        assert_eq!(registry.voice_outlets("mono").unwrap(), 1);
    }

    #[test]
    fn legacy_voice_names_resolve() {
        let registry = Arc::new(Registry::with_builtins());
        let context = context(&registry);
        for name in ["sinvoice", "patchvoice"] {
            let module = registry.create_module("poly", &json!({"factory": name}), &context);
            assert_eq!(module.unwrap().outlet_count(), 2, "{name}");
        }
    }
}
