//! Resource pools for transient instances: voices and grains.
//!
//! Both pools keep a free list and a used list. A trigger takes an instance
//! from the free list (or creates one when it is empty), initializes it and
//! moves it to the used list. Every processing step first retires finished
//! instances back to the free list, then mixes the remaining ones into the
//! output. Instances are recycled, never dropped, until the pool is released.

pub mod grain;
pub mod voice;

pub use grain::{
    ConstantDuration, ConstantParameters, DurationGenerator, Grain, GrainFactory, Granulator,
    ParameterGenerator, PeriodicTicks, TickGenerator,
};
pub use voice::{PolyVoice, VoiceFactory};
