//! The capability set every node in a module graph implements.
//!
//! A [`Module`] only supplies signal generation: port buffers, connection
//! sets, identifiers and the per-cycle `processed` flag are bookkeeping owned
//! by the [`ModuleGraph`](crate::ModuleGraph) arena that holds the module.
//! During [`process()`](Module::process) the module sees its inlets through
//! [`Inputs`] (already summed from every incoming connection) and writes its
//! outlets through [`Outputs`].

use crate::address::Route;
use crate::graph::Port;

/// Opaque construction settings handed to a factory.
///
/// Each factory decodes this schema-less value into its own typed settings
/// struct; the core never inspects it.
pub type Settings = serde_json::Value;

/// Opaque control payload delivered through [`Module::receive_message`].
pub type Message = serde_json::Value;

const EMPTY: &[f32] = &[];

/// Read-only view of a module's inlet buffers for one block.
#[derive(Clone, Copy)]
pub struct Inputs<'a> {
    ports: &'a [Port],
}

impl<'a> Inputs<'a> {
    pub(crate) fn new(ports: &'a [Port]) -> Self {
        Self { ports }
    }

    /// Number of inlets.
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// Returns true if the module has no inlets.
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Buffer of inlet `index`, or an empty slice when out of range.
    pub fn get(&self, index: usize) -> &'a [f32] {
        self.ports.get(index).map_or(EMPTY, Port::buffer)
    }

    /// Buffer of inlet `index` if at least one connection feeds it.
    ///
    /// Modules use this to tell "modulated by zero" apart from "not patched".
    pub fn connected(&self, index: usize) -> Option<&'a [f32]> {
        self.ports
            .get(index)
            .filter(|port| port.is_connected())
            .map(Port::buffer)
    }
}

/// Writable view of a module's outlet buffers for one block.
pub struct Outputs<'a> {
    ports: &'a mut [Port],
}

impl<'a> Outputs<'a> {
    pub(crate) fn new(ports: &'a mut [Port]) -> Self {
        Self { ports }
    }

    /// Number of outlets.
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// Returns true if the module has no outlets.
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Buffer of outlet `index`, or an empty slice when out of range.
    pub fn get_mut(&mut self, index: usize) -> &mut [f32] {
        match self.ports.get_mut(index) {
            Some(port) => port.buffer_mut(),
            None => &mut [],
        }
    }

    /// Outlets 0 and 1 as a left/right pair, if the module has at least two.
    pub fn stereo_mut(&mut self) -> Option<(&mut [f32], &mut [f32])> {
        if self.ports.len() < 2 {
            return None;
        }
        let (left, right) = self.ports.split_at_mut(1);
        Some((left[0].buffer_mut(), right[0].buffer_mut()))
    }

    /// Iterates over every outlet buffer in port order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        self.ports.iter_mut().map(|port| port.buffer_mut())
    }

    /// Sets every sample of every outlet to `value`.
    pub fn fill(&mut self, value: f32) {
        for buffer in self.iter_mut() {
            buffer.fill(value);
        }
    }
}

/// A node in the processing graph.
///
/// Port counts are fixed for the lifetime of the module. `process` is called
/// at most once per cycle by the scheduler, after every inlet has been filled.
/// It must not fail or panic.
pub trait Module: Send {
    /// Number of inlets this module declares.
    fn inlet_count(&self) -> usize;

    /// Number of outlets this module declares.
    fn outlet_count(&self) -> usize;

    /// Fills the outlets for the block starting at `timestamp` (in samples).
    fn process(&mut self, inputs: Inputs<'_>, outputs: Outputs<'_>, timestamp: u64);

    /// Handles a control message addressed to this module.
    fn receive_message(&mut self, _message: &Message) {}

    /// Routes a message further down into nested children.
    ///
    /// Only containers (patches) override this. Returns true if a module
    /// received the message.
    fn send_message(&mut self, _route: Route<'_>, _message: &Message) -> bool {
        false
    }

    /// Releases resources held by the module before it is discarded.
    fn release(&mut self) {}

    /// The voice capability, if this module is a pooled voice.
    fn as_voice(&self) -> Option<&dyn Voice> {
        None
    }

    /// Mutable access to the voice capability.
    fn as_voice_mut(&mut self) -> Option<&mut dyn Voice> {
        None
    }
}

/// A module with a trigger/finish lifecycle, driven by a
/// [`PolyVoice`](crate::PolyVoice) pool.
pub trait Voice: Module {
    /// Starts the voice. `duration` is in seconds when the trigger carries one.
    fn note_on(&mut self, duration: Option<f32>, sample_rate: f32, settings: &Settings);

    /// Begins the release phase.
    fn note_off(&mut self);

    /// True once the voice has faded out and may be recycled.
    fn is_finished(&self) -> bool;
}
