//! Timed control events played against an [`Engine`].
//!
//! Events are quantized to block boundaries: each block, every pending event
//! whose time is at or before the block start fires before the block is
//! produced.

use crate::address::Address;
use crate::engine::Engine;
use crate::module::Message;

/// What a score event does when it fires.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreAction {
    /// Delivers each message to its address, in order.
    Send(Vec<(Address, Message)>),
    /// Rewinds the score to its first event and its clock to zero.
    Reset,
}

/// An action scheduled at `on` seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEvent {
    /// Time in seconds.
    pub on: f64,
    /// Action to run.
    pub action: ScoreAction,
}

/// Events ordered by time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Score {
    events: Vec<ScoreEvent>,
}

impl Score {
    /// Creates a score, sorting events by time. Events at equal times keep
    /// their relative order.
    pub fn new(mut events: Vec<ScoreEvent>) -> Self {
        events.sort_by(|a, b| a.on.total_cmp(&b.on));
        Self { events }
    }

    /// The sorted events.
    pub fn events(&self) -> &[ScoreEvent] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the score has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Plays a [`Score`] block by block.
///
/// Call [`play()`](Self::play) once per block, before
/// [`Engine::process_block`].
#[derive(Debug, Clone)]
pub struct ScorePlayer {
    score: Score,
    next: usize,
    timestamp: u64,
}

impl ScorePlayer {
    /// Creates a player positioned at the first event.
    pub fn new(score: Score) -> Self {
        Self {
            score,
            next: 0,
            timestamp: 0,
        }
    }

    /// Fires the events due at the current block and advances one block.
    /// Returns the number of events fired.
    ///
    /// A reset event stops processing for this block; events at time zero
    /// fire again on the next call.
    pub fn play(&mut self, engine: &mut Engine) -> usize {
        let time = self.timestamp as f64 / f64::from(engine.sample_rate());
        self.timestamp += engine.block_length() as u64;

        let mut fired = 0;
        while let Some(event) = self.score.events.get(self.next)
            && event.on <= time
        {
            self.next += 1;
            fired += 1;
            match &event.action {
                ScoreAction::Send(deliveries) => {
                    for (address, message) in deliveries {
                        engine.send_message(address, message);
                    }
                }
                ScoreAction::Reset => {
                    self.next = 0;
                    self.timestamp = 0;
                    break;
                }
            }
        }
        fired
    }

    /// Rewinds to the first event and time zero.
    pub fn reset(&mut self) {
        self.next = 0;
        self.timestamp = 0;
    }

    /// True once every event has fired.
    pub fn is_finished(&self) -> bool {
        self.next >= self.score.events.len()
    }

    /// Samples played so far.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The score being played.
    pub fn score(&self) -> &Score {
        &self.score
    }
}
