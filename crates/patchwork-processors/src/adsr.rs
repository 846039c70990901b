//! Exponential ADSR envelope and its module wrapper.
//!
//! Each segment approaches an overshoot target with a one-pole curve, so
//! attack ends exactly at 1.0 and release exactly at 0.0 within a bounded
//! number of samples. The target ratios shape the curves: small ratios give
//! strongly exponential segments, large ratios nearly linear ones.

use patchwork_core::{Inputs, Message, Module, Outputs};
use serde::{Deserialize, Serialize};

use crate::settings::number;

const MIN_TARGET_RATIO: f32 = 1e-9;

/// ADSR envelope stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdsrStage {
    /// Output rests at zero.
    #[default]
    Idle,
    /// Rising toward 1.0.
    Attack,
    /// Falling toward the sustain level.
    Decay,
    /// Holding the sustain level while the gate stays open.
    Sustain,
    /// Falling toward zero after the gate closed.
    Release,
}

/// Exponential ADSR envelope generator. Rates are in samples.
#[derive(Debug, Clone)]
pub struct Adsr {
    stage: AdsrStage,
    output: f32,
    attack_rate: f32,
    decay_rate: f32,
    release_rate: f32,
    sustain_level: f32,
    target_ratio_a: f32,
    target_ratio_dr: f32,
    attack_coef: f32,
    decay_coef: f32,
    release_coef: f32,
    attack_base: f32,
    decay_base: f32,
    release_base: f32,
}

impl Default for Adsr {
    fn default() -> Self {
        Self::new()
    }
}

fn coefficient(rate: f32, target_ratio: f32) -> f32 {
    if rate <= 0.0 {
        return 0.0;
    }
    (-((1.0 + target_ratio) / target_ratio).ln() / rate).exp()
}

impl Adsr {
    /// Creates an idle envelope with instant segments and full sustain.
    pub fn new() -> Self {
        let mut adsr = Self {
            stage: AdsrStage::Idle,
            output: 0.0,
            attack_rate: 0.0,
            decay_rate: 0.0,
            release_rate: 0.0,
            sustain_level: 1.0,
            target_ratio_a: 0.01,
            target_ratio_dr: 0.0001,
            attack_coef: 0.0,
            decay_coef: 0.0,
            release_coef: 0.0,
            attack_base: 0.0,
            decay_base: 0.0,
            release_base: 0.0,
        };
        adsr.update_bases();
        adsr
    }

    fn update_bases(&mut self) {
        self.attack_base = (1.0 + self.target_ratio_a) * (1.0 - self.attack_coef);
        self.decay_base = (self.sustain_level - self.target_ratio_dr) * (1.0 - self.decay_coef);
        self.release_base = -self.target_ratio_dr * (1.0 - self.release_coef);
    }

    /// Attack length in samples.
    pub fn set_attack_rate(&mut self, rate: f32) {
        self.attack_rate = rate;
        self.attack_coef = coefficient(rate, self.target_ratio_a);
        self.update_bases();
    }

    /// Decay length in samples.
    pub fn set_decay_rate(&mut self, rate: f32) {
        self.decay_rate = rate;
        self.decay_coef = coefficient(rate, self.target_ratio_dr);
        self.update_bases();
    }

    /// Release length in samples.
    pub fn set_release_rate(&mut self, rate: f32) {
        self.release_rate = rate;
        self.release_coef = coefficient(rate, self.target_ratio_dr);
        self.update_bases();
    }

    /// Level held during sustain.
    pub fn set_sustain_level(&mut self, level: f32) {
        self.sustain_level = level;
        self.update_bases();
    }

    /// Curve shape of the attack segment.
    pub fn set_target_ratio_a(&mut self, ratio: f32) {
        self.target_ratio_a = ratio.max(MIN_TARGET_RATIO);
        self.attack_coef = coefficient(self.attack_rate, self.target_ratio_a);
        self.update_bases();
    }

    /// Curve shape of the decay and release segments.
    pub fn set_target_ratio_dr(&mut self, ratio: f32) {
        self.target_ratio_dr = ratio.max(MIN_TARGET_RATIO);
        self.decay_coef = coefficient(self.decay_rate, self.target_ratio_dr);
        self.release_coef = coefficient(self.release_rate, self.target_ratio_dr);
        self.update_bases();
    }

    /// Opens (`gate > 0`) or closes the gate.
    ///
    /// Opening restarts the attack from the current level when idle or
    /// releasing; closing enters release unless already idle.
    pub fn gate(&mut self, gate: f32) {
        if gate > 0.0 {
            if matches!(self.stage, AdsrStage::Idle | AdsrStage::Release) {
                self.stage = AdsrStage::Attack;
            }
        } else if self.stage != AdsrStage::Idle {
            self.stage = AdsrStage::Release;
        }
    }

    /// Next envelope value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        match self.stage {
            AdsrStage::Attack => {
                self.output = self.attack_base + self.output * self.attack_coef;
                if self.output >= 1.0 {
                    self.output = 1.0;
                    self.stage = AdsrStage::Decay;
                }
            }
            AdsrStage::Decay => {
                self.output = self.decay_base + self.output * self.decay_coef;
                if self.output <= self.sustain_level {
                    self.output = self.sustain_level;
                    self.stage = AdsrStage::Sustain;
                }
            }
            AdsrStage::Release => {
                self.output = self.release_base + self.output * self.release_coef;
                if self.output <= 0.0 {
                    self.output = 0.0;
                    self.stage = AdsrStage::Idle;
                }
            }
            AdsrStage::Idle | AdsrStage::Sustain => {}
        }
        self.output
    }

    /// Forces the envelope to idle at zero.
    pub fn reset(&mut self) {
        self.stage = AdsrStage::Idle;
        self.output = 0.0;
    }

    /// Current stage.
    pub fn stage(&self) -> AdsrStage {
        self.stage
    }

    /// True when the envelope has fully released.
    pub fn is_idle(&self) -> bool {
        self.stage == AdsrStage::Idle
    }

    /// Applies settings given in seconds.
    pub fn configure(&mut self, settings: &AdsrSettings, sample_rate: f32) {
        self.set_target_ratio_a(settings.target_ratio_a);
        self.set_target_ratio_dr(settings.target_ratio_dr);
        self.set_attack_rate(settings.attack_rate * sample_rate);
        self.set_decay_rate(settings.decay_rate * sample_rate);
        self.set_release_rate(settings.release_rate * sample_rate);
        self.set_sustain_level(settings.sustain_level);
    }
}

/// Settings of the `adsr` module. Segment rates are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdsrSettings {
    /// Attack time in seconds.
    pub attack_rate: f32,
    /// Decay time in seconds.
    pub decay_rate: f32,
    /// Release time in seconds.
    pub release_rate: f32,
    /// Sustain level.
    pub sustain_level: f32,
    /// Attack curve ratio.
    pub target_ratio_a: f32,
    /// Decay and release curve ratio.
    #[serde(rename = "targetRatioDR")]
    pub target_ratio_dr: f32,
}

impl Default for AdsrSettings {
    fn default() -> Self {
        Self {
            attack_rate: 0.0,
            decay_rate: 0.0,
            release_rate: 0.0,
            sustain_level: 1.0,
            target_ratio_a: 0.01,
            target_ratio_dr: 0.0001,
        }
    }
}

/// Envelope module: inlet 0 is the gate, outlet 0 the envelope.
///
/// While the gate inlet is connected it is sampled every frame. Messages
/// accept the setting keys (seconds) plus `gate`.
#[derive(Debug, Clone)]
pub struct AdsrModule {
    adsr: Adsr,
    sample_rate: f32,
}

impl AdsrModule {
    /// Creates an envelope module.
    pub fn new(settings: &AdsrSettings, sample_rate: f32) -> Self {
        let mut adsr = Adsr::new();
        adsr.configure(settings, sample_rate);
        Self { adsr, sample_rate }
    }

    /// The wrapped envelope.
    pub fn envelope(&self) -> &Adsr {
        &self.adsr
    }
}

impl Module for AdsrModule {
    fn inlet_count(&self) -> usize {
        1
    }

    fn outlet_count(&self) -> usize {
        1
    }

    fn process(&mut self, inputs: Inputs<'_>, mut outputs: Outputs<'_>, _timestamp: u64) {
        let gate = inputs.connected(0);
        for (i, out) in outputs.get_mut(0).iter_mut().enumerate() {
            if let Some(&g) = gate.and_then(|buffer| buffer.get(i)) {
                self.adsr.gate(g);
            }
            *out = self.adsr.advance();
        }
    }

    fn receive_message(&mut self, message: &Message) {
        let sr = self.sample_rate;
        if let Some(gate) = number(message, "gate") {
            self.adsr.gate(gate);
        }
        if let Some(ratio) = number(message, "targetRatioA") {
            self.adsr.set_target_ratio_a(ratio);
        }
        if let Some(ratio) = number(message, "targetRatioDR") {
            self.adsr.set_target_ratio_dr(ratio);
        }
        if let Some(seconds) = number(message, "attackRate") {
            self.adsr.set_attack_rate(seconds * sr);
        }
        if let Some(seconds) = number(message, "decayRate") {
            self.adsr.set_decay_rate(seconds * sr);
        }
        if let Some(seconds) = number(message, "releaseRate") {
            self.adsr.set_release_rate(seconds * sr);
        }
        if let Some(level) = number(message, "sustainLevel") {
            self.adsr.set_sustain_level(level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::decode_settings;
    use crate::testing::Harness;
    use serde_json::json;

    fn timed(attack: f32, decay: f32, sustain: f32, release: f32) -> Adsr {
        let mut adsr = Adsr::new();
        adsr.set_attack_rate(attack);
        adsr.set_decay_rate(decay);
        adsr.set_sustain_level(sustain);
        adsr.set_release_rate(release);
        adsr
    }

    #[test]
    fn runs_through_every_stage() {
        let mut adsr = timed(10.0, 10.0, 0.5, 10.0);
        adsr.gate(1.0);
        let mut previous = 0.0;
        let mut steps = 0;
        while adsr.stage() == AdsrStage::Attack {
            let level = adsr.advance();
            assert!(level >= previous);
            previous = level;
            steps += 1;
            assert!(steps <= 12);
        }
        assert_eq!(previous, 1.0);
        assert_eq!(adsr.stage(), AdsrStage::Decay);

        for _ in 0..20 {
            adsr.advance();
        }
        assert_eq!(adsr.stage(), AdsrStage::Sustain);
        assert_eq!(adsr.advance(), 0.5);

        adsr.gate(0.0);
        for _ in 0..20 {
            adsr.advance();
        }
        assert!(adsr.is_idle());
        assert_eq!(adsr.advance(), 0.0);
    }

    #[test]
    fn zero_rates_are_instant() {
        let mut adsr = Adsr::new();
        adsr.gate(1.0);
        assert_eq!(adsr.advance(), 1.0);
        assert_eq!(adsr.advance(), 1.0);
        assert_eq!(adsr.stage(), AdsrStage::Sustain);
        adsr.gate(0.0);
        assert_eq!(adsr.advance(), 0.0);
        assert!(adsr.is_idle());
    }

    #[test]
    fn closing_idle_gate_stays_idle() {
        let mut adsr = Adsr::new();
        adsr.gate(0.0);
        assert!(adsr.is_idle());
    }

    #[test]
    fn gate_inlet_drives_module() {
        let settings: AdsrSettings = decode_settings(&json!({"sustainLevel": 0.25})).unwrap();
        let mut harness = Harness::new(Box::new(AdsrModule::new(&settings, 4.0)), 4, 4.0);
        harness.feed(0, vec![1.0, 1.0, 1.0, 0.0]);
        assert_eq!(harness.run()[0], vec![1.0, 0.25, 0.25, 0.0]);
    }

    #[test]
    fn message_opens_gate() {
        let module = AdsrModule::new(&AdsrSettings::default(), 4.0);
        let mut harness = Harness::new(Box::new(module), 2, 4.0);
        assert_eq!(harness.run()[0], vec![0.0, 0.0]);
        harness.send(&json!({"gate": 1.0, "sustainLevel": 0.5}));
        assert_eq!(harness.run()[0], vec![1.0, 0.5]);
    }
}
