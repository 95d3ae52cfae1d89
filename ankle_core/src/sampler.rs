// ankle_core/src/sampler.rs

//! Zero-order-hold lookup of the excitation and external-state series.
//!
//! Solver time is continuous while both input series are discrete. The
//! [`SampleClock`] is the single place where one becomes the other:
//! `index = floor(t * samples_per_unit)`. Input tables must already be
//! resampled onto that uniform grid; no interpolation happens here.

use tracing::warn;

use crate::error::{Channel, ModelError, ModelResult};
use crate::types::ExternalState;

/// Number of external-state channels the model consumes.
pub const EXTERNAL_CHANNELS: usize = 4;

/// Converts continuous solver time into a sample index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleClock {
    samples_per_unit: f64,
}

impl Default for SampleClock {
    /// One sample per unit of solver time, i.e. plain `floor(t)`.
    ///
    /// With a horizon shorter than one unit every lookup lands on index 0 and
    /// the inputs are effectively frozen at their first sample.
    fn default() -> Self {
        Self {
            samples_per_unit: 1.0,
        }
    }
}

impl SampleClock {
    pub fn new(samples_per_unit: f64) -> ModelResult<Self> {
        if !samples_per_unit.is_finite() || samples_per_unit <= 0.0 {
            return Err(ModelError::Configuration(format!(
                "samples_per_unit must be finite and positive, got {}",
                samples_per_unit
            )));
        }
        Ok(Self { samples_per_unit })
    }

    pub fn samples_per_unit(&self) -> f64 {
        self.samples_per_unit
    }

    /// Sample index for time `t`. Negative for negative times.
    pub fn index(&self, t: f64) -> i64 {
        (t * self.samples_per_unit).floor() as i64
    }

    /// Minimum series length that keeps every lookup on `[0, sim_time]` in range.
    pub fn required_len(&self, sim_time: f64) -> usize {
        self.index(sim_time).max(0) as usize + 1
    }
}

/// The commanded excitation `u`, one scalar per sample index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExcitationSeries(pub Vec<f64>);

impl ExcitationSeries {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// A series holding `value` for `len` samples.
    pub fn constant(value: f64, len: usize) -> Self {
        Self(vec![value; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One external channel: `(time, value)` rows as measured. Only the value is
/// read during lookup; the time column travels along for export.
pub type ChannelSamples = Vec<(f64, f64)>;

/// The four external-state channels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExternalSeries {
    pub channels: [ChannelSamples; EXTERNAL_CHANNELS],
}

impl ExternalSeries {
    pub fn new(channels: [ChannelSamples; EXTERNAL_CHANNELS]) -> Self {
        Self { channels }
    }

    /// All four channels hold zero for `len` samples on the given clock.
    pub fn flat(len: usize, clock: SampleClock) -> Self {
        Self::constant([0.0; EXTERNAL_CHANNELS], len, clock)
    }

    /// Each channel holds its own constant for `len` samples on the given clock.
    pub fn constant(values: [f64; EXTERNAL_CHANNELS], len: usize, clock: SampleClock) -> Self {
        let channel = |v: f64| -> ChannelSamples {
            (0..len)
                .map(|i| (i as f64 / clock.samples_per_unit(), v))
                .collect()
        };
        Self {
            channels: [
                channel(values[0]),
                channel(values[1]),
                channel(values[2]),
                channel(values[3]),
            ],
        }
    }

    /// Length of the shortest channel, which bounds every lookup.
    pub fn min_len(&self) -> usize {
        self.channels.iter().map(Vec::len).min().unwrap_or(0)
    }
}

/// Inputs applicable at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledInputs {
    pub excitation: f64,
    pub external: ExternalState,
}

/// Looks up the excitation and external state that apply at a given solver time.
#[derive(Debug, Clone)]
pub struct SignalSampler {
    excitation: ExcitationSeries,
    external: ExternalSeries,
    clock: SampleClock,
}

impl SignalSampler {
    pub fn new(excitation: ExcitationSeries, external: ExternalSeries, clock: SampleClock) -> Self {
        Self {
            excitation,
            external,
            clock,
        }
    }

    pub fn clock(&self) -> SampleClock {
        self.clock
    }

    pub fn excitation(&self) -> &ExcitationSeries {
        &self.excitation
    }

    pub fn external(&self) -> &ExternalSeries {
        &self.external
    }

    /// Checks up front that every series covers `[0, sim_time]`.
    pub fn check_horizon(&self, sim_time: f64) -> ModelResult<()> {
        let required = self.clock.required_len(sim_time);
        if self.excitation.len() < required {
            return Err(short_series(
                Channel::Excitation,
                self.excitation.len(),
                required,
                sim_time,
            ));
        }
        for (i, channel) in self.external.channels.iter().enumerate() {
            if channel.len() < required {
                return Err(short_series(Channel::External(i), channel.len(), required, sim_time));
            }
        }
        if self.clock.samples_per_unit() == 1.0 && sim_time < 1.0 {
            warn!(
                sim_time,
                "unit sample clock with a sub-unit horizon: inputs stay at sample 0 for the whole run"
            );
        }
        Ok(())
    }

    pub fn excitation_at(&self, t: f64) -> ModelResult<f64> {
        let index = self.checked_index(t, Channel::Excitation, self.excitation.len())?;
        Ok(self.excitation.0[index])
    }

    pub fn external_at(&self, t: f64) -> ModelResult<ExternalState> {
        let mut x_ext = ExternalState::zeros();
        for (i, channel) in self.external.channels.iter().enumerate() {
            let index = self.checked_index(t, Channel::External(i), channel.len())?;
            x_ext[i] = channel[index].1;
        }
        Ok(x_ext)
    }

    /// Samples both inputs at `t`.
    pub fn sample(&self, t: f64) -> ModelResult<SampledInputs> {
        Ok(SampledInputs {
            excitation: self.excitation_at(t)?,
            external: self.external_at(t)?,
        })
    }

    fn checked_index(&self, t: f64, channel: Channel, len: usize) -> ModelResult<usize> {
        let index = self.clock.index(t);
        if index < 0 || index as usize >= len {
            return Err(ModelError::InputBounds {
                channel,
                time: t,
                index,
                len,
                state: None,
            });
        }
        Ok(index as usize)
    }
}

fn short_series(channel: Channel, len: usize, required: usize, sim_time: f64) -> ModelError {
    ModelError::Configuration(format!(
        "{} series has {} samples but a horizon of {} needs at least {}",
        channel, len, sim_time, required
    ))
}
