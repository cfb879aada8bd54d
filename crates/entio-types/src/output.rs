//! Output definitions: the designer-configured connections an entity owns.
//!
//! An [`OutputDefinition`] says "when output `output_name` fires, send
//! `input_name` to every entity matching `target_pattern`, after
//! `delay_seconds`, at most `fire_limit` times". The only mutable part is
//! the fired counter, which the registry advances and resets.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fire limit meaning "no limit". Any value `<= 0` is unlimited.
pub const UNLIMITED_FIRES: i32 = -1;

/// One configured output connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDefinition {
    /// Name of the output event this connection listens to (e.g. `OnTrigger`).
    #[serde(rename = "output")]
    pub output_name: String,

    /// Target-name pattern; may be empty, a special `!token`, or contain `*`.
    #[serde(rename = "target")]
    pub target_pattern: String,

    /// Input fired on every resolved target.
    #[serde(rename = "input")]
    pub input_name: String,

    /// Preconfigured arguments. When non-empty they replace runtime arguments.
    #[serde(default)]
    pub parameters: Vec<String>,

    /// Delay before delivery, in seconds. Zero delivers synchronously.
    #[serde(default, rename = "delay")]
    pub delay_seconds: f32,

    /// Maximum number of fires; `<= 0` means unlimited.
    #[serde(default = "default_fire_limit", rename = "times")]
    pub fire_limit: i32,

    /// Runtime fire counter. Never serialized.
    #[serde(skip)]
    fired_count: u32,
}

impl OutputDefinition {
    /// Create an unlimited, zero-delay output with no parameters.
    pub fn new(
        output_name: impl Into<String>,
        target_pattern: impl Into<String>,
        input_name: impl Into<String>,
    ) -> Self {
        Self {
            output_name: output_name.into(),
            target_pattern: target_pattern.into(),
            input_name: input_name.into(),
            parameters: Vec::new(),
            delay_seconds: 0.0,
            fire_limit: UNLIMITED_FIRES,
            fired_count: 0,
        }
    }

    /// Set the preconfigured parameter list.
    #[must_use]
    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    /// Set the delivery delay in seconds.
    #[must_use]
    pub const fn with_delay(mut self, delay_seconds: f32) -> Self {
        self.delay_seconds = delay_seconds;
        self
    }

    /// Set the fire limit (`<= 0` for unlimited).
    #[must_use]
    pub const fn with_fire_limit(mut self, fire_limit: i32) -> Self {
        self.fire_limit = fire_limit;
        self
    }

    /// Number of times this output has fired since spawn or the last reset.
    pub const fn fired_count(&self) -> u32 {
        self.fired_count
    }

    /// `true` if the output has no fire limit.
    pub const fn is_unlimited(&self) -> bool {
        self.fire_limit <= 0
    }

    /// `true` once a positive fire limit has been reached.
    pub fn is_exhausted(&self) -> bool {
        if self.is_unlimited() {
            return false;
        }
        u32::try_from(self.fire_limit).is_ok_and(|limit| self.fired_count >= limit)
    }

    /// Record one fire. Returns `false` (and changes nothing) if the output
    /// was already exhausted.
    pub fn record_fire(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.fired_count = self.fired_count.saturating_add(1);
        true
    }

    /// Clear the fire counter, making an exhausted output live again.
    pub const fn reset(&mut self) {
        self.fired_count = 0;
    }

    /// The delivery delay as a [`Duration`].
    ///
    /// Negative, NaN, or unrepresentable delays collapse to zero.
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f32(self.delay_seconds).unwrap_or(Duration::ZERO)
    }

    /// Arguments to deliver: the preconfigured parameters when present,
    /// otherwise the runtime arguments unchanged.
    pub fn effective_args(&self, runtime_args: &[String]) -> Vec<String> {
        if self.parameters.is_empty() {
            runtime_args.to_vec()
        } else {
            self.parameters.clone()
        }
    }
}

const fn default_fire_limit() -> i32 {
    UNLIMITED_FIRES
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn limited_output_exhausts_after_limit() {
        let mut output = OutputDefinition::new("OnTrigger", "door", "Open").with_fire_limit(2);
        assert!(output.record_fire());
        assert!(output.record_fire());
        assert!(output.is_exhausted());
        assert!(!output.record_fire());
        assert_eq!(output.fired_count(), 2);
    }

    #[test]
    fn non_positive_limit_is_unlimited() {
        for limit in [0, -1, -50] {
            let mut output = OutputDefinition::new("OnTrigger", "door", "Open").with_fire_limit(limit);
            for _ in 0..100 {
                assert!(output.record_fire());
            }
            assert!(!output.is_exhausted());
        }
    }

    #[test]
    fn reset_revives_exhausted_output() {
        let mut output = OutputDefinition::new("OnTrigger", "door", "Open").with_fire_limit(1);
        assert!(output.record_fire());
        assert!(output.is_exhausted());
        output.reset();
        assert_eq!(output.fired_count(), 0);
        assert!(output.record_fire());
    }

    #[test]
    fn parameters_override_runtime_args() {
        let runtime = vec!["runtime".to_owned()];
        let plain = OutputDefinition::new("OnTrigger", "door", "Open");
        assert_eq!(plain.effective_args(&runtime), runtime);

        let preset = plain.with_parameters(["preset"]);
        assert_eq!(preset.effective_args(&runtime), vec!["preset".to_owned()]);
    }

    #[test]
    fn invalid_delays_collapse_to_zero() {
        let base = OutputDefinition::new("OnTrigger", "door", "Open");
        assert_eq!(base.clone().with_delay(-1.0).delay(), Duration::ZERO);
        assert_eq!(base.clone().with_delay(f32::NAN).delay(), Duration::ZERO);
        assert_eq!(base.with_delay(0.5).delay(), Duration::from_millis(500));
    }

    #[test]
    fn deserializes_with_defaults() {
        let yaml = "output: OnOpen\ntarget: \"button_*\"\ninput: Lock\n";
        let output: OutputDefinition = serde_yml::from_str(yaml).unwrap();
        assert_eq!(output.output_name, "OnOpen");
        assert_eq!(output.target_pattern, "button_*");
        assert!(output.is_unlimited());
        assert!(output.parameters.is_empty());
        assert_eq!(output.delay(), Duration::ZERO);
        assert_eq!(output.fired_count(), 0);
    }
}
