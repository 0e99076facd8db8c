//! The ordered detection parameter set.

/// Parameter names in the fixed positional order the detector expects.
pub const PARAM_NAMES: [&str; 6] = [
    "thresh", "minquiet", "mindetect", "minbreak", "maxsep", "pad",
];

/// Built-in default value for each parameter, same order as [`PARAM_NAMES`].
const PARAM_DEFAULTS: [f64; 6] = [-75.0, 0.16, 6.0, 120.0, 120.0, 0.48];

/// The six tuning values handed to the detector, in fixed order.
///
/// Immutable value type: override application returns a new set, so a
/// resolver can never contaminate a later run through shared state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSet {
    values: [f64; 6],
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            values: PARAM_DEFAULTS,
        }
    }
}

impl ParameterSet {
    /// Apply positional override fields, returning the updated set.
    ///
    /// Fields map onto [`PARAM_NAMES`] by position; extra fields are
    /// ignored, missing ones keep their current value. An empty field keeps
    /// the current value silently; an unparseable or non-finite field keeps
    /// it with a warning.
    pub fn apply_fields(&self, fields: &[&str]) -> Self {
        let mut next = *self;
        for (i, raw) in fields.iter().take(PARAM_NAMES.len()).enumerate() {
            if let Some(value) = validate_field(PARAM_NAMES[i], raw) {
                next.values[i] = value;
            }
        }
        next
    }

    /// Apply a comma-separated override string, e.g. `"-70,0.2,,150,,"`.
    pub fn apply_arg_string(&self, line: &str) -> Self {
        if line.is_empty() {
            return *self;
        }
        tracing::debug!("parsing presets from \"{}\"", line);
        let fields: Vec<&str> = line.split(',').collect();
        self.apply_fields(&fields)
    }

    /// Look up a value by parameter name.
    pub fn get(&self, name: &str) -> Option<f64> {
        PARAM_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.values[i])
    }

    /// The values in fixed order.
    pub fn values(&self) -> &[f64; 6] {
        &self.values
    }

    /// Serialize to the positional argument vector passed to the detector.
    pub fn to_args(&self) -> Vec<String> {
        self.values.iter().map(|v| v.to_string()).collect()
    }
}

/// Parse one override field; `None` means "keep the current value".
fn validate_field(name: &str, raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            tracing::warn!("preset {} (\"{}\") is invalid - using default", name, raw);
            None
        }
    }
}
