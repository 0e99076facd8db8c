//! Detection tuning presets.
//!
//! A run's six tuning values come from (in priority order) an explicit
//! command-line string, a preset file matched against the recording's
//! metadata, or the built-in defaults. Resolution never fails: bad input
//! degrades to the default value for that field, with a warning.

mod params;
mod rules;

use std::path::Path;

pub use params::{ParameterSet, PARAM_NAMES};

/// Resolve the parameter set for a run.
///
/// `explicit` wins over `preset_file`; with neither, the defaults are used
/// unchanged.
pub fn resolve(
    explicit: Option<&str>,
    preset_file: Option<&Path>,
    title: &str,
    callsign: &str,
) -> ParameterSet {
    let params = ParameterSet::default();

    if let Some(arg) = explicit {
        params.apply_arg_string(arg)
    } else if let Some(path) = preset_file {
        rules::apply_preset_file(params, path, title, callsign)
    } else {
        params
    }
}
