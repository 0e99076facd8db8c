//! Preset file matching.
//!
//! File format: one rule per line, `pattern,thresh,minquiet,mindetect,
//! minbreak,maxsep,pad` with trailing fields optional. `#` lines and blank
//! lines are ignored. The pattern is a case-insensitive regular expression
//! anchored at the start, matched against the recording title and the
//! channel callsign; the first matching line in file order wins.

use std::fs;
use std::path::Path;

use regex::RegexBuilder;

use super::params::ParameterSet;

/// Apply the first matching rule from a preset file.
///
/// Every failure mode degrades: unreadable file, no matching line, or an
/// invalid pattern all leave `params` as-is (aside from logging).
pub fn apply_preset_file(
    params: ParameterSet,
    path: &Path,
    title: &str,
    callsign: &str,
) -> ParameterSet {
    tracing::debug!("using preset file \"{}\"", path.display());

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::error!("presets file \"{}\" not found: {}", path.display(), e);
            return params;
        }
    };

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();
        let pattern = fields[0].trim();

        // Anchor at the start; the rule author writes plain `re.match`-style
        // patterns, not full-string ones.
        let regex = match RegexBuilder::new(&format!("^(?:{})", pattern))
            .case_insensitive(true)
            .build()
        {
            Ok(regex) => regex,
            Err(e) => {
                tracing::warn!("skipping preset rule with bad pattern \"{}\": {}", pattern, e);
                continue;
            }
        };

        if regex.is_match(title) || regex.is_match(callsign) {
            tracing::info!("using preset \"{}\"", line);
            return params.apply_fields(&fields[1..]);
        }
    }

    tracing::info!("no preset found for \"{}\" or \"{}\"", title, callsign);
    params
}
