//! Declarative generation parameters.
//!
//! A list of `{id, name, type, options}` records is resolved once at startup:
//! every numeric definition takes the midpoint of its range. Overrides from
//! the command line or settings file are applied afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fs, path::Path};
use thiserror::Error;

pub(crate) const NUM_FISH: &str = "num_fish";
pub(crate) const NUM_BUBBLES: &str = "num_bubbles";
pub(crate) const BACKGROUND_VISIBILITY: &str = "background_visibility";

#[derive(Error, Debug, PartialEq)]
pub(crate) enum ParamError {
    #[error("unknown parameter `{0}`")]
    Unknown(String),

    #[error("parameter `{0}` is not numeric")]
    NotNumeric(String),

    #[error("malformed override `{0}`, expected id=value")]
    Malformed(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ParamKind {
    Number,
    #[serde(other)]
    Other,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct NumberOptions {
    pub(crate) min: f64,
    pub(crate) max: f64,
    #[serde(default)]
    pub(crate) step: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct ParamDef {
    pub(crate) id: String,
    pub(crate) name: String,
    #[serde(rename = "type")]
    pub(crate) kind: ParamKind,
    #[serde(default)]
    pub(crate) options: NumberOptions,
}

impl ParamDef {
    fn number(id: &str, name: &str, min: f64, max: f64, step: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: ParamKind::Number,
            options: NumberOptions { min, max, step },
        }
    }

    fn midpoint(&self) -> f64 {
        (self.options.min + self.options.max) / 2.0
    }

    /// Clamp into range, then snap to the step grid anchored at `min`.
    fn conform(&self, v: f64) -> f64 {
        let NumberOptions { min, max, step } = self.options;
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        let v = v.clamp(lo, hi);
        if step > 0.0 {
            (lo + ((v - lo) / step).round() * step).clamp(lo, hi)
        } else {
            v
        }
    }
}

pub(crate) fn default_definitions() -> Vec<ParamDef> {
    vec![
        ParamDef::number(NUM_FISH, "Number of Fish", 5.0, 20.0, 1.0),
        ParamDef::number(NUM_BUBBLES, "Number of Bubbles", 5.0, 30.0, 1.0),
        ParamDef::number(BACKGROUND_VISIBILITY, "Background Visibility", 0.0, 9.0, 1.0),
    ]
}

pub(crate) fn load_definitions(path: &Path) -> anyhow::Result<Vec<ParamDef>> {
    let s = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&s)?)
}

/// Resolved parameter values keyed by id.
#[derive(Clone, Debug, Default)]
pub(crate) struct ParamTable {
    defs: Vec<ParamDef>,
    values: BTreeMap<String, f64>,
}

impl ParamTable {
    pub(crate) fn resolve(defs: Vec<ParamDef>) -> Self {
        let values = defs
            .iter()
            .filter(|d| d.kind == ParamKind::Number)
            .map(|d| (d.id.clone(), d.midpoint()))
            .collect();
        Self { defs, values }
    }

    pub(crate) fn get(&self, id: &str) -> Option<f64> {
        self.values.get(id).copied()
    }

    /// Value read the way a `for (i = 0; i < v; i++)` loop consumes it.
    pub(crate) fn count(&self, id: &str) -> Option<usize> {
        self.get(id).map(|v| v.max(0.0).ceil() as usize)
    }

    pub(crate) fn set(&mut self, id: &str, value: f64) -> Result<f64, ParamError> {
        let def = self
            .defs
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| ParamError::Unknown(id.to_string()))?;
        if def.kind != ParamKind::Number {
            return Err(ParamError::NotNumeric(id.to_string()));
        }
        let v = def.conform(value);
        self.values.insert(id.to_string(), v);
        Ok(v)
    }

    /// Apply an `id=value` override string.
    pub(crate) fn apply_override(&mut self, arg: &str) -> Result<f64, ParamError> {
        let (id, raw) = arg
            .split_once('=')
            .ok_or_else(|| ParamError::Malformed(arg.to_string()))?;
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|_| ParamError::Malformed(arg.to_string()))?;
        self.set(id.trim(), value)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(NUM_FISH, 12.5)]
    #[case(NUM_BUBBLES, 17.5)]
    #[case(BACKGROUND_VISIBILITY, 4.5)]
    fn defaults_resolve_to_midpoint(#[case] id: &str, #[case] want: f64) {
        let t = ParamTable::resolve(default_definitions());
        assert_eq!(t.get(id), Some(want));
    }

    #[test]
    fn counts_follow_loop_semantics() {
        let t = ParamTable::resolve(default_definitions());
        assert_eq!(t.count(NUM_FISH), Some(13));
        assert_eq!(t.count(NUM_BUBBLES), Some(18));
    }

    #[test]
    fn unknown_lookup_is_none() {
        let t = ParamTable::resolve(default_definitions());
        assert_eq!(t.get("num_whales"), None);
    }

    #[test]
    fn non_numeric_definitions_are_skipped() {
        let json = r#"[
            {"id": "num_fish", "name": "Fish", "type": "number", "options": {"min": 2, "max": 4, "step": 1}},
            {"id": "palette", "name": "Palette", "type": "select", "options": {"min": 0, "max": 0}}
        ]"#;
        let defs: Vec<ParamDef> = serde_json::from_str(json).expect("valid json");
        let mut t = ParamTable::resolve(defs);
        assert_eq!(t.get("num_fish"), Some(3.0));
        assert_eq!(t.get("palette"), None);
        assert_eq!(
            t.set("palette", 1.0),
            Err(ParamError::NotNumeric("palette".into()))
        );
    }

    #[rstest]
    #[case("num_fish=18", 18.0)]
    #[case("num_fish=99", 20.0)]
    #[case("num_fish=-4", 5.0)]
    #[case("num_fish = 7.6", 8.0)]
    #[case("background_visibility=2.2", 2.0)]
    fn overrides_clamp_and_snap(#[case] arg: &str, #[case] want: f64) {
        let mut t = ParamTable::resolve(default_definitions());
        assert_eq!(t.apply_override(arg), Ok(want));
    }

    #[test]
    fn override_errors() {
        let mut t = ParamTable::resolve(default_definitions());
        assert_eq!(
            t.apply_override("num_sharks=3"),
            Err(ParamError::Unknown("num_sharks".into()))
        );
        assert!(matches!(
            t.apply_override("num_fish"),
            Err(ParamError::Malformed(_))
        ));
        assert!(matches!(
            t.apply_override("num_fish=lots"),
            Err(ParamError::Malformed(_))
        ));
    }
}
