use serde::{Deserialize, Serialize};

/// Detail panel currently in focus.
///
/// Selecting a run drills into `Tasks`; selecting a task drills into `Logs`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Panel {
    #[default]
    Runs,
    Tasks,
    Logs,
    Code,
    Lineage,
    Info,
}
