use serde::{Deserialize, Serialize};

use huemor_model::{ColourName, HexColour, Phase};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiColour {
    pub name: ColourName,
    pub mood: String,
    pub hex: HexColour,
    pub selected: bool,
}

/// Snapshot of the session pushed to the UI after every handled message.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub phase: Phase,
    pub colours: Vec<UiColour>,
    pub joke: String,
}
