//! Light tracker view pushed to observers whenever the tracker changes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightView {
    pub item_id: Uuid,
    pub name: String,
    pub remaining_secs: f64,
    /// Whole minutes left, rounded up; `None` means "less than a minute".
    pub remaining_minutes: Option<u32>,
    pub progress: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerLightsView {
    pub actor_id: Uuid,
    pub name: String,
    pub lights: Vec<LightView>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightTrackerView {
    pub enabled: bool,
    pub paused: bool,
    pub owners: Vec<OwnerLightsView>,
}

impl LightTrackerView {
    pub fn light_count(&self) -> usize {
        self.owners.iter().map(|o| o.lights.len()).sum()
    }

    pub fn find_light(&self, item_id: Uuid) -> Option<&LightView> {
        self.owners
            .iter()
            .flat_map(|o| o.lights.iter())
            .find(|l| l.item_id == item_id)
    }
}
