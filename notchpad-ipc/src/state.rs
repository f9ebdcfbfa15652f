use serde::{Deserialize, Serialize};

/// Externally visible interaction state of the notch panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotchStatus {
    #[default]
    Closed,
    Popping,
    Opened,
}

/// Why the panel was opened. Decides whether it may close on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenReason {
    /// User initiated; stays open until explicitly closed.
    Click,
    /// Drop intent; closes once the pointer leaves the panel.
    Drag,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectInfo {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateInfo {
    pub status: NotchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<OpenReason>,
    pub display_id: Option<u32>,
    pub has_cutout: bool,
    pub device_notch_rect: Option<RectInfo>,
    pub screen_rect: Option<RectInfo>,
    /// Outline of the notch shape in its current state.
    #[serde(default)]
    pub shape_rect: Option<RectInfo>,
    #[serde(default)]
    pub corner_radius: f64,
    /// Content inset and spacing for whatever is hosted inside the panel.
    #[serde(default)]
    pub inset: f64,
    #[serde(default)]
    pub spacing: f64,
}

impl StateInfo {
    /// State reported while no overlay window exists.
    pub fn inactive() -> Self {
        Self {
            status: NotchStatus::Closed,
            reason: None,
            display_id: None,
            has_cutout: false,
            device_notch_rect: None,
            screen_rect: None,
            shape_rect: None,
            corner_radius: 0.0,
            inset: 0.0,
            spacing: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&NotchStatus::Popping).unwrap(),
            "\"popping\""
        );
        let status: NotchStatus = serde_json::from_str("\"closed\"").unwrap();
        assert_eq!(status, NotchStatus::Closed);
    }

    #[test]
    fn test_inactive_state_omits_reason() {
        let json = serde_json::to_string(&StateInfo::inactive()).unwrap();
        assert!(!json.contains("reason"));
        assert!(json.contains("\"display_id\":null"));

        let parsed: StateInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, StateInfo::inactive());
    }
}
