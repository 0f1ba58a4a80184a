use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle status a registry instance reports for itself.
///
/// Instances come up as `Starting`, flip to `Up` once serving, and
/// are marked `Down` when taken out of rotation. The wire format is
/// the uppercase name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, EnumString, Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum InstanceStatus {
    Up,
    Down,
    #[default]
    Starting,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_wire_names_are_uppercase() {
        assert_eq!(InstanceStatus::Up.to_string(), "UP");
        assert_eq!(InstanceStatus::Down.to_string(), "DOWN");
        assert_eq!(InstanceStatus::Starting.to_string(), "STARTING");

        assert_eq!(InstanceStatus::from_str("UP").unwrap(), InstanceStatus::Up);
        assert!(InstanceStatus::from_str("up").is_err());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&InstanceStatus::Starting).unwrap(),
            "\"STARTING\""
        );
        let parsed: InstanceStatus = serde_json::from_str("\"DOWN\"").unwrap();
        assert_eq!(parsed, InstanceStatus::Down);
    }
}
