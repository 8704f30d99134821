//! Fixed view directions for the six-camera rig

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One of the six axis-aligned directions the rig looks from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewDirection {
    Front,
    Back,
    Left,
    Right,
    Top,
    Bottom,
}

impl ViewDirection {
    /// All directions in canonical export order
    pub const ALL: [ViewDirection; 6] = [
        ViewDirection::Front,
        ViewDirection::Back,
        ViewDirection::Left,
        ViewDirection::Right,
        ViewDirection::Top,
        ViewDirection::Bottom,
    ];

    /// Lowercase name used in filenames, events and the CLI
    pub fn name(&self) -> &'static str {
        match self {
            ViewDirection::Front => "front",
            ViewDirection::Back => "back",
            ViewDirection::Left => "left",
            ViewDirection::Right => "right",
            ViewDirection::Top => "top",
            ViewDirection::Bottom => "bottom",
        }
    }

    /// Unit vector from the orbit target towards the camera
    pub fn unit_vector(&self) -> Vec3 {
        match self {
            ViewDirection::Front => Vec3::Z,
            ViewDirection::Back => Vec3::NEG_Z,
            ViewDirection::Left => Vec3::NEG_X,
            ViewDirection::Right => Vec3::X,
            ViewDirection::Top => Vec3::Y,
            ViewDirection::Bottom => Vec3::NEG_Y,
        }
    }

    /// Camera up vector. Top and bottom use the Z axis so they never
    /// collapse onto the view direction.
    pub fn up_vector(&self) -> Vec3 {
        match self {
            ViewDirection::Top => Vec3::NEG_Z,
            ViewDirection::Bottom => Vec3::Z,
            _ => Vec3::Y,
        }
    }

    /// Stable slot index into per-view arrays
    pub fn index(&self) -> usize {
        match self {
            ViewDirection::Front => 0,
            ViewDirection::Back => 1,
            ViewDirection::Left => 2,
            ViewDirection::Right => 3,
            ViewDirection::Top => 4,
            ViewDirection::Bottom => 5,
        }
    }
}

impl fmt::Display for ViewDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a view name does not match any direction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown view name '{0}'")]
pub struct UnknownView(pub String);

impl FromStr for ViewDirection {
    type Err = UnknownView;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ViewDirection::ALL
            .iter()
            .copied()
            .find(|d| d.name() == lower)
            .ok_or_else(|| UnknownView(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, dir) in ViewDirection::ALL.iter().enumerate() {
            assert_eq!(dir.index(), i);
        }
    }

    #[test]
    fn test_up_is_never_parallel_to_view() {
        for dir in ViewDirection::ALL {
            let cross = dir.unit_vector().cross(dir.up_vector());
            assert!(cross.length() > 0.99, "{} has degenerate up vector", dir);
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("front".parse::<ViewDirection>(), Ok(ViewDirection::Front));
        assert_eq!(" Bottom ".parse::<ViewDirection>(), Ok(ViewDirection::Bottom));
        assert!("diagonal".parse::<ViewDirection>().is_err());
    }
}
