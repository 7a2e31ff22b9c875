use serde::{Deserialize, Serialize};

use crate::game_state::chess_types::Color;

/// Which sides have their moves carried out by the arm.
///
/// A human playing the light pieces moves them by hand while the arm plays
/// the dark pieces, so the default actuates dark only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuationPolicy {
    light: bool,
    dark: bool,
}

impl Default for ActuationPolicy {
    fn default() -> Self {
        Self::from_sides(&[Color::Dark])
    }
}

impl ActuationPolicy {
    pub fn from_sides(sides: &[Color]) -> Self {
        Self {
            light: sides.contains(&Color::Light),
            dark: sides.contains(&Color::Dark),
        }
    }

    /// Every move is made by hand, e.g. for tests or a board without an arm.
    pub const fn manual() -> Self {
        Self {
            light: false,
            dark: false,
        }
    }

    #[inline]
    pub fn requires_actuation(&self, side: Color) -> bool {
        match side {
            Color::Light => self.light,
            Color::Dark => self.dark,
        }
    }

    pub fn sides(&self) -> Vec<Color> {
        Color::ALL
            .into_iter()
            .filter(|&side| self.requires_actuation(side))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::ActuationPolicy;
    use crate::game_state::chess_types::Color;

    #[test]
    fn default_actuates_dark_only() {
        let policy = ActuationPolicy::default();
        assert!(policy.requires_actuation(Color::Dark));
        assert!(!policy.requires_actuation(Color::Light));
        assert_eq!(policy.sides(), vec![Color::Dark]);
    }

    #[test]
    fn manual_and_both() {
        assert!(ActuationPolicy::manual().sides().is_empty());
        assert_eq!(
            ActuationPolicy::from_sides(&[Color::Light, Color::Dark]).sides(),
            vec![Color::Light, Color::Dark]
        );
    }
}
