//! Keyboard focus traversal across the tab strip

use crate::error::TabError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusDirection {
    First,
    Last,
    Left,
    Right,
    /// The selected tab
    Current,
}

impl FocusDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusDirection::First => "first",
            FocusDirection::Last => "last",
            FocusDirection::Left => "left",
            FocusDirection::Right => "right",
            FocusDirection::Current => "current",
        }
    }
}

impl std::str::FromStr for FocusDirection {
    type Err = TabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(FocusDirection::First),
            "last" => Ok(FocusDirection::Last),
            "left" => Ok(FocusDirection::Left),
            "right" => Ok(FocusDirection::Right),
            "current" => Ok(FocusDirection::Current),
            _ => Err(TabError::InvalidDirection(s.to_string())),
        }
    }
}

/// Index of the tab that should receive focus, or `None` to leave focus alone.
///
/// `focused_index` is the tab currently holding keyboard focus; when focus is
/// elsewhere, left/right move relative to `selected_index`. Movement stops at
/// both ends of the strip.
pub fn resolve(
    direction: FocusDirection,
    tab_count: usize,
    focused_index: Option<usize>,
    selected_index: usize,
) -> Option<usize> {
    if tab_count == 0 {
        return None;
    }

    let origin = focused_index
        .filter(|i| *i < tab_count)
        .unwrap_or(selected_index);

    match direction {
        FocusDirection::First => Some(0),
        FocusDirection::Last => Some(tab_count - 1),
        FocusDirection::Current => Some(selected_index),
        FocusDirection::Left => origin.checked_sub(1),
        FocusDirection::Right => (origin + 1 < tab_count).then_some(origin + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_directions() {
        assert_eq!(resolve(FocusDirection::First, 4, Some(2), 1), Some(0));
        assert_eq!(resolve(FocusDirection::Last, 4, Some(2), 1), Some(3));
        assert_eq!(resolve(FocusDirection::Current, 4, Some(2), 1), Some(1));
    }

    #[test]
    fn test_relative_to_focused_tab() {
        assert_eq!(resolve(FocusDirection::Left, 4, Some(2), 0), Some(1));
        assert_eq!(resolve(FocusDirection::Right, 4, Some(2), 0), Some(3));
    }

    #[test]
    fn test_falls_back_to_selected() {
        assert_eq!(resolve(FocusDirection::Right, 4, None, 1), Some(2));
        assert_eq!(resolve(FocusDirection::Left, 4, None, 1), Some(0));
    }

    #[test]
    fn test_no_wraparound() {
        assert_eq!(resolve(FocusDirection::Left, 4, Some(0), 2), None);
        assert_eq!(resolve(FocusDirection::Right, 4, Some(3), 2), None);
    }

    #[test]
    fn test_parse_direction() {
        assert_eq!("left".parse::<FocusDirection>().unwrap(), FocusDirection::Left);
        let err = "up".parse::<FocusDirection>().unwrap_err();
        assert_eq!(err, TabError::InvalidDirection("up".to_string()));
        assert_eq!(err.to_string(), "up is an invalid direction");
    }
}
