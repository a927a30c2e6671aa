use crate::{errors::RelayError, models::location::Location};
use serde::Serialize;

/// The range of locations a subscription wants. An absent end means the
/// window is open-ended: every future object qualifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubscribeWindow {
    start: Location,
    end: Option<Location>,
}

impl SubscribeWindow {
    pub fn new(start: Location, end: Option<Location>) -> Result<Self, RelayError> {
        if let Some(end) = end {
            if end < start {
                return Err(RelayError::ProtocolViolation(format!(
                    "subscribe window end ({:?}) precedes start ({:?})",
                    end, start
                )));
            }
        }

        Ok(Self { start, end })
    }

    pub fn start(&self) -> Location {
        self.start
    }

    pub fn end(&self) -> Option<Location> {
        self.end
    }

    pub fn is_open_ended(&self) -> bool {
        self.end.is_none()
    }

    pub fn contains(&self, location: Location) -> bool {
        if location < self.start {
            return false;
        }

        match self.end {
            Some(end) => location <= end,
            None => true,
        }
    }

    /// Whether the whole window lies before `location`. Used for lazy
    /// expiry of bounded windows once track progress has passed them.
    pub fn ends_before(&self, location: Location) -> bool {
        match self.end {
            Some(end) => end < location,
            None => false,
        }
    }
}

/// Tells a subscriber that the inclusive range `[from, to]` was evicted
/// before it could be delivered, so it can resynchronize or fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GapNotice {
    from: Location,
    to: Location,
}

impl GapNotice {
    pub fn new(from: Location, to: Location) -> Self {
        Self { from, to }
    }

    pub fn from(&self) -> Location {
        self.from
    }

    pub fn to(&self) -> Location {
        self.to
    }
}

#[cfg(test)]
mod success {
    use crate::models::{location::Location, range::SubscribeWindow};

    #[test]
    fn new_bounded() {
        let window = SubscribeWindow::new(Location::new(1, 0), Some(Location::new(3, 5))).unwrap();

        assert_eq!(window.start(), Location::new(1, 0));
        assert_eq!(window.end(), Some(Location::new(3, 5)));
        assert!(!window.is_open_ended());
    }

    #[test]
    fn new_open_ended() {
        let window = SubscribeWindow::new(Location::new(2, 0), None).unwrap();

        assert!(window.is_open_ended());
        assert!(window.contains(Location::new(1000, 1000)));
    }

    #[test]
    fn contains() {
        let window = SubscribeWindow::new(Location::new(1, 0), Some(Location::new(3, 5))).unwrap();

        assert!(!window.contains(Location::new(0, 9)));
        assert!(window.contains(Location::new(1, 0)));
        assert!(window.contains(Location::new(2, 100)));
        assert!(window.contains(Location::new(3, 5)));
        assert!(!window.contains(Location::new(3, 6)));
    }

    #[test]
    fn ends_before() {
        let window = SubscribeWindow::new(Location::new(1, 0), Some(Location::new(2, 0))).unwrap();
        let open = SubscribeWindow::new(Location::new(1, 0), None).unwrap();

        assert!(window.ends_before(Location::new(2, 1)));
        assert!(!window.ends_before(Location::new(2, 0)));
        assert!(!open.ends_before(Location::new(1000, 0)));
    }

    #[test]
    fn single_location_window() {
        let window = SubscribeWindow::new(Location::new(1, 1), Some(Location::new(1, 1))).unwrap();

        assert!(window.contains(Location::new(1, 1)));
    }
}

#[cfg(test)]
mod failure {
    use crate::{
        errors::RelayError,
        models::{location::Location, range::SubscribeWindow},
    };

    #[test]
    fn end_before_start() {
        let result = SubscribeWindow::new(Location::new(2, 0), Some(Location::new(1, 0)));

        assert!(matches!(result, Err(RelayError::ProtocolViolation(_))));
    }
}
