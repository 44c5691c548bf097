/// Position within a fixed, non-empty list of questions.
///
/// Moving past either end is a silent clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigator {
    index: usize,
    total: usize,
}

impl Navigator {
    /// Returns `None` when there is nothing to navigate.
    #[must_use]
    pub fn new(total: usize) -> Option<Self> {
        (total > 0).then_some(Self { index: 0, total })
    }

    /// Advance one question. Returns whether the index moved.
    pub fn go_next(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Step back one question. Returns whether the index moved.
    pub fn go_previous(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.index -= 1;
        true
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }

    /// `(index + 1) / total`, always in `(0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_fraction(&self) -> f64 {
        (self.index + 1) as f64 / self.total as f64
    }

    /// Progress as a whole percentage, rounded to nearest.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn progress_percent(&self) -> u8 {
        (self.progress_fraction() * 100.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_has_no_navigator() {
        assert!(Navigator::new(0).is_none());
    }

    #[test]
    fn next_clamps_at_last() {
        let mut nav = Navigator::new(3).unwrap();
        assert!(nav.go_next());
        assert!(nav.go_next());
        assert_eq!(nav.index(), 2);
        assert!(!nav.go_next());
        assert_eq!(nav.index(), 2);
        assert!(nav.is_last());
    }

    #[test]
    fn previous_clamps_at_first() {
        let mut nav = Navigator::new(3).unwrap();
        assert!(!nav.go_previous());
        assert_eq!(nav.index(), 0);
        assert!(nav.is_first());
    }

    #[test]
    fn progress_tracks_index() {
        let mut nav = Navigator::new(3).unwrap();
        let mut last = nav.progress_fraction();
        assert!(last > 0.0);
        assert_eq!(nav.progress_percent(), 33);
        nav.go_next();
        assert!(nav.progress_fraction() >= last);
        last = nav.progress_fraction();
        assert_eq!(nav.progress_percent(), 67);
        nav.go_next();
        assert!(nav.progress_fraction() >= last);
        assert!((nav.progress_fraction() - 1.0).abs() < f64::EPSILON);
        assert_eq!(nav.progress_percent(), 100);
    }

    #[test]
    fn single_question_is_first_and_last() {
        let nav = Navigator::new(1).unwrap();
        assert!(nav.is_first());
        assert!(nav.is_last());
        assert_eq!(nav.progress_percent(), 100);
    }
}
