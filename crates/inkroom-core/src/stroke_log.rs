//! The ordered log of visible strokes and its undo reconciliation.
//!
//! Order is arrival order at this client, not creation time. Entries are
//! never edited in place; the only removal is [`StrokeLog::reconcile_undo`].

use crate::stroke::Stroke;

/// Ordered, append-only log of strokes currently on the canvas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrokeLog {
    strokes: Vec<Stroke>,
}

impl StrokeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a stroke to the tail.
    pub fn append(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    /// Remove the tail-most stroke authored by `author_id`.
    ///
    /// Scans from tail to head and removes the first match, so strokes by
    /// other authors that arrived later are left in place. Returns the
    /// removed stroke, or `None` when the author has nothing in the log.
    pub fn reconcile_undo(&mut self, author_id: &str) -> Option<Stroke> {
        let index = self.strokes.iter().rposition(|s| s.is_by(author_id))?;
        Some(self.strokes.remove(index))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stroke> {
        self.strokes.iter()
    }

    pub fn as_slice(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Number of strokes authored by `author_id`.
    pub fn count_by(&self, author_id: &str) -> usize {
        self.strokes.iter().filter(|s| s.is_by(author_id)).count()
    }

    /// Total points across every stroke; the cost of one full replay.
    pub fn total_points(&self) -> usize {
        self.strokes.iter().map(Stroke::len).sum()
    }
}

impl<'a> IntoIterator for &'a StrokeLog {
    type Item = &'a Stroke;
    type IntoIter = std::slice::Iter<'a, Stroke>;

    fn into_iter(self) -> Self::IntoIter {
        self.strokes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::StrokeColor;
    use kurbo::Point;

    fn stroke(author: &str, x: f64) -> Stroke {
        Stroke::new(
            author,
            StrokeColor::black(),
            2.0,
            vec![Point::new(x, 0.0), Point::new(x + 1.0, 1.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_append_keeps_arrival_order() {
        let mut log = StrokeLog::new();
        log.append(stroke("a", 0.0));
        log.append(stroke("b", 1.0));
        let authors: Vec<_> = log.iter().map(Stroke::author_id).collect();
        assert_eq!(authors, ["a", "b"]);
    }

    #[test]
    fn test_undo_removes_tail_most_match() {
        let s1 = stroke("a", 1.0);
        let s2 = stroke("b", 2.0);
        let s3 = stroke("a", 3.0);
        let mut log = StrokeLog::new();
        log.append(s1.clone());
        log.append(s2.clone());
        log.append(s3.clone());

        let removed = log.reconcile_undo("a");

        assert_eq!(removed, Some(s3));
        assert_eq!(log.as_slice(), &[s1, s2]);
    }

    #[test]
    fn test_undo_without_match_is_noop() {
        let mut log = StrokeLog::new();
        log.append(stroke("a", 0.0));
        log.append(stroke("b", 1.0));
        let before = log.clone();

        assert!(log.reconcile_undo("x").is_none());
        assert_eq!(log, before);
    }

    #[test]
    fn test_undo_on_empty_log() {
        let mut log = StrokeLog::new();
        assert!(log.reconcile_undo("a").is_none());
        assert!(log.is_empty());
    }

    #[test]
    fn test_n_appends_then_n_undos_empties_log() {
        let mut log = StrokeLog::new();
        for i in 0..7 {
            log.append(stroke("a", f64::from(i)));
        }
        for _ in 0..7 {
            assert!(log.reconcile_undo("a").is_some());
        }
        assert!(log.is_empty());
    }

    #[test]
    fn test_undo_skips_later_strokes_by_others() {
        let mut log = StrokeLog::new();
        log.append(stroke("a", 0.0));
        log.append(stroke("b", 1.0));
        log.append(stroke("b", 2.0));

        log.reconcile_undo("a");

        assert_eq!(log.len(), 2);
        assert_eq!(log.count_by("a"), 0);
        assert_eq!(log.count_by("b"), 2);
    }

    #[test]
    fn test_total_points() {
        let mut log = StrokeLog::new();
        log.append(stroke("a", 0.0));
        log.append(stroke("b", 0.0));
        assert_eq!(log.total_points(), 4);
    }
}
