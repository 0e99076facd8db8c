//! Markup marks and skip-list computation.
//!
//! The persisted markup is a flat list of frame marks. The skip-list exposed
//! to players is recomputed from the whole markup on every update, so a
//! consumer polling the record always sees the cumulative, coalesced list.

use serde::{Deserialize, Serialize};

use super::MarkKind;

/// One markup entry: a frame number tagged with a mark kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    /// Frame number, recording-relative.
    pub frame: u64,
    /// What the mark delimits.
    pub kind: MarkKind,
}

impl Mark {
    pub fn start(frame: u64) -> Self {
        Self {
            frame,
            kind: MarkKind::BreakStart,
        }
    }

    pub fn end(frame: u64) -> Self {
        Self {
            frame,
            kind: MarkKind::BreakEnd,
        }
    }
}

/// A detected break: start/end frame pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakRegion {
    pub start: u64,
    pub end: u64,
}

impl BreakRegion {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }
}

/// Compute the coalesced skip-list from a markup mark sequence.
///
/// Marks are expected in append order: each break contributes a start mark
/// followed by an end mark, with starts non-decreasing. Unbalanced marks are
/// tolerated: a start without an end is dropped (the break is still being
/// written), an end without a start is ignored.
pub fn skip_list(marks: &[Mark]) -> Vec<BreakRegion> {
    let mut regions: Vec<BreakRegion> = Vec::new();
    let mut open: Option<u64> = None;

    for mark in marks {
        match mark.kind {
            MarkKind::BreakStart => open = Some(mark.frame),
            MarkKind::BreakEnd => {
                let Some(start) = open.take() else {
                    continue;
                };
                let region = BreakRegion::new(start, mark.frame);

                // Merge into the previous region when they touch or overlap.
                match regions.last_mut() {
                    Some(last) if region.start <= last.end => {
                        last.end = last.end.max(region.end);
                    }
                    _ => regions.push(region),
                }
            }
        }
    }

    regions
}

/// Render a skip-list as the wire string sent to players:
/// comma-joined `start:4,end:5` pairs in list order.
pub fn format_skip_list(regions: &[BreakRegion]) -> String {
    regions
        .iter()
        .map(|r| {
            format!(
                "{}:{},{}:{}",
                r.start,
                MarkKind::BreakStart.value(),
                r.end,
                MarkKind::BreakEnd.value()
            )
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_markup_gives_empty_list() {
        assert!(skip_list(&[]).is_empty());
        assert_eq!(format_skip_list(&[]), "");
    }

    #[test]
    fn pairs_marks_in_order() {
        let marks = [Mark::start(1200), Mark::end(1500), Mark::start(9000), Mark::end(9600)];
        let regions = skip_list(&marks);
        assert_eq!(
            regions,
            vec![BreakRegion::new(1200, 1500), BreakRegion::new(9000, 9600)]
        );
    }

    #[test]
    fn coalesces_overlapping_regions() {
        let marks = [Mark::start(100), Mark::end(300), Mark::start(250), Mark::end(400)];
        assert_eq!(skip_list(&marks), vec![BreakRegion::new(100, 400)]);
    }

    #[test]
    fn coalesces_touching_regions() {
        let marks = [Mark::start(100), Mark::end(300), Mark::start(300), Mark::end(450)];
        assert_eq!(skip_list(&marks), vec![BreakRegion::new(100, 450)]);
    }

    #[test]
    fn dangling_start_is_dropped() {
        let marks = [Mark::start(100), Mark::end(300), Mark::start(500)];
        assert_eq!(skip_list(&marks), vec![BreakRegion::new(100, 300)]);
    }

    #[test]
    fn stray_end_is_ignored() {
        let marks = [Mark::end(50), Mark::start(100), Mark::end(300)];
        assert_eq!(skip_list(&marks), vec![BreakRegion::new(100, 300)]);
    }

    #[test]
    fn format_matches_wire_shape() {
        let regions = [BreakRegion::new(1200, 1500), BreakRegion::new(9000, 9600)];
        assert_eq!(format_skip_list(&regions), "1200:4,1500:5,9000:4,9600:5");
    }

    #[test]
    fn append_then_recompute_roundtrips() {
        // Appending regions as mark pairs and recomputing must reproduce
        // exactly the appended regions, in insertion order.
        let appended = [
            BreakRegion::new(10, 20),
            BreakRegion::new(40, 60),
            BreakRegion::new(90, 95),
        ];

        let mut marks = Vec::new();
        for r in &appended {
            marks.push(Mark::start(r.start));
            marks.push(Mark::end(r.end));
        }

        assert_eq!(skip_list(&marks), appended.to_vec());
    }
}
