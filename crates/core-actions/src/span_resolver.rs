//! Motion span resolver.
//!
//! A motion run from the caret yields a target (or a full span for text
//! objects and searches). This module turns that into the region a pending
//! operator acts on, or into a new visual selection:
//!
//! * Linewise motions cover whole lines between both ends.
//! * Inclusive motions take the character under the far end.
//! * An exclusive motion that ends in column 0 of a later line stops at the
//!   end of the previous line instead; when it also started at or before
//!   the first non-blank it becomes linewise (`:h exclusive-linewise`).
//!
//! Nothing here touches the buffer.

use crate::action::{MoveOutcome, MovementSpec, OpRange};
use core_text::{Cursor, Position, TextSource};

/// A motion outcome with the movement's defaults applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Resolved {
    pub start: Position,
    pub stop: Position,
    pub inclusive: bool,
    pub linewise: bool,
    /// The span came from a text object (its start replaces the origin).
    pub explicit_start: bool,
}

/// `None` when the motion failed.
pub(crate) fn settle(spec: &MovementSpec, outcome: MoveOutcome, origin: Position) -> Option<Resolved> {
    match outcome {
        MoveOutcome::Failed => None,
        MoveOutcome::To(stop) => Some(Resolved {
            start: origin,
            stop,
            inclusive: spec.inclusive,
            linewise: spec.linewise,
            explicit_start: false,
        }),
        MoveOutcome::Span(r) => Some(Resolved {
            start: r.start.unwrap_or(origin),
            stop: r.stop,
            inclusive: r.inclusive.unwrap_or(spec.inclusive),
            linewise: r.linewise.unwrap_or(spec.linewise),
            explicit_start: r.start.is_some(),
        }),
    }
}

/// The region an operator covers for a resolved motion.
pub(crate) fn operator_range<S: TextSource + ?Sized>(src: &S, r: &Resolved, text_object: bool) -> OpRange {
    let (a, b) = if r.start <= r.stop { (r.start, r.stop) } else { (r.stop, r.start) };
    if r.linewise {
        return OpRange::lines(a.line, b.line);
    }
    if r.inclusive {
        let len = src.line_len(b.line);
        let end = if b.character < len { b.with_character(b.character + 1) } else { b.with_character(len) };
        return OpRange::charwise(a, end);
    }
    if !text_object && b.character == 0 && b.line > a.line {
        let prev = b.line - 1;
        if a.character <= a.first_non_blank(src).character {
            return OpRange::lines(a.line, prev);
        }
        return OpRange::charwise(a, Position::new(prev, src.line_len(prev)));
    }
    OpRange::charwise(a, b)
}

/// Whether an operator has nothing to act on.
pub(crate) fn is_empty(r: &OpRange) -> bool {
    r.mode == core_state::RegisterMode::CharacterWise && r.start == r.end
}

/// The selection after a motion in visual mode. Motions move the active
/// end; text objects replace or extend the selection with their span.
/// Returns the new selection and whether it should become linewise.
pub(crate) fn visual_selection<S: TextSource + ?Sized>(src: &S, selection: Cursor, r: &Resolved) -> (Cursor, bool) {
    if !r.explicit_start {
        return (Cursor::new(selection.start, r.stop), false);
    }
    // Spans are end-exclusive unless marked inclusive; a selection's stop is
    // the last selected character.
    let last = if r.inclusive || r.stop <= r.start {
        r.stop
    } else {
        r.stop.get_left_through_line_breaks(src, true)
    };
    let start = if selection.is_empty() { r.start } else { selection.start.min(r.start) };
    (Cursor::new(start, last.max(start)), r.linewise)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{MoveOutcome, MovementResult};
    use core_state::RegisterMode;
    use pretty_assertions::assert_eq;

    fn p(line: usize, character: usize) -> Position {
        Position::new(line, character)
    }

    fn noop(_: &mut crate::action::Cx<'_>, pos: Position, _: usize) -> MoveOutcome {
        MoveOutcome::To(pos)
    }

    struct Case {
        name: &'static str,
        spec: MovementSpec,
        origin: Position,
        outcome: MoveOutcome,
        want: OpRange,
    }

    #[test]
    fn composition_rules() {
        let src = vec!["  one two".to_string(), "three".to_string(), "four".to_string()];
        let cases = [
            Case {
                name: "exclusive stays exclusive",
                spec: MovementSpec::exclusive(noop),
                origin: p(0, 2),
                outcome: MoveOutcome::To(p(0, 6)),
                want: OpRange::charwise(p(0, 2), p(0, 6)),
            },
            Case {
                name: "inclusive takes the far character",
                spec: MovementSpec::inclusive(noop),
                origin: p(0, 2),
                outcome: MoveOutcome::To(p(0, 4)),
                want: OpRange::charwise(p(0, 2), p(0, 5)),
            },
            Case {
                name: "backward motion is normalized",
                spec: MovementSpec::exclusive(noop),
                origin: p(0, 6),
                outcome: MoveOutcome::To(p(0, 2)),
                want: OpRange::charwise(p(0, 2), p(0, 6)),
            },
            Case {
                name: "column zero from first non-blank becomes linewise",
                spec: MovementSpec::exclusive(noop),
                origin: p(0, 2),
                outcome: MoveOutcome::To(p(2, 0)),
                want: OpRange::lines(0, 1),
            },
            Case {
                name: "column zero from mid-line stops at previous line end",
                spec: MovementSpec::exclusive(noop),
                origin: p(0, 6),
                outcome: MoveOutcome::To(p(1, 0)),
                want: OpRange::charwise(p(0, 6), p(0, 9)),
            },
            Case {
                name: "linewise covers whole lines",
                spec: MovementSpec::linewise(noop),
                origin: p(2, 3),
                outcome: MoveOutcome::To(p(1, 1)),
                want: OpRange::lines(1, 2),
            },
            Case {
                name: "span override wins over the movement defaults",
                spec: MovementSpec::exclusive(noop),
                origin: p(0, 0),
                outcome: MoveOutcome::Span(MovementResult::to(p(0, 3)).inclusive(true)),
                want: OpRange::charwise(p(0, 0), p(0, 4)),
            },
        ];
        for case in cases {
            let r = settle(&case.spec, case.outcome, case.origin).unwrap();
            assert_eq!(operator_range(&src, &r, false), case.want, "{}", case.name);
        }
    }

    #[test]
    fn failed_motion_resolves_to_nothing() {
        assert!(settle(&MovementSpec::exclusive(noop), MoveOutcome::Failed, p(0, 0)).is_none());
    }

    #[test]
    fn text_object_span_becomes_visual_selection() {
        let src = vec!["foo bar".to_string()];
        let r = settle(
            &MovementSpec::exclusive(noop).text_object(),
            MoveOutcome::Span(MovementResult::span(p(0, 4), p(0, 7))),
            p(0, 5),
        )
        .unwrap();
        let (sel, linewise) = visual_selection(&src, Cursor::at(p(0, 5)), &r);
        assert_eq!(sel, Cursor::new(p(0, 4), p(0, 6)));
        assert!(!linewise);
        assert!(is_empty(&OpRange::charwise(p(0, 1), p(0, 1))));
        assert_eq!(OpRange::lines(0, 0).mode, RegisterMode::LineWise);
    }
}
