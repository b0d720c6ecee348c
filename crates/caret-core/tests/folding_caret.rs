use caret_core::{EditorView, FoldRegion, LogicalPosition, VisualPosition};

fn collapsed(start: usize, end: usize) -> FoldRegion {
    FoldRegion {
        collapsed: true,
        ..FoldRegion::new(start, end)
    }
}

#[test]
fn test_offset_move_snaps_out_of_fold_interior_by_travel_direction() {
    let mut view = EditorView::new("abcdefgh");
    view.folding_mut().add_region(collapsed(2, 6));
    let caret = view.primary_caret();

    // Approaching from the left lands on the fold start.
    view.move_caret_to_offset(caret, 4, false).unwrap();
    assert_eq!(view.caret_offset(caret), 2);

    // Approaching from the right lands on the fold end.
    view.move_caret_to_offset(caret, 8, false).unwrap();
    view.move_caret_to_offset(caret, 4, false).unwrap();
    assert_eq!(view.caret_offset(caret), 6);

    // The region stayed collapsed throughout.
    assert!(view.folding().collapsed_region_at(3).is_some());
}

#[test]
fn test_logical_move_into_fold_expands_it() {
    let mut view = EditorView::new("abcdefgh");
    view.folding_mut().add_region(collapsed(2, 6));
    let caret = view.primary_caret();

    view.move_caret_to_logical(caret, LogicalPosition::new(0, 4))
        .unwrap();
    assert_eq!(view.caret_offset(caret), 4);
    assert!(view.folding().collapsed_region_at(4).is_none());
}

#[test]
fn test_horizontal_move_skips_over_a_collapsed_fold() {
    let mut view = EditorView::new("abcdefgh");
    view.folding_mut().add_region(collapsed(2, 6));
    let caret = view.primary_caret();
    view.move_caret_to_offset(caret, 2, false).unwrap();

    view.move_caret_relatively(caret, 1, 0, false).unwrap();
    assert_eq!(view.caret_offset(caret), 6);

    view.move_caret_relatively(caret, -1, 0, false).unwrap();
    assert_eq!(view.caret_offset(caret), 2);
}

#[test]
fn test_caret_renders_at_the_placeholder_row() {
    // The fold hides the interior line break, merging three logical lines
    // into one visual row.
    let mut view = EditorView::new("head{\nbody\n}tail");
    view.folding_mut().add_region(collapsed(4, 11));
    let caret = view.primary_caret();

    view.move_caret_to_offset(caret, 11, false).unwrap();
    let visual = view.caret_visual_position(caret);
    // "head" + the 3-cell placeholder put the closing brace at column 7.
    assert_eq!((visual.line, visual.column), (0, 7));
}

#[test]
fn test_visual_click_on_placeholder_goes_to_fold_start() {
    let mut view = EditorView::new("head{\nbody\n}tail");
    view.folding_mut().add_region(collapsed(4, 11));
    let caret = view.primary_caret();

    view.move_caret_to_visual(caret, VisualPosition::new(0, 5))
        .unwrap();
    assert_eq!(view.caret_offset(caret), 4);
    // A click on the placeholder does not expand the fold.
    assert!(view.folding().collapsed_region_at(5).is_some());
}

#[test]
fn test_vertical_move_crosses_folded_rows() {
    let mut view = EditorView::new("aaa\nbbb\nccc\nddd");
    // Fold the middle two lines together with their separating break.
    view.folding_mut().add_region(collapsed(4, 11));
    let caret = view.primary_caret();
    view.move_caret_to_logical(caret, LogicalPosition::new(0, 1))
        .unwrap();

    // Row 1 is the merged "bbb/ccc" row, row 2 is "ddd".
    view.move_caret_relatively(caret, 0, 2, false).unwrap();
    assert_eq!(view.caret_logical_position(caret), LogicalPosition::new(3, 1));
}

#[test]
fn test_expanding_a_region_restores_the_rows() {
    let mut view = EditorView::new("aaa\nbbb\nccc");
    view.folding_mut().add_region(collapsed(2, 9));
    assert_eq!(view.mapper().visual_line_count(), 1);

    view.folding_mut().expand(2, 9);
    assert_eq!(view.mapper().visual_line_count(), 3);
}

#[test]
fn test_fold_region_tracks_document_edits() {
    let mut view = EditorView::new("abcdefgh");
    view.folding_mut().add_region(collapsed(2, 6));

    view.insert(0, "xx");
    let region = &view.folding().regions()[0];
    assert_eq!((region.start, region.end), (4, 8));

    // Deleting the whole extent removes the region.
    view.delete(3..9);
    assert!(view.folding().regions().is_empty());
}
