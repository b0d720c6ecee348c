use caret_core::{EditorView, FoldRegion, Inlay, LogicalPosition, SoftWrap, VisualPosition};

#[test]
fn test_offset_visual_round_trip_over_plain_text() {
    let mut view = EditorView::new("fn main() {\n\tlet x = 1;\n}");
    view.settings_mut().tab_size = 4;
    let mapper = view.mapper();

    for offset in 0..=view.document().text_len() {
        let visual = mapper.offset_to_visual(offset, false);
        assert_eq!(mapper.visual_to_offset(visual), offset, "offset {offset}");
    }
}

#[test]
fn test_wide_characters_occupy_two_cells() {
    let view = EditorView::new("a\u{4F60}b");
    let mapper = view.mapper();

    assert_eq!(mapper.offset_to_visual(1, false).column, 1);
    assert_eq!(mapper.offset_to_visual(2, false).column, 3);

    // A click on the second cell of the glyph snaps past it.
    let snapped = mapper.visual_to_logical(VisualPosition::new(0, 2));
    assert_eq!(snapped.column, 2);
}

#[test]
fn test_logical_space_ignores_folds_and_wraps() {
    let mut view = EditorView::new("abcdefgh\nij");
    view.folding_mut().add_region(FoldRegion {
        collapsed: true,
        ..FoldRegion::new(1, 5)
    });
    view.soft_wraps_mut().add_wrap(SoftWrap {
        offset: 6,
        indent_columns: 0,
    });
    let mapper = view.mapper();

    // Logical coordinates are a pure function of the line structure.
    assert_eq!(mapper.offset_to_logical(3), LogicalPosition::new(0, 3));
    assert_eq!(mapper.logical_to_offset(LogicalPosition::new(1, 1)), 10);
}

#[test]
fn test_visual_line_count_with_wraps_and_folds() {
    let mut view = EditorView::new("aaaa\nbbbb\ncccc");
    assert_eq!(view.mapper().visual_line_count(), 3);

    view.soft_wraps_mut().add_wrap(SoftWrap {
        offset: 2,
        indent_columns: 0,
    });
    assert_eq!(view.mapper().visual_line_count(), 4);

    // Folding away the first line break cancels one row.
    view.folding_mut().add_region(FoldRegion {
        collapsed: true,
        ..FoldRegion::new(3, 6)
    });
    assert_eq!(view.mapper().visual_line_count(), 3);
}

#[test]
fn test_wrap_inside_collapsed_fold_is_ignored() {
    let mut view = EditorView::new("abcdefgh");
    view.soft_wraps_mut().add_wrap(SoftWrap {
        offset: 4,
        indent_columns: 2,
    });
    view.folding_mut().add_region(FoldRegion {
        collapsed: true,
        ..FoldRegion::new(2, 6)
    });
    let mapper = view.mapper();

    assert_eq!(mapper.visual_line_count(), 1);
    // Columns: "ab" + 3-cell placeholder, then "gh".
    assert_eq!(mapper.offset_to_visual(6, false).column, 5);
}

#[test]
fn test_combined_fold_wrap_and_inlay_columns() {
    let mut view = EditorView::new("abcdefgh\nij");
    view.folding_mut().add_region(FoldRegion {
        collapsed: true,
        ..FoldRegion::new(1, 3)
    });
    view.inlays_mut().add_inlay(Inlay {
        offset: 4,
        width_in_columns: 2,
        related_to_preceding_text: false,
    });
    let mapper = view.mapper();

    // 'a' (1 cell) + placeholder (3 cells) + 'd' (1 cell) + inlay (2 cells).
    assert_eq!(mapper.offset_to_visual(3, false).column, 1 + 3);
    assert_eq!(mapper.offset_to_visual(4, false).column, 1 + 3 + 1);
    assert_eq!(mapper.offset_to_visual(5, false).column, 1 + 3 + 1 + 2 + 1);
}

#[test]
fn test_inlay_placement_flag_picks_the_caret_side() {
    // An element attached to the preceding text renders between that text and
    // a caret at its anchor; a detached element renders after the caret.
    let mut attached = EditorView::new("abcd");
    attached.inlays_mut().add_inlay(Inlay {
        offset: 2,
        width_in_columns: 3,
        related_to_preceding_text: true,
    });
    let mut detached = EditorView::new("abcd");
    detached.inlays_mut().add_inlay(Inlay {
        offset: 2,
        width_in_columns: 3,
        related_to_preceding_text: false,
    });

    assert_eq!(attached.mapper().offset_to_visual(2, false).column, 5);
    assert_eq!(detached.mapper().offset_to_visual(2, false).column, 2);

    // Columns past the element agree regardless of the flag.
    assert_eq!(attached.mapper().offset_to_visual(3, false).column, 6);
    assert_eq!(detached.mapper().offset_to_visual(3, false).column, 6);

    // Both render positions map back to the anchor offset.
    assert_eq!(attached.mapper().visual_to_offset(VisualPosition::new(0, 5)), 2);
    assert_eq!(detached.mapper().visual_to_offset(VisualPosition::new(0, 2)), 2);
}

#[test]
fn test_soft_wrap_indent_round_trips_to_row_start() {
    let mut view = EditorView::new("abcdefgh");
    view.soft_wraps_mut().add_wrap(SoftWrap {
        offset: 4,
        indent_columns: 3,
    });
    let mapper = view.mapper();

    for column in 0..=3 {
        let logical = mapper.visual_to_logical(VisualPosition::new(1, column));
        assert_eq!(logical.column, 4, "indent column {column}");
    }
    assert!(mapper.is_inside_soft_wrap(VisualPosition::new(1, 2)));
    assert!(!mapper.is_inside_soft_wrap(VisualPosition::new(0, 2)));
}

#[test]
fn test_rows_past_the_end_clamp_to_the_last_row() {
    let view = EditorView::new("abc\ndef");
    let mapper = view.mapper();
    let logical = mapper.visual_to_logical(VisualPosition::new(99, 0));
    assert_eq!(logical, LogicalPosition::new(1, 0));
}
