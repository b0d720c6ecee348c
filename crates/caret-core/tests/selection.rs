use caret_core::{EditorView, FoldRegion, LogicalPosition};

#[test]
fn test_set_selection_normalizes_regardless_of_argument_order() {
    let mut view = EditorView::new("abcdefgh");
    let caret = view.primary_caret();

    view.set_selection(caret, 2, 6).unwrap();
    let forward = view.selection(caret).unwrap();
    assert_eq!((forward.start, forward.end), (2, 6));
    assert_eq!(forward.lead(), 6);
    assert_eq!(forward.anchor(), 2);

    view.set_selection(caret, 6, 2).unwrap();
    let backward = view.selection(caret).unwrap();
    assert_eq!((backward.start, backward.end), (2, 6));
    assert_eq!(backward.lead(), 2);
    assert_eq!(backward.anchor(), 6);
}

#[test]
fn test_shift_move_extends_from_the_lead_end() {
    let mut view = EditorView::new("abcdef");
    let caret = view.primary_caret();
    view.move_caret_to_offset(caret, 2, false).unwrap();

    view.move_caret_relatively(caret, 2, 0, true).unwrap();
    let selection = view.selection(caret).unwrap();
    assert_eq!((selection.start, selection.end), (2, 4));
    assert_eq!(selection.lead(), 4);

    // Extending further moves only the lead end.
    view.move_caret_relatively(caret, 1, 0, true).unwrap();
    let selection = view.selection(caret).unwrap();
    assert_eq!((selection.start, selection.end), (2, 5));

    // Reversing direction past the anchor flips the lead side.
    view.move_caret_relatively(caret, -4, 0, true).unwrap();
    let selection = view.selection(caret).unwrap();
    assert_eq!((selection.start, selection.end), (1, 2));
    assert_eq!(selection.lead(), 1);
}

#[test]
fn test_plain_move_clears_the_selection() {
    let mut view = EditorView::new("abcdef");
    let caret = view.primary_caret();
    view.set_selection(caret, 1, 4).unwrap();
    assert!(view.selection(caret).is_some());

    view.move_caret_relatively(caret, 1, 0, false).unwrap();
    assert_eq!(view.selection(caret), None);
}

#[test]
fn test_selection_expands_over_straddled_collapsed_fold() {
    let mut view = EditorView::new("abcdefghij");
    view.folding_mut().add_region(FoldRegion {
        collapsed: true,
        ..FoldRegion::new(3, 8)
    });
    let caret = view.primary_caret();

    view.set_selection(caret, 1, 5).unwrap();
    let selection = view.selection(caret).unwrap();
    assert_eq!((selection.start, selection.end), (1, 8));
}

#[test]
fn test_selection_survives_edits_through_markers() {
    let mut view = EditorView::new("abcdefgh");
    let caret = view.primary_caret();
    view.set_selection(caret, 2, 6).unwrap();

    view.insert(0, "xx");
    let selection = view.selection(caret).unwrap();
    assert_eq!((selection.start, selection.end), (4, 8));

    view.delete(0..5);
    let selection = view.selection(caret).unwrap();
    assert_eq!((selection.start, selection.end), (0, 3));
}

#[test]
fn test_select_to_document_start_from_first_line() {
    let mut view = EditorView::new("abc\ndef");
    let caret = view.primary_caret();
    view.move_caret_to_logical(caret, LogicalPosition::new(0, 2))
        .unwrap();

    view.move_caret_relatively(caret, 0, -1, true).unwrap();
    assert_eq!(view.caret_offset(caret), 0);
    let selection = view.selection(caret).unwrap();
    assert_eq!((selection.start, selection.end), (0, 2));
    assert_eq!(selection.lead(), 0);
}

#[test]
fn test_clear_selection() {
    let mut view = EditorView::new("abcdef");
    let caret = view.primary_caret();
    view.set_selection(caret, 0, 3).unwrap();
    view.clear_selection(caret).unwrap();
    assert_eq!(view.selection(caret), None);
    // Clearing twice is harmless.
    view.clear_selection(caret).unwrap();
}

#[test]
fn test_column_mode_keeps_virtual_extents_on_one_line() {
    let mut view = EditorView::new("ab\ncdef");
    view.settings_mut().virtual_space = true;
    view.settings_mut().column_selection_mode = true;
    let caret = view.primary_caret();

    // Both boundaries sit at the end of the short first line, differing only
    // in virtual columns.
    view.set_selection_with_virtual(caret, 2, 1, 2, 4).unwrap();
    let selection = view.selection(caret).unwrap();
    assert_eq!((selection.start, selection.end), (2, 2));
    assert_eq!((selection.virtual_start, selection.virtual_end), (1, 4));
}

#[test]
fn test_virtual_extents_reset_across_lines() {
    let mut view = EditorView::new("ab\ncdef");
    view.settings_mut().virtual_space = true;
    view.settings_mut().column_selection_mode = true;
    let caret = view.primary_caret();

    // Boundaries on different logical lines carry no virtual columns.
    view.set_selection_with_virtual(caret, 2, 3, 5, 0).unwrap();
    let selection = view.selection(caret).unwrap();
    assert_eq!((selection.start, selection.end), (2, 5));
    assert_eq!((selection.virtual_start, selection.virtual_end), (0, 0));
}

#[test]
fn test_virtual_extents_ignored_outside_column_mode() {
    let mut view = EditorView::new("ab\ncdef");
    view.settings_mut().virtual_space = true;
    let caret = view.primary_caret();

    view.set_selection_with_virtual(caret, 2, 1, 2, 4).unwrap();
    assert_eq!(view.selection(caret), None);
}

#[test]
fn test_empty_selection_reads_as_none() {
    let mut view = EditorView::new("abcdef");
    let caret = view.primary_caret();
    view.set_selection(caret, 3, 3).unwrap();
    assert_eq!(view.selection(caret), None);
}
