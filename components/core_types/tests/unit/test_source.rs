//! Unit tests for StackFrame

use core_types::StackFrame;

#[test]
fn test_named_frame_display() {
    let frame = StackFrame::named("funcB");
    assert_eq!(frame.to_string(), "funcB");
}

#[test]
fn test_frame_with_source_display() {
    let frame = StackFrame::named("listOnTimeout").in_source("internal/timers.js");
    assert_eq!(frame.to_string(), "listOnTimeout (internal/timers.js)");
}

#[test]
fn test_anonymous_frame_has_no_name() {
    let frame = StackFrame::anonymous();
    assert!(frame.function_name.is_none());
    assert_eq!(frame.to_string(), "<anonymous>");
}

#[test]
fn test_frames_compare_by_fields() {
    assert_eq!(StackFrame::named("a"), StackFrame::named("a"));
    assert_ne!(StackFrame::named("a"), StackFrame::named("a").in_source("x.js"));
}
