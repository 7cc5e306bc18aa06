//! Call-site capture.
//!
//! Every public intercepting method is `#[track_caller]` and calls `here()`
//! first thing, so the reported location is the first frame outside the
//! engine no matter how many wrapper frames are in between. Pure and
//! stateless; when no caller information exists the location degrades to
//! empty fields instead of failing the intercepted call.

use treetrace_core::model::SourceLocation;

/// The call site of the nearest non-`#[track_caller]` caller.
#[track_caller]
pub fn here() -> SourceLocation {
    let caller = std::panic::Location::caller();
    SourceLocation {
        file: Some(caller.file().to_string()),
        line: Some(caller.line()),
        column: Some(caller.column()),
    }
}
