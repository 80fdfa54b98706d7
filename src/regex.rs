//! Brace matching for journal lines, backed by `regex` or, with the `lite`
//! feature, by the smaller `regex-lite`.

use std::ops::Range;
use std::sync::LazyLock;

#[cfg(feature = "lite")]
use regex_lite::Regex;
#[cfg(all(feature = "regex", not(feature = "lite")))]
use regex::Regex;

#[cfg(not(any(feature = "regex", feature = "lite")))]
compile_error!("jabbrev requires the \"regex\" or \"lite\" feature to be enabled");

static BRACED_GROUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{(.*?)\}").unwrap());

/// Byte range of the text inside the first `{...}` group of `line`, braces
/// excluded. The group is the shortest one, so `{A} {B}` yields `A`.
pub(crate) fn first_braced(line: &str) -> Option<Range<usize>> {
    BRACED_GROUP
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|group| group.range())
}
