//! Selection replacement. Writes formatted text back, growing or shrinking
//! the document as needed.

use tracing::debug;

use crate::document::{char_len, char_prefix, Document, SelectionSpan};

use super::error::{EditError, EditResult};
use super::resolve::{resolve_selection, ResolvedSelection};
use super::{Formatter, TextFragment};

/// One selection's replacement, computed before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementSet {
    /// Replacement fragment count minus original fragment count.
    pub line_count_delta: isize,
    /// Replacement fragments, positioned by original (pre-edit) line index.
    pub fragments: Vec<TextFragment>,
    /// Text after the selection end, re-attached to the last fragment.
    pub trailing: String,
}

impl ReplacementSet {
    /// Pair formatter output with the fragments it replaces.
    ///
    /// Entries past the original count are placed on consecutive new lines
    /// below the selection start. An empty output deletes the selected text.
    pub fn build(selection: &ResolvedSelection, new_texts: Vec<Option<String>>) -> EditResult<Self> {
        let required = selection.fragments.len();
        let start_line = selection.start_line();
        let mut fragments = Vec::with_capacity(new_texts.len().max(1));

        for (index, text) in new_texts.into_iter().enumerate() {
            match selection.fragments.get(index) {
                Some(original) => {
                    let text = text.ok_or(EditError::MissingReplacement { index, required })?;
                    fragments.push(TextFragment {
                        line: original.line,
                        range: original.range.clone(),
                        text,
                    });
                }
                None => {
                    let Some(text) = text else { continue };
                    fragments.push(TextFragment {
                        line: start_line + fragments.len(),
                        range: 0..char_len(&text),
                        text,
                    });
                }
            }
        }

        if fragments.is_empty() {
            let range = selection
                .fragments
                .first()
                .map(|f| f.range.clone())
                .unwrap_or(0..0);
            fragments.push(TextFragment {
                line: start_line,
                range,
                text: String::new(),
            });
        }

        Ok(Self {
            line_count_delta: fragments.len() as isize - required as isize,
            fragments,
            trailing: selection.trailing.clone(),
        })
    }
}

/// Resolve every span against the untouched document.
///
/// Spans must cover increasing, disjoint line ranges in the order given.
fn resolve_all<D>(doc: &D, spans: &[SelectionSpan]) -> EditResult<Vec<ResolvedSelection>>
where
    D: Document + ?Sized,
{
    let mut selections: Vec<ResolvedSelection> = Vec::with_capacity(spans.len());
    for span in spans {
        let selection = resolve_selection(doc, span)?;
        if let Some(previous) = selections.last() {
            let (previous, next) = (previous.span, selection.span);
            if next.start.line == previous.end.line && next.start >= previous.end {
                return Err(EditError::SameLineSelections { previous, next });
            }
            if next.start.line <= previous.end.line {
                return Err(EditError::OverlappingSelections { previous, next });
            }
        }
        selections.push(selection);
    }
    debug!(count = selections.len(), "resolved selections");
    Ok(selections)
}

/// Resolve and format every span with a synchronous formatter.
pub fn plan_replacements<D, F, E>(
    doc: &D,
    spans: &[SelectionSpan],
    mut formatter: F,
) -> EditResult<Vec<ReplacementSet>>
where
    D: Document + ?Sized,
    F: FnMut(&[TextFragment]) -> Result<Vec<Option<String>>, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    resolve_all(doc, spans)?
        .iter()
        .map(|selection| {
            let new_texts = formatter(&selection.fragments).map_err(EditError::formatter)?;
            ReplacementSet::build(selection, new_texts)
        })
        .collect()
}

/// Write planned replacements in order. Returns the net line count change.
///
/// Each set's lines are shifted by the deltas of the sets written before it.
pub fn apply_replacements<D>(doc: &mut D, sets: &[ReplacementSet]) -> isize
where
    D: Document + ?Sized,
{
    let mut offset: isize = 0;
    for set in sets {
        apply_set(doc, set, offset);
        offset += set.line_count_delta;
    }
    offset
}

fn apply_set<D>(doc: &mut D, set: &ReplacementSet, offset: isize)
where
    D: Document + ?Sized,
{
    let Some(last) = set.fragments.last() else {
        return;
    };
    let shift = |line: usize| line.saturating_add_signed(offset);
    let last_line = shift(last.line);
    let delta = set.line_count_delta;
    debug!(last_line, delta, offset, "applying replacement");

    if delta > 0 {
        let at = last_line + 1 - delta.unsigned_abs();
        for _ in 0..delta {
            doc.insert_line(at, String::new());
        }
    } else if delta < 0 {
        // The first line keeps the prefix, so lines go from below the last fragment.
        for _ in 0..delta.unsigned_abs() {
            doc.remove_line(last_line + 1);
        }
    }

    let final_index = set.fragments.len() - 1;
    for (index, fragment) in set.fragments.iter().enumerate() {
        let line = shift(fragment.line);
        let current = doc.line(line).unwrap_or_default();
        let mut text = char_prefix(current, fragment.range.start).to_string();
        text.push_str(&fragment.text);
        if index == final_index {
            text.push_str(&set.trailing);
        }
        doc.set_line(line, text);
    }
}

/// Replace every span with the output of a synchronous formatter.
///
/// Spans must start on a later line than the previous span ends. Two spans
/// sharing a line fail with [`EditError::SameLineSelections`] even when
/// disjoint; overlapping or out-of-order spans fail with
/// [`EditError::OverlappingSelections`].
///
/// Returns the net line count change. On error the document is unchanged.
pub fn replace_selected<D, F, E>(doc: &mut D, spans: &[SelectionSpan], formatter: F) -> EditResult<isize>
where
    D: Document + ?Sized,
    F: FnMut(&[TextFragment]) -> Result<Vec<Option<String>>, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    let sets = plan_replacements(&*doc, spans, formatter)?;
    Ok(apply_replacements(doc, &sets))
}

/// Replace every span with the output of an async [`Formatter`].
///
/// Selections are formatted one after another, never concurrently.
pub async fn replace_selected_with<D, F>(
    doc: &mut D,
    spans: &[SelectionSpan],
    formatter: &F,
) -> EditResult<isize>
where
    D: Document + ?Sized,
    F: Formatter + ?Sized,
{
    let selections = resolve_all(&*doc, spans)?;
    let mut sets = Vec::with_capacity(selections.len());
    for selection in &selections {
        let new_texts = formatter
            .format(&selection.fragments)
            .await
            .map_err(EditError::formatter)?;
        sets.push(ReplacementSet::build(selection, new_texts)?);
    }
    Ok(apply_replacements(doc, &sets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::LineBuffer;
    use std::convert::Infallible;
    use std::io;

    fn span(sl: usize, sc: usize, el: usize, ec: usize) -> SelectionSpan {
        SelectionSpan::from_coords(sl, sc, el, ec)
    }

    fn texts(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn build_reuses_original_ranges() {
        let doc = LineBuffer::from_lines(["abc", "def"]);
        let selection = resolve_selection(&doc, &span(0, 1, 1, 2)).unwrap();
        let set = ReplacementSet::build(&selection, texts(&["X", "Y"])).unwrap();
        assert_eq!(set.line_count_delta, 0);
        assert_eq!(set.fragments[0].range, 1..3);
        assert_eq!(set.fragments[1].range, 0..2);
        assert_eq!(set.trailing, "f");
    }

    #[test]
    fn build_synthesises_appended_fragments() {
        let doc = LineBuffer::from_lines(["", "abcdef"]);
        let selection = resolve_selection(&doc, &span(1, 2, 1, 4)).unwrap();
        let set = ReplacementSet::build(&selection, texts(&["one", "twö", "three"])).unwrap();
        assert_eq!(set.line_count_delta, 2);
        assert_eq!(set.fragments[1].line, 2);
        assert_eq!(set.fragments[1].range, 0..3);
        assert_eq!(set.fragments[2].line, 3);
    }

    #[test]
    fn build_rejects_missing_text_for_original_fragment() {
        let doc = LineBuffer::from_lines(["abc", "def"]);
        let selection = resolve_selection(&doc, &span(0, 0, 1, 3)).unwrap();
        let err = ReplacementSet::build(&selection, vec![Some("x".into()), None]).unwrap_err();
        assert!(matches!(
            err,
            EditError::MissingReplacement { index: 1, required: 2 }
        ));
    }

    #[test]
    fn build_skips_absent_appended_entries() {
        let doc = LineBuffer::from_lines(["abc"]);
        let selection = resolve_selection(&doc, &span(0, 0, 0, 3)).unwrap();
        let set = ReplacementSet::build(
            &selection,
            vec![Some("a".into()), None, Some("c".into())],
        )
        .unwrap();
        assert_eq!(set.line_count_delta, 1);
        assert_eq!(set.fragments[1].line, 1);
        assert_eq!(set.fragments[1].text, "c");
    }

    #[test]
    fn empty_output_deletes_selection() {
        let mut doc = LineBuffer::from_lines(["keep", "abc", "def", "ghi", "end"]);
        let delta = replace_selected(&mut doc, &[span(1, 1, 3, 2)], |_| {
            Ok::<_, Infallible>(Vec::new())
        })
        .unwrap();
        assert_eq!(delta, -2);
        assert_eq!(doc.lines(), ["keep", "ai", "end"]);
    }

    #[test]
    fn single_line_same_count_keeps_prefix_and_trailing() {
        let mut doc = LineBuffer::from_lines(["let x = foo(1);"]);
        replace_selected(&mut doc, &[span(0, 8, 0, 14)], |_| {
            Ok::<_, Infallible>(texts(&["bar(2)"]))
        })
        .unwrap();
        assert_eq!(doc.lines(), ["let x = bar(2);"]);
    }

    #[test]
    fn growth_then_shrink_shifts_by_running_offset() {
        let mut doc = LineBuffer::from_lines(["a1", "b2", "c3", "d4", "e5", "f6"]);
        let mut calls = 0;
        let delta = replace_selected(&mut doc, &[span(0, 0, 0, 2), span(2, 0, 4, 2)], |fragments| {
            calls += 1;
            let out = if fragments.len() == 1 {
                texts(&["x", "y", "z"])
            } else {
                texts(&["only"])
            };
            Ok::<_, Infallible>(out)
        })
        .unwrap();
        assert_eq!(calls, 2);
        assert_eq!(delta, 0);
        assert_eq!(doc.lines(), ["x", "y", "z", "b2", "only", "f6"]);
    }

    #[test]
    fn overlapping_selections_rejected_before_formatting() {
        let mut doc = LineBuffer::from_lines(["abc", "def", "ghi"]);
        let mut calls = 0;
        let err = replace_selected(&mut doc, &[span(0, 0, 1, 2), span(1, 1, 2, 0)], |f| {
            calls += 1;
            Ok::<_, Infallible>(f.iter().map(|f| Some(f.text.clone())).collect())
        })
        .unwrap_err();
        assert!(matches!(err, EditError::OverlappingSelections { .. }));
        assert_eq!(calls, 0);
    }

    #[test]
    fn disjoint_selections_on_one_line_rejected() {
        let mut doc = LineBuffer::from_lines(["ab cd ef"]);
        let before = doc.clone();
        let err = replace_selected(&mut doc, &[span(0, 0, 0, 2), span(0, 6, 0, 8)], |_| {
            Ok::<_, Infallible>(texts(&["x"]))
        })
        .unwrap_err();
        match err {
            EditError::SameLineSelections { previous, next } => {
                assert_eq!(previous, span(0, 0, 0, 2));
                assert_eq!(next, span(0, 6, 0, 8));
            }
            other => panic!("expected SameLineSelections, got {other:?}"),
        }
        assert_eq!(doc, before);
    }

    #[test]
    fn selections_out_of_document_order_rejected() {
        let doc = LineBuffer::from_lines(["abc", "def", "ghi"]);
        let err = plan_replacements(&doc, &[span(2, 0, 2, 1), span(0, 0, 0, 1)], |_| {
            Ok::<_, Infallible>(texts(&["x"]))
        })
        .unwrap_err();
        assert!(matches!(err, EditError::OverlappingSelections { .. }));
    }

    #[test]
    fn formatter_failure_leaves_document_untouched() {
        let mut doc = LineBuffer::from_lines(["abc", "def"]);
        let before = doc.clone();
        let mut calls = 0;
        let err = replace_selected(&mut doc, &[span(0, 0, 0, 1), span(1, 0, 1, 1)], |_| {
            calls += 1;
            if calls == 2 {
                Err(io::Error::new(io::ErrorKind::TimedOut, "completion timed out"))
            } else {
                Ok(texts(&["X", "Y"]))
            }
        })
        .unwrap_err();
        assert!(matches!(err, EditError::Formatter(_)));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "completion timed out");
        assert_eq!(doc, before);
    }

    struct Upper;

    #[async_trait::async_trait]
    impl Formatter for Upper {
        type Error = Infallible;

        async fn format(&self, fragments: &[TextFragment]) -> Result<Vec<Option<String>>, Infallible> {
            Ok(fragments
                .iter()
                .map(|f| Some(f.text.to_uppercase()))
                .collect())
        }
    }

    #[tokio::test]
    async fn async_formatter_replaces_in_order() {
        let mut doc = LineBuffer::from_lines(["one two", "three", "four five"]);
        let delta = replace_selected_with(&mut doc, &[span(0, 4, 0, 7), span(2, 0, 2, 4)], &Upper)
            .await
            .unwrap();
        assert_eq!(delta, 0);
        assert_eq!(doc.lines(), ["one TWO", "three", "FOUR five"]);
    }
}
