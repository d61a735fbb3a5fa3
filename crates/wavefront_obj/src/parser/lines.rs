//! Splits a source buffer into line views without copying. Both the OBJ and MTL tokenizers
//! consume the same kind of view so that line indices stay comparable between the two passes.

/// A single source line together with its 1-based position in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineView<'a> {
    pub index: usize,
    pub text: &'a str,
}

/// Splits `source` on `\n` (tolerating a trailing `\r`), producing one [`LineView`] per line
/// including blank and comment (`#`) lines, so that indices stay stable between the raw file
/// and whichever subset of lines a tokenizer actually emits events for.
pub fn split_lines(source: &str) -> Vec<LineView<'_>> {
    source
        .split('\n')
        .enumerate()
        .map(|(i, line)| LineView {
            index: i + 1,
            text: line.strip_suffix('\r').unwrap_or(line),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_numbers_lines_from_one() {
        let lines = split_lines("v 0 0 0\nvt 1 1\n\n# comment\n");
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], LineView { index: 1, text: "v 0 0 0" });
        assert_eq!(lines[1], LineView { index: 2, text: "vt 1 1" });
        assert_eq!(lines[2], LineView { index: 3, text: "" });
        assert_eq!(lines[3], LineView { index: 4, text: "# comment" });
        assert_eq!(lines[4], LineView { index: 5, text: "" });
    }

    #[test]
    fn strips_trailing_carriage_return() {
        let lines = split_lines("v 1 2 3\r\n");
        assert_eq!(lines[0].text, "v 1 2 3");
    }
}
