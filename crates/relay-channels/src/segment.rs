//! Reply segmentation for line-oriented chat mediums.
//!
//! A reply is cut into chunks of at most `max_lines` display lines, each line
//! at most `max_chars_per_line` characters. Explicit line breaks are kept,
//! paragraphs over the limit are word-wrapped greedily, and words are never
//! split. Existing clients depend on the exact chunk boundaries, so the
//! packing rules below are deliberately literal (including the first line of
//! a wrapped paragraph being one character narrower than the rest).

/// Default number of display lines per chunk.
pub const DEFAULT_MAX_LINES: usize = 3;
/// Default number of characters per display line.
pub const DEFAULT_MAX_CHARS_PER_LINE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segmenter {
    pub max_lines: usize,
    pub max_chars_per_line: usize,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self {
            max_lines: DEFAULT_MAX_LINES,
            max_chars_per_line: DEFAULT_MAX_CHARS_PER_LINE,
        }
    }
}

impl Segmenter {
    pub fn new(max_lines: usize, max_chars_per_line: usize) -> Self {
        Self {
            max_lines: max_lines.max(1),
            max_chars_per_line,
        }
    }

    /// Split `text` into ordered chunks. Empty input yields no chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut acc = ChunkAccumulator::new(self.max_lines.max(1));

        for paragraph in text.split('\n') {
            if char_len(paragraph) <= self.max_chars_per_line {
                acc.push_line(paragraph.to_string());
                continue;
            }

            let mut line: Vec<&str> = Vec::new();
            let mut line_len = 0usize;
            for word in paragraph.split_whitespace() {
                let word_len = char_len(word);
                if line_len + word_len + 1 <= self.max_chars_per_line {
                    line.push(word);
                    line_len += word_len + 1;
                } else {
                    // An overlong leading word must not emit an empty line.
                    if !line.is_empty() {
                        acc.push_line(line.join(" "));
                    }
                    line = vec![word];
                    line_len = word_len;
                }
            }
            if !line.is_empty() {
                acc.push_line(line.join(" "));
            }
        }

        acc.finish()
    }
}

/// Split with the default 3 × 100 limits.
pub fn split_message(text: &str) -> Vec<String> {
    Segmenter::default().split(text)
}

struct ChunkAccumulator {
    max_lines: usize,
    chunks: Vec<String>,
    current: Vec<String>,
}

impl ChunkAccumulator {
    fn new(max_lines: usize) -> Self {
        Self {
            max_lines,
            chunks: Vec::new(),
            current: Vec::new(),
        }
    }

    /// A full chunk is closed before the next line goes in, never after.
    fn push_line(&mut self, line: String) {
        if self.current.len() >= self.max_lines {
            self.chunks.push(self.current.join("\n"));
            self.current.clear();
        }
        self.current.push(line);
    }

    fn finish(mut self) -> Vec<String> {
        if !self.current.is_empty() {
            self.chunks.push(self.current.join("\n"));
        }
        self.chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n)
            .map(|i| format!("word{i:03}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn short_text_is_single_chunk() {
        assert_eq!(split_message("Hello, world!"), vec!["Hello, world!"]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(split_message("").is_empty());
    }

    #[test]
    fn three_lines_fit_one_chunk() {
        let chunks = split_message("one\ntwo\nthree");
        assert_eq!(chunks, vec!["one\ntwo\nthree"]);
    }

    #[test]
    fn fourth_line_starts_new_chunk() {
        let chunks = split_message("1\n2\n3\n4\n5\n6\n7");
        assert_eq!(chunks, vec!["1\n2\n3", "4\n5\n6", "7"]);
    }

    #[test]
    fn blank_paragraphs_are_kept_as_lines() {
        let chunks = split_message("a\n\nb");
        assert_eq!(chunks, vec!["a\n\nb"]);
    }

    #[test]
    fn long_reply_without_breaks_respects_bounds() {
        // 62 words × 8 chars ≈ 500 characters, no explicit line breaks.
        let text = words(62);
        assert!(text.len() >= 490);
        let chunks = split_message(&text);
        assert!(chunks.len() >= 2, "expected multiple chunks, got {}", chunks.len());
        for chunk in &chunks {
            let lines: Vec<&str> = chunk.split('\n').collect();
            assert!(lines.len() <= DEFAULT_MAX_LINES);
            for line in lines {
                assert!(line.chars().count() <= DEFAULT_MAX_CHARS_PER_LINE);
            }
        }
    }

    #[test]
    fn wrapping_preserves_every_word_in_order() {
        let text = format!("{}\nshort line\n{}", words(40), words(25));
        let chunks = split_message(&text);
        let rejoined = chunks.join("\n");
        let input: Vec<&str> = text.split_whitespace().collect();
        let produced: Vec<&str> = rejoined.split_whitespace().collect();
        assert_eq!(input, produced);
    }

    #[test]
    fn unwrapped_lines_round_trip_exactly() {
        let text = "first\nsecond line\n\nfourth\nfifth\nsixth\nseventh";
        assert_eq!(split_message(text).join("\n"), text);
    }

    #[test]
    fn first_wrapped_line_is_one_char_narrower() {
        // "aaaa bbbb" is 9 chars; with a limit of 9 the first line only takes
        // words while len + word + 1 <= 9.
        let seg = Segmenter::new(3, 9);
        let chunks = seg.split("aaaa bbbb cccc dddd");
        assert_eq!(chunks, vec!["aaaa\nbbbb cccc\ndddd"]);
    }

    #[test]
    fn overlong_word_is_never_split() {
        let long = "x".repeat(150);
        let text = format!("{long} tail");
        let chunks = split_message(&text);
        assert_eq!(chunks, vec![format!("{long}\ntail")]);
    }

    #[test]
    fn overlong_single_word_paragraph() {
        let long = "y".repeat(120);
        assert_eq!(split_message(&long), vec![long.clone()]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 90 multi-byte characters fit in one 100-char line.
        let text = "é".repeat(90);
        assert_eq!(split_message(&text), vec![text.clone()]);
    }

    #[test]
    fn zero_max_lines_is_clamped() {
        let seg = Segmenter::new(0, 100);
        assert_eq!(seg.split("a\nb"), vec!["a", "b"]);
    }
}
