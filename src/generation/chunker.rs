//! Content chunking for generation requests
//!
//! Long page text is split into pieces no larger than the configured size,
//! preferring paragraph boundaries and falling back to sentence boundaries.
//! Sizes are counted in characters. Only whitespace is ever dropped.

const PARAGRAPH_BREAK: &str = "\n\n";

/// Splits `text` into chunks of at most `max_size` characters
///
/// # Chunking Rules
///
/// 1. Text that already fits is returned as a single unchanged chunk
/// 2. Otherwise paragraphs (blank-line separated) are packed greedily
/// 3. A paragraph that alone exceeds `max_size` is split into sentences,
///    which are packed the same way
/// 4. A single sentence longer than `max_size` becomes its own oversized chunk
///
/// # Examples
///
/// ```
/// use faq_forge::generation::chunk_text;
///
/// let chunks = chunk_text("First paragraph.\n\nSecond paragraph.", 20);
/// assert_eq!(chunks, vec!["First paragraph.", "Second paragraph."]);
/// ```
pub fn chunk_text(text: &str, max_size: usize) -> Vec<String> {
    if char_len(text) <= max_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text
        .split(PARAGRAPH_BREAK)
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        let paragraph_len = char_len(paragraph);

        if paragraph_len > max_size {
            flush(&mut chunks, &mut current);
            for sentence in split_sentences(paragraph) {
                if !current.is_empty() && char_len(&current) + char_len(sentence) > max_size {
                    flush(&mut chunks, &mut current);
                }
                current.push_str(sentence);
            }
            flush(&mut chunks, &mut current);
            continue;
        }

        if !current.is_empty()
            && char_len(&current) + PARAGRAPH_BREAK.len() + paragraph_len > max_size
        {
            flush(&mut chunks, &mut current);
        }

        if !current.is_empty() {
            current.push_str(PARAGRAPH_BREAK);
        }
        current.push_str(paragraph);
    }

    flush(&mut chunks, &mut current);
    chunks
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn flush(chunks: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
    current.clear();
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Splits after each run of sentence terminators, keeping every character
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_terminator(c) {
            continue;
        }
        let run_continues = chars.peek().is_some_and(|&(_, next)| is_terminator(next));
        if !run_continues {
            let end = i + c.len_utf8();
            sentences.push(&text[start..end]);
            start = end;
        }
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn non_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn paragraph(seed: usize, len: usize) -> String {
        let sentence = format!("Paragraph {} explains one detail of the product. ", seed);
        sentence.repeat(len / sentence.len() + 1)[..len].trim().to_string()
    }

    #[test]
    fn test_short_text_unchanged() {
        let text = "  Short text with padding.  ";
        assert_eq!(chunk_text(text, 4000), vec![text.to_string()]);
    }

    #[test]
    fn test_ten_thousand_chars() {
        let text = (0..20)
            .map(|i| paragraph(i, 500))
            .collect::<Vec<_>>()
            .join("\n\n");
        assert!(text.len() >= 10_000);

        let chunks = chunk_text(&text, 4000);

        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4000));
        assert_eq!(non_whitespace(&chunks.concat()), non_whitespace(&text));
    }

    #[test]
    fn test_paragraph_order_preserved() {
        let text = "Alpha alpha alpha.\n\nBravo bravo bravo.\n\nCharlie charlie.";
        let chunks = chunk_text(text, 40);
        assert_eq!(
            chunks,
            vec!["Alpha alpha alpha.\n\nBravo bravo bravo.", "Charlie charlie."]
        );
    }

    #[test]
    fn test_long_paragraph_split_on_sentences() {
        let text = "One is here. Two is here! Three is here? Four is here.";
        let chunks = chunk_text(text, 30);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 30));
        assert!(chunks[0].starts_with("One is here."));
        assert_eq!(non_whitespace(&chunks.concat()), non_whitespace(text));
    }

    #[test]
    fn test_oversized_sentence_kept_whole() {
        let long_sentence = "word ".repeat(40);
        let text = format!("Intro. {}end.", long_sentence);
        let chunks = chunk_text(&text, 50);

        let oversized: Vec<_> = chunks.iter().filter(|c| c.chars().count() > 50).collect();
        assert_eq!(oversized.len(), 1);
        assert_eq!(non_whitespace(&chunks.concat()), non_whitespace(&text));
    }

    #[test]
    fn test_multibyte_text_counts_chars() {
        let text = "Größe und Qualität sind wichtig.\n\nÜber uns erfahren Sie mehr.";
        let chunks = chunk_text(text, 40);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= 40));
    }

    #[test]
    fn test_split_sentences_keeps_runs_together() {
        let parts = split_sentences("Really?! Yes... ok");
        assert_eq!(parts, vec!["Really?!", " Yes...", " ok"]);
    }
}
