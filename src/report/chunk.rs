//! Splitting long messages for the transport length limit

const PARAGRAPH_BREAK: &str = "\n\n";

/// Split `text` into chunks of at most `max_len` characters.
///
/// Paragraphs (`\n\n`-separated) are packed greedily; a paragraph that is
/// longer than `max_len` on its own is cut at character boundaries with no
/// regard for words or markup. Always returns at least one chunk.
pub fn chunk_text(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    if char_len(text) <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut buf_len = 0;

    for paragraph in text.split(PARAGRAPH_BREAK) {
        let paragraph_len = char_len(paragraph);
        let joined_len = if buf.is_empty() {
            paragraph_len
        } else {
            buf_len + PARAGRAPH_BREAK.len() + paragraph_len
        };

        if joined_len <= max_len {
            if !buf.is_empty() {
                buf.push_str(PARAGRAPH_BREAK);
            }
            buf.push_str(paragraph);
            buf_len = joined_len;
            continue;
        }

        if !buf.is_empty() {
            chunks.push(std::mem::take(&mut buf));
        }

        let mut rest = paragraph;
        while char_len(rest) > max_len {
            let (head, tail) = rest.split_at(byte_offset(rest, max_len));
            chunks.push(head.to_string());
            rest = tail;
        }
        buf.push_str(rest);
        buf_len = char_len(rest);
    }

    if !buf.is_empty() || chunks.is_empty() {
        chunks.push(buf);
    }
    chunks
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of the `n`th character (or the end of the string).
fn byte_offset(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map_or(text.len(), |(i, _)| i)
}
