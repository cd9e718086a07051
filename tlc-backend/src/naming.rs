//! Assembler symbol names

/// Local label of a block: `.L<function>.<block>`. Function names never
/// contain `.`, so labels of different functions cannot meet.
pub fn block_label(function: &str, block: &str) -> String {
    format!(".L{}.{}", function, block)
}

/// The shared epilogue every return jumps to
pub fn epilogue_label(function: &str) -> String {
    format!(".L{}.epilogue", function)
}

/// Local label of a string constant, kept out of the function namespace
pub fn string_label(name: &str) -> String {
    format!(".L{}", name)
}

/// Escape text for a GNU `as` `.string` directive
pub fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'"' => escaped.push_str("\\\""),
            b'\\' => escaped.push_str("\\\\"),
            b'\n' => escaped.push_str("\\n"),
            b'\t' => escaped.push_str("\\t"),
            b'\r' => escaped.push_str("\\r"),
            0x20..=0x7e => escaped.push(byte as char),
            other => escaped.push_str(&format!("\\{:03o}", other)),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_labels() {
        assert_eq!(block_label("main", "loop_cmp0"), ".Lmain.loop_cmp0");
        assert_eq!(epilogue_label("main"), ".Lmain.epilogue");
        assert_eq!(string_label("STR0"), ".LSTR0");
    }

    #[test]
    fn test_block_labels_of_similar_functions_differ() {
        assert_ne!(block_label("f", "loop_end0"), block_label("f_loop", "end0"));
        assert_ne!(block_label("f", "a_b"), block_label("f_a", "b"));
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("hi \"you\"\n"), "hi \\\"you\\\"\\n");
        assert_eq!(escape_string("a\\b"), "a\\\\b");
        assert_eq!(escape_string("é"), "\\303\\251");
    }
}
