/// Sanitize text pulled out of a PDF before analysis.
/// Strips control characters and stray glyphs, trims lines, drops blank lines.
/// Keeps the punctuation and ordinal marks found in Portuguese archival prose.
pub fn sanitize_extracted_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| {
            c.is_alphanumeric()
                || c.is_whitespace()
                || matches!(
                    c,
                    '.' | ','
                        | ';'
                        | ':'
                        | '-'
                        | '/'
                        | '('
                        | ')'
                        | '['
                        | ']'
                        | '&'
                        | '\''
                        | '"'
                        | '!'
                        | '?'
                        | '*'
                        | '$'
                        | '%'
                        | '§'
                        | '°'
                        | 'º'
                        | 'ª'
                        | '«'
                        | '»'
                        | '\u{2013}' // En-dash
                        | '\u{2014}' // Em-dash
                        | '\u{2019}' // Right single quotation mark
                        | '\u{2018}' // Left single quotation mark
                        | '\u{201C}' // Left double quotation mark
                        | '\u{201D}' // Right double quotation mark
                )
        })
        .collect::<String>()
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
