/// Derives the plain-text projection of rich-text markup.
///
/// Strips tags, decodes the common HTML entities and collapses runs of
/// whitespace into single spaces. Every tag acts as a word boundary so
/// `<p>a</p><p>b</p>` becomes `"a b"` rather than `"ab"`.
///
/// # Examples
///
/// ```
/// use keepnote::models::plain_text_from_markup;
///
/// let text = plain_text_from_markup("<p>Buy <b>milk</b> &amp; eggs</p><p>today</p>");
/// assert_eq!(text, "Buy milk & eggs today");
/// ```
pub fn plain_text_from_markup(markup: &str) -> String {
    let mut raw = String::with_capacity(markup.len());
    let mut chars = markup.chars();

    while let Some(c) = chars.next() {
        match c {
            '<' => {
                // Consume the whole tag; tags never contribute text
                for t in chars.by_ref() {
                    if t == '>' {
                        break;
                    }
                }
                raw.push(' ');
            }
            '&' => {
                let mut entity = String::new();
                let mut terminated = false;
                let rest = chars.clone();
                for e in rest.take(8) {
                    if e == ';' {
                        terminated = true;
                        break;
                    }
                    entity.push(e);
                }
                match decode_entity(&entity).filter(|_| terminated) {
                    Some(decoded) => {
                        // Skip the entity body plus the trailing ';'
                        for _ in 0..=entity.chars().count() {
                            chars.next();
                        }
                        raw.push(decoded);
                    }
                    None => raw.push('&'),
                }
            }
            _ => raw.push(c),
        }
    }

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "#039" | "#39" | "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => None,
    }
}
