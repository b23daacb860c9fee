/// Default maximum length, in characters, of a page meta description.
pub const DEFAULT_META_DESCRIPTION_LIMIT: usize = 200;

const SEPARATOR: &str = " - ";
const ELLIPSIS: &str = "...";

/// Build the summary shown to search engines and link previews.
///
/// When title and description fit under `limit` they are returned as given.
/// Otherwise the title is kept whole and the description, with its whitespace
/// collapsed, fills whatever room is left and is cut with an ellipsis.
pub fn meta_description(title: &str, description: &str, limit: usize) -> String {
    if description.trim().is_empty() {
        return title.to_string();
    }

    let title_len = title.chars().count();
    let full_len = title_len + SEPARATOR.len() + description.chars().count();
    if full_len <= limit {
        return format!("{title}{SEPARATOR}{description}");
    }

    let description = collapse_whitespace(description);
    let room = limit.saturating_sub(title_len + SEPARATOR.len() + ELLIPSIS.len());
    if room == 0 {
        return title.to_string();
    }

    let cut: String = description.chars().take(room).collect();
    format!("{title}{SEPARATOR}{}{ELLIPSIS}", cut.trim_end())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
