//! Looking up poems from command-line arguments

use verse_common::model::Poem;

/// Find a poem by id, 1-based list number, or title
///
/// Title matching is case-insensitive and must be unambiguous; an exact
/// title beats a prefix.
pub fn find_poem<'a>(poems: &'a [Poem], query: &str) -> Option<&'a Poem> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    if let Some(poem) = poems.iter().find(|p| p.id == query) {
        return Some(poem);
    }

    if let Ok(number) = query.parse::<usize>() {
        if number >= 1 {
            if let Some(poem) = poems.get(number - 1) {
                return Some(poem);
            }
        }
    }

    let wanted = query.to_lowercase();
    let exact: Vec<&Poem> = poems
        .iter()
        .filter(|p| p.title.to_lowercase() == wanted)
        .collect();
    if exact.len() == 1 {
        return exact.first().copied();
    }

    let mut prefixed = poems
        .iter()
        .filter(|p| p.title.to_lowercase().starts_with(&wanted));
    match (prefixed.next(), prefixed.next()) {
        (Some(poem), None) if exact.is_empty() => Some(poem),
        _ => None,
    }
}

/// One line for `list`: number, title, author, year, stanza count
pub fn poem_line(number: usize, poem: &Poem) -> String {
    let year = if poem.year.is_empty() {
        String::new()
    } else {
        format!(" ({})", poem.year)
    };
    format!(
        "{:>3}. {} - {}{} [{} stanzas] {}",
        number,
        poem.title,
        poem.author,
        year,
        poem.stanzas.len(),
        poem.id
    )
}
