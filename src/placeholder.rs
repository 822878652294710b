//! Generated placeholder descriptions.
//!
//! Entries without fetched content get a one-sentence description built
//! from their type, language, categories, and title. [`is_placeholder`]
//! recognises exactly that template family so backfill knows the text can
//! be replaced. Recognised shapes:
//!
//! ```text
//! A|An <type phrase>[ for <language>][ covering <categories>][ — <title>].
//! Personal blog|website by <name> on <topic>[ for <language>].
//! ```

use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

use crate::catalog::Catalog;
use crate::models::Entry;

/// Category tags that say nothing about the subject; skipped when other
/// tags are available.
const META_TAGS: [&str; 6] = [
    "French",
    "Tutorial",
    "Book",
    "Resources",
    "Reference",
    "Interactive",
];

/// Opening phrase per resource type. Unknown types use [`GENERIC_PHRASE`].
const TYPE_PHRASES: [(&str, &str); 16] = [
    ("Book", "A book"),
    ("Blog", "A blog"),
    ("Website", "A website"),
    ("Package", "An R/Python package"),
    ("Course", "An online course"),
    ("Video", "A video"),
    ("Paper", "A paper"),
    ("Journal", "A journal"),
    ("Community", "A community resource"),
    ("Repository", "A code repository"),
    ("Forum", "A community forum"),
    ("Conference", "A conference resource"),
    ("Tool", "A tool"),
    ("Podcast", "A podcast"),
    ("Newsletter", "A newsletter"),
    ("Cheatsheet", "A cheatsheet"),
];

const GENERIC_PHRASE: &str = "A resource";

/// Language names start with a capital or digit (`R`, `C++`, `Node.js`,
/// `R and Python`, `R/Python`), which keeps prose such as
/// "A tool for managing ..." out. Categories are free text up to the
/// title separator or the final period.
static TEMPLATE: LazyLock<Regex> = LazyLock::new(|| {
    let phrases: Vec<String> = TYPE_PHRASES
        .iter()
        .map(|(_, phrase)| *phrase)
        .chain(std::iter::once(GENERIC_PHRASE))
        .map(regex::escape)
        .collect();
    let language = r"[A-Z0-9][^\s,]*(?:,? (?:and |or |& )?[A-Z0-9][^\s,]*)*";
    Regex::new(&format!(
        r"^(?:{})(?: for {})?(?: covering .+?)?(?: — .+)?\.$",
        phrases.join("|"),
        language
    ))
    .unwrap()
});

static PERSONAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Personal (?:blog|website) by .+ on .+\.$").unwrap());

static PERSON_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+ [A-Z][a-z]+").unwrap());

/// Whether a description is generated template text rather than real content.
pub fn is_placeholder(description: &str) -> bool {
    let text = description.trim();
    !text.is_empty() && (TEMPLATE.is_match(text) || PERSONAL.is_match(text))
}

/// Whether the entry's description is generated text: either any template
/// shape, or exactly what [`placeholder_description`] yields for it.
pub fn has_placeholder_description(entry: &Entry) -> bool {
    let text = entry.description.trim();
    is_placeholder(text) || (!text.is_empty() && text == placeholder_description(entry))
}

fn type_phrase(resource_type: &str) -> &'static str {
    TYPE_PHRASES
        .iter()
        .find(|(name, _)| *name == resource_type)
        .map(|(_, phrase)| *phrase)
        .unwrap_or(GENERIC_PHRASE)
}

fn language_phrase(language: &str) -> Option<String> {
    match language.trim() {
        "" | "Other" => None,
        lang => Some(format!("for {}", lang)),
    }
}

fn category_phrase(categories: &[&str]) -> Option<String> {
    if categories.is_empty() {
        return None;
    }
    let filtered: Vec<&str> = categories
        .iter()
        .copied()
        .filter(|c| !META_TAGS.contains(c))
        .collect();
    let tags = if filtered.is_empty() {
        categories.to_vec()
    } else {
        filtered
    };
    let phrase = match tags.as_slice() {
        [one] => format!("covering {}", one),
        [a, b] => format!("covering {} and {}", a, b),
        [init @ .., last] => format!("covering {}, and {}", init.join(", "), last),
        [] => return None,
    };
    Some(phrase)
}

/// Build the placeholder description for an entry.
pub fn placeholder_description(entry: &Entry) -> String {
    let title = entry.title.trim();
    let rtype = entry.resource_type.trim();
    let categories = entry.categories();
    let lang = language_phrase(&entry.language);

    let looks_like_person = PERSON_NAME.is_match(title)
        && !title.contains(['-', '–', ':']);
    if (rtype == "Blog" || rtype == "Website") && looks_like_person {
        let topic = categories.first().copied().unwrap_or("data science");
        let sentence = match lang {
            Some(lp) => format!(
                "Personal {} by {} on {} {}.",
                rtype.to_lowercase(),
                title,
                topic,
                lp
            ),
            None => format!("Personal {} by {} on {}.", rtype.to_lowercase(), title, topic),
        };
        return sentence.replace('"', "'");
    }

    let mut parts = vec![type_phrase(rtype).to_string()];
    parts.extend(lang);
    parts.extend(category_phrase(&categories));
    let sentence = parts.join(" ");

    let described = if title.chars().count() > 5 && !title.starts_with("http") {
        format!("{} — {}.", sentence, title)
    } else {
        format!("{}.", sentence)
    };
    described.replace('"', "'")
}

/// Give every entry with an empty description a generated one. Existing
/// text, placeholder or not, is left alone. Returns the number filled.
pub fn fill_placeholders(catalog: &mut Catalog) -> Result<usize> {
    let targets: Vec<usize> = catalog
        .entries()
        .iter()
        .enumerate()
        .filter(|(_, e)| e.description.trim().is_empty())
        .map(|(i, _)| i)
        .collect();

    for &index in &targets {
        if let Some(current) = catalog.get(index) {
            let mut working = current.clone();
            working.description = placeholder_description(&working);
            catalog.replace(index, working)?;
        }
    }
    Ok(targets.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, rtype: &str, language: &str, category: &str) -> Entry {
        Entry {
            title: title.to_string(),
            resource_type: rtype.to_string(),
            language: language.to_string(),
            category: category.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_book_with_language_and_categories() {
        let e = entry("R for Data Science", "Book", "R", "Data Science;Tutorial;Visualization");
        assert_eq!(
            placeholder_description(&e),
            "A book for R covering Data Science and Visualization — R for Data Science."
        );
    }

    #[test]
    fn test_three_categories_use_serial_comma() {
        let e = entry("abc", "Tool", "Other", "A;B;C");
        assert_eq!(placeholder_description(&e), "A tool covering A, B, and C.");
    }

    #[test]
    fn test_only_meta_tags_are_kept() {
        let e = entry("abc", "Course", "Python", "Tutorial;French");
        assert_eq!(
            placeholder_description(&e),
            "An online course for Python covering Tutorial and French."
        );
    }

    #[test]
    fn test_personal_blog() {
        let e = entry("Jane Doe", "Blog", "R", "Statistics;Teaching");
        assert_eq!(
            placeholder_description(&e),
            "Personal blog by Jane Doe on Statistics for R."
        );
    }

    #[test]
    fn test_unknown_type_uses_generic_phrase() {
        let e = entry("x", "Vlog", "", "");
        assert_eq!(placeholder_description(&e), "A resource.");
    }

    #[test]
    fn test_generated_text_is_recognised() {
        let samples = [
            entry("R for Data Science", "Book", "R", "Data Science;Tutorial"),
            entry("Jane Doe", "Website", "Other", "Machine Learning"),
            entry("Jane Doe", "Blog", "Python", ""),
            entry("tidymodels", "Package", "R", "Machine Learning;Statistics;Modeling"),
            entry("https://x.io", "Video", "Other", ""),
            entry("Quarto: publishing 1.4", "Tool", "Other", "Publishing"),
            entry("Some Thing", "Cheatsheet", "Python", "Pandas"),
            entry("ab", "Tool", "R", "Node.js"),
            entry("Vue.js guide", "Website", "JavaScript", "Web;Vue.js"),
            entry("stats", "Package", "R and Python", "Stats"),
            entry("Modern C++", "Book", "C++", "Systems;Performance"),
            entry("multi", "Course", "R/Python", "A;B;C"),
        ];
        for e in &samples {
            let d = placeholder_description(e);
            assert!(is_placeholder(&d), "not recognised: {}", d);
        }
    }

    #[test]
    fn test_real_descriptions_are_not_placeholders() {
        for d in [
            "",
            "A tool for managing Python environments with speed.",
            "Learn how to build interactive dashboards in minutes.",
            "This book covers statistics. It has exercises.",
            "Personal notes.",
            "A tool for managing Python environments with speed.",
            "A book about Node.js internals.",
        ] {
            assert!(!is_placeholder(d), "false positive: {:?}", d);
        }
    }

    #[test]
    fn test_fill_only_empty_descriptions() {
        let mut filled = entry("R for Data Science", "Book", "R", "Data Science");
        filled.description = "Hand written.".to_string();
        let mut catalog = Catalog::new(vec![
            entry("Some Tool", "Tool", "Other", ""),
            filled.clone(),
            entry("Jane Doe", "Blog", "R", "Statistics"),
        ]);

        assert_eq!(fill_placeholders(&mut catalog).unwrap(), 2);
        assert_eq!(catalog.get(0).unwrap().description, "A tool — Some Tool.");
        assert_eq!(catalog.get(1).unwrap(), &filled);
        assert!(is_placeholder(&catalog.get(2).unwrap().description));
        assert_eq!(fill_placeholders(&mut catalog).unwrap(), 0);
    }

    #[test]
    fn test_dotted_categories_and_multiword_languages() {
        let e = entry("ab", "Tool", "R", "Node.js");
        assert_eq!(placeholder_description(&e), "A tool for R covering Node.js.");
        assert!(is_placeholder("A tool for R covering Node.js."));
        assert!(is_placeholder(
            "A website for JavaScript covering Web and Vue.js — Vue.js guide."
        ));
        assert!(is_placeholder(
            "An R/Python package for R and Python covering Stats."
        ));
    }

    #[test]
    fn test_entry_check_covers_unusual_languages() {
        let mut e = entry("Shell recipes", "Cheatsheet", "bash", "Scripting");
        e.description = placeholder_description(&e);
        assert_eq!(e.description, "A cheatsheet for bash covering Scripting — Shell recipes.");
        assert!(has_placeholder_description(&e));

        e.description = "Handy one-liners.".to_string();
        assert!(!has_placeholder_description(&e));
    }
}
