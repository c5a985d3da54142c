use super::props::{find_value_by_labels, PropertyMap};
use super::{normalize_label, Field};
use scraper::Html;

/// Minimum normalized Levenshtein similarity for an approximate key match
const MIN_SIMILARITY: f64 = 0.6;

/// A family of equivalent attribute labels
struct SynonymGroup {
    /// Alternatives; each is a set of fragments that must all occur in the label
    triggers: &'static [&'static [&'static str]],
    aliases: &'static [&'static str],
}

const THESAURUS: &[SynonymGroup] = &[
    SynonymGroup {
        triggers: &[&["мощност"]],
        aliases: &[
            "Мощность",
            "Потребляемая мощность",
            "Номинальная мощность",
            "Мощность двигателя",
        ],
    },
    SynonymGroup {
        triggers: &[&["скорост"], &["обмин"], &["rpm"], &["обор"]],
        aliases: &[
            "Скорость вращения",
            "Частота вращения",
            "Обороты",
            "Обороты холостого хода",
            "Скорость холостого хода",
        ],
    },
    SynonymGroup {
        triggers: &[&["энерг", "удар"]],
        aliases: &["Энергия удара", "Сила удара"],
    },
    SynonymGroup {
        triggers: &[&["частота", "удар"]],
        aliases: &["Число ударов", "Частота ударов"],
    },
    SynonymGroup {
        triggers: &[&["напряжен"]],
        aliases: &["Напряжение", "Напряжение аккумулятора"],
    },
    SynonymGroup {
        triggers: &[&["емкост"], &["ёмкост"]],
        aliases: &["Емкость аккумулятора", "Ёмкость аккумулятора"],
    },
];

/// Expands a caller-supplied label into itself plus its known synonyms, deduplicated
pub fn expand_aliases(label: &str) -> Vec<String> {
    let label = label.trim();
    if label.is_empty() {
        return Vec::new();
    }

    let normalized = normalize_label(label);
    let mut aliases = vec![label.to_string()];

    for group in THESAURUS {
        let triggered = group
            .triggers
            .iter()
            .any(|fragments| fragments.iter().all(|f| normalized.contains(f)));
        if !triggered {
            continue;
        }
        for alias in group.aliases {
            if !aliases.iter().any(|a| a == alias) {
                aliases.push(alias.to_string());
            }
        }
    }
    aliases
}

/// Resolves a free-text attribute label to its value on the page
///
/// Tries, in order: exact normalized key, substring match in either direction,
/// synonyms (against the map, then by structural labeled search) and finally the
/// most similar key above the similarity threshold.
pub fn resolve_attribute(props: &PropertyMap, html: &Html, label: &str) -> Field<String> {
    let key = normalize_label(label);
    if key.is_empty() {
        return Field::Unresolved;
    }

    if let Some(value) = lookup(props, &key) {
        return Field::Resolved(value);
    }

    let aliases = expand_aliases(label);
    let from_aliases = aliases
        .iter()
        .skip(1)
        .find_map(|alias| lookup(props, &normalize_label(alias)))
        .or_else(|| find_value_by_labels(html, aliases.as_slice()));
    if let Some(value) = from_aliases {
        tracing::trace!("Attribute '{}' resolved through synonyms", label);
        return Field::Resolved(value);
    }

    Field::from_option(closest_key(props, &key))
}

/// Exact key, then substring match in either direction
fn lookup(props: &PropertyMap, key: &str) -> Option<String> {
    if key.is_empty() {
        return None;
    }
    props.get(key).map(str::to_string).or_else(|| {
        props
            .iter()
            .find(|(k, _)| k.contains(key) || key.contains(k))
            .map(|(_, v)| v.to_string())
    })
}

fn closest_key(props: &PropertyMap, key: &str) -> Option<String> {
    props
        .iter()
        .map(|(k, v)| (strsim::normalized_levenshtein(key, k), v))
        .filter(|(score, _)| *score >= MIN_SIMILARITY)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, v)| v.to_string())
}
