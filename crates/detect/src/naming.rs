use domloom_capture::CapturedNode;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Attribute keys that carry an explicit component name, in priority order
const NAME_ATTRIBUTES: &[&str] = &["data-component", "data-testid", "component"];

/// The implicit no-op ARIA role; carries no naming signal
const GENERIC_ROLE: &str = "generic";

/// Single-property utility-class prefixes (Tailwind-style shorthands)
const UTILITY_PREFIXES: &[&str] = &[
    "p-", "px-", "py-", "pt-", "pb-", "pl-", "pr-", "m-", "mx-", "my-", "mt-", "mb-", "ml-",
    "mr-", "w-", "h-", "bg-", "text-", "flex-", "grid-", "gap-", "rounded-", "border-",
    "shadow-", "opacity-", "z-",
];

/// CSS-in-JS style class with a short prefix and a hash suffix (`xx-1a2b3c`)
static HASHED_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{1,4}[-_][0-9a-fA-F]{4,10}$").expect("valid regex"));

/// Curated semantic labels for common tags
static TAG_LABELS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("nav", "Navigation"),
        ("ul", "List"),
        ("ol", "List"),
        ("li", "List Item"),
        ("a", "Link"),
        ("button", "Button"),
        ("img", "Image"),
        ("svg", "Icon"),
        ("header", "Header"),
        ("footer", "Footer"),
        ("section", "Section"),
        ("article", "Article"),
        ("aside", "Sidebar"),
        ("form", "Form"),
        ("table", "Table"),
        ("tr", "Table Row"),
        ("td", "Table Cell"),
        ("input", "Input"),
        ("div", "Container"),
        ("span", "Text"),
        ("p", "Paragraph"),
    ])
});

/// Whether a class name is a presentational utility, excluded from naming
#[must_use]
pub fn is_utility_class(class: &str) -> bool {
    if class.len() <= 2 {
        return true;
    }
    if HASHED_CLASS.is_match(class) {
        return true;
    }
    let lower = class.to_lowercase();
    UTILITY_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
}

/// Semantic label for a tag; unknown tags are capitalized verbatim
#[must_use]
pub fn tag_label(tag: &str) -> String {
    if let Some(label) = TAG_LABELS.get(tag.to_lowercase().as_str()) {
        return (*label).to_string();
    }
    capitalize(tag)
}

/// Normalize a raw name candidate into a title-cased display name
///
/// Strips `css-`/`style-`/`styles-`/`component-` prefixes, converts `-`/`_`
/// separators to spaces, splits camelCase boundaries, and title-cases each
/// word. Returns an empty string when nothing survives cleaning.
#[must_use]
pub fn clean_name(raw: &str) -> String {
    let mut name = raw.trim();
    for prefix in ["css-", "styles-", "style-", "component-"] {
        if name.len() > prefix.len() && name.to_lowercase().starts_with(prefix) {
            name = &name[prefix.len()..];
            break;
        }
    }

    let separated = name.replace(['-', '_'], " ");
    let spaced = split_camel_case(&separated);

    spaced
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derive a display name for a component group
///
/// First-match priority: explicit name attribute on the representative, then
/// its semantic role, then the most frequent non-utility class shared across
/// instances, then the curated tag label (suffixed with " Group" when the
/// representative has children).
#[must_use]
pub fn derive_name(representative: &CapturedNode, instances: &[&CapturedNode]) -> String {
    if let Some(raw) = NAME_ATTRIBUTES
        .iter()
        .find_map(|key| representative.named_attributes.get(*key))
    {
        let cleaned = clean_name(raw);
        if !cleaned.is_empty() {
            return cleaned;
        }
    }

    if let Some(role) = representative.semantic_role.as_deref() {
        if !role.is_empty() && !role.eq_ignore_ascii_case(GENERIC_ROLE) {
            let cleaned = clean_name(role);
            if !cleaned.is_empty() {
                return cleaned;
            }
        }
    }

    if let Some(class) = most_frequent_class(instances) {
        let cleaned = clean_name(&class);
        if !cleaned.is_empty() {
            return cleaned;
        }
    }

    log::debug!(
        "No naming hint for <{}> component; falling back to tag label",
        representative.tag
    );
    let mut name = tag_label(&representative.tag);
    if !representative.children.is_empty() {
        name.push_str(" Group");
    }
    name
}

/// Most frequent non-utility class across instances; ties keep first-seen
fn most_frequent_class(instances: &[&CapturedNode]) -> Option<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for node in instances {
        for class in &node.class_names {
            if is_utility_class(class) {
                continue;
            }
            match counts.iter_mut().find(|(name, _)| name == class) {
                Some((_, count)) => *count += 1,
                None => counts.push((class.clone(), 1)),
            }
        }
    }
    let mut best: Option<(String, usize)> = None;
    for (name, count) in counts {
        match &best {
            Some((_, best_count)) if count <= *best_count => {}
            _ => best = Some((name, count)),
        }
    }
    best.map(|(name, _)| name)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Insert spaces at lowercase→uppercase boundaries (`cardTitle` → `card Title`)
fn split_camel_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    let mut prev_lower = false;
    for ch in input.chars() {
        if ch.is_uppercase() && prev_lower {
            out.push(' ');
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        out.push(ch);
    }
    out
}
