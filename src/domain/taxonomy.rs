//! Keyword tables for deriving category, colors and sizes from product names
//!
//! The tables are explicit, ordered configuration data. Category rules are
//! evaluated first-match-wins, so the order below is load-bearing: specific
//! apparel types are listed before the general ones they overlap with
//! (a "Zip Hoodie Jacket" is a hoodie, not a jacket).

/// One category rule: a label plus the lowercase keywords that select it.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub label: &'static str,
    pub keywords: &'static [&'static str],
}

/// Ordered category taxonomy. Evaluated top to bottom; the first rule with a
/// keyword contained in the lowercased name wins.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        label: "Hoodies & Sweatshirts",
        keywords: &["hoodie", "sweatshirt", "pullover", "crewneck"],
    },
    CategoryRule {
        label: "Jackets & Coats",
        keywords: &["jacket", "coat", "parka", "windbreaker", "puffer", "vest"],
    },
    CategoryRule {
        label: "Shirts & Tops",
        keywords: &["shirt", "t-shirt", "tee", "top", "blouse", "polo", "tank"],
    },
    CategoryRule {
        label: "Pants & Bottoms",
        keywords: &[
            "pants", "jeans", "trousers", "shorts", "leggings", "joggers", "skirt",
        ],
    },
    CategoryRule {
        label: "Dresses",
        keywords: &["dress", "gown", "jumpsuit"],
    },
    CategoryRule {
        label: "Footwear",
        keywords: &["shoe", "sneaker", "boot", "sandal", "slipper", "loafer", "heel"],
    },
    CategoryRule {
        label: "Accessories",
        keywords: &[
            "hat", "cap", "beanie", "scarf", "glove", "belt", "bag", "backpack",
            "wallet", "sock", "tote",
        ],
    },
];

/// Label assigned when no category keyword matches.
pub const FALLBACK_CATEGORY: &str = "Other";

/// Recognized color words (lowercase). "grey" is normalized to "gray".
pub const COLOR_WORDS: &[&str] = &[
    "black", "white", "red", "blue", "green", "yellow", "orange", "purple",
    "pink", "brown", "gray", "grey", "navy", "beige", "cream", "olive",
    "maroon", "teal", "khaki", "charcoal",
];

/// Size token aliases mapped to their canonical uppercase form.
///
/// Bare `s`/`m`/`l` tokens are deliberately absent: single letters collide
/// with too many product words to be usable as size evidence.
pub const SIZE_ALIASES: &[(&str, &str)] = &[
    ("xs", "XS"),
    ("small", "S"),
    ("medium", "M"),
    ("large", "L"),
    ("xl", "XL"),
    ("x-large", "XL"),
    ("xxl", "XXL"),
    ("xx-large", "XXL"),
    ("2xl", "XXL"),
    ("xxxl", "XXXL"),
    ("3xl", "XXXL"),
];

/// Assign a category label by first-match keyword lookup over the name.
pub fn categorize(name: &str) -> String {
    let lowered = name.to_lowercase();
    for rule in CATEGORY_RULES {
        if rule.keywords.iter().any(|kw| lowered.contains(kw)) {
            return rule.label.to_string();
        }
    }
    FALLBACK_CATEGORY.to_string()
}

/// Extract all color words appearing as whole tokens in the name.
/// Deduplicated, lowercase, in table order.
pub fn extract_colors(name: &str) -> Vec<String> {
    let tokens: Vec<String> = tokenize(name);
    let mut colors = Vec::new();
    for color in COLOR_WORDS {
        let canonical = if *color == "grey" { "gray" } else { color };
        if tokens.iter().any(|t| t == color) && !colors.iter().any(|c| c == canonical) {
            colors.push(canonical.to_string());
        }
    }
    colors
}

/// Extract size tokens from the name, canonicalized to uppercase forms.
/// Deduplicated, in alias-table order.
pub fn extract_sizes(name: &str) -> Vec<String> {
    let tokens: Vec<String> = tokenize(name);
    let mut sizes = Vec::new();
    for (alias, canonical) in SIZE_ALIASES {
        if tokens.iter().any(|t| t == alias) && !sizes.iter().any(|s| s == canonical) {
            sizes.push((*canonical).to_string());
        }
    }
    sizes
}

/// Split a name into lowercase tokens, keeping hyphens inside tokens so
/// compound sizes like "x-large" survive.
fn tokenize(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|t| !t.is_empty())
        .map(|t| t.trim_matches('-').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
