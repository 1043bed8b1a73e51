use crate::{ColourCard, ColourName, HexColour};

/// The fixed colour pool. Read-only data, never mutated at runtime.
const POOL: &[(&str, &str, &str)] = &[
    ("Ocean Blue", "calm & collected", "#0077B6"),
    ("Sunset Orange", "fired up", "#F77F00"),
    ("Emerald Green", "growth mode", "#2D6A4F"),
    ("Royal Purple", "creative genius", "#7B2D8E"),
    ("Golden Yellow", "pure sunshine", "#F4A100"),
    ("Cherry Red", "bold & fearless", "#D00000"),
    ("Coral Pink", "warm & fuzzy", "#FF6B6B"),
    ("Midnight Navy", "deep thinker", "#1B2845"),
    ("Electric Teal", "buzzing with ideas", "#00B4D8"),
    ("Lavender", "peaceful vibes", "#B388EB"),
    ("Sage Green", "grounded & steady", "#87A878"),
    ("Hot Magenta", "main character energy", "#FF006E"),
    ("Burnt Sienna", "cozy & nostalgic", "#C1440E"),
    ("Sky Blue", "limitless", "#89CFF0"),
    ("Forest Green", "back to basics", "#1B4332"),
    ("Copper", "resourceful & sharp", "#B87333"),
    ("Blush", "soft power", "#DE6FA1"),
    ("Slate Grey", "focused & efficient", "#708090"),
    ("Tangerine", "unstoppable", "#FF9505"),
    ("Indigo", "visionary mode", "#3F37C9"),
];

pub fn standard_pool() -> Vec<ColourCard> {
    POOL.iter()
        .map(|(name, mood, hex)| ColourCard {
            name: ColourName::from(*name),
            mood: String::from(*mood),
            hex: HexColour::try_from(*hex).expect("valid pool hex"),
        })
        .collect()
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn pool_has_no_duplicate_names() {
        let pool = standard_pool();
        let names: HashSet<_> = pool.iter().map(|c| c.name.clone()).collect();
        assert_eq!(names.len(), pool.len());
    }

    #[test]
    fn pool_is_large_enough_for_a_draw() {
        assert!(standard_pool().len() >= 5);
    }
}
