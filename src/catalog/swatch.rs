//! Best-effort color swatch resolution for variant selection UIs.

use super::product::UnifiedVariant;

/// Swatch used when no color can be resolved.
pub const DEFAULT_SWATCH: &str = "#CCCCCC";

/// Ordered keyword table matched case-insensitively against variant titles.
/// Order matters: earlier entries win, so "navy" must precede "blue" and the
/// generic "light"/"dark" shades sit last.
const COLOR_PATTERNS: &[(&str, &str)] = &[
    ("black", "#000000"),
    ("white", "#FFFFFF"),
    ("navy", "#000080"),
    ("red", "#FF0000"),
    ("blue", "#0000FF"),
    ("green", "#008000"),
    ("yellow", "#FFFF00"),
    ("purple", "#800080"),
    ("pink", "#FFC0CB"),
    ("orange", "#FFA500"),
    ("gray", "#808080"),
    ("grey", "#808080"),
    ("brown", "#A52A2A"),
    ("maroon", "#800000"),
    ("olive", "#808000"),
    ("teal", "#008080"),
    ("lime", "#00FF00"),
    ("aqua", "#00FFFF"),
    ("cyan", "#00FFFF"),
    ("silver", "#C0C0C0"),
    ("gold", "#FFD700"),
    ("cream", "#FFFDD0"),
    ("beige", "#F5F5DC"),
    ("tan", "#D2B48C"),
    ("khaki", "#C3B091"),
    ("burgundy", "#800020"),
    ("coral", "#FF7F50"),
    ("salmon", "#FA8072"),
    ("lavender", "#E6E6FA"),
    ("mint", "#98FF98"),
    ("turquoise", "#40E0D0"),
    ("indigo", "#4B0082"),
    ("violet", "#8B00FF"),
    ("magenta", "#FF00FF"),
    ("fuchsia", "#FF00FF"),
    ("plum", "#DDA0DD"),
    ("orchid", "#DA70D6"),
    ("thistle", "#D8BFD8"),
    ("wheat", "#F5DEB3"),
    ("bisque", "#FFE4C4"),
    ("peach", "#FFCBA4"),
    ("moccasin", "#FFE4B5"),
    ("navajo", "#FFDEAD"),
    ("blanched", "#FFEBCD"),
    ("antique", "#FAEBD7"),
    ("linen", "#FAF0E6"),
    ("old", "#FDF5E6"),
    ("seashell", "#FFF5EE"),
    ("cornsilk", "#FFF8DC"),
    ("ivory", "#FFFFF0"),
    ("honeydew", "#F0FFF0"),
    ("azure", "#F0FFFF"),
    ("alice", "#F0F8FF"),
    ("ghost", "#F8F8FF"),
    ("snow", "#FFFAFA"),
    ("misty", "#FFE4E1"),
    ("rosy", "#FFE4E1"),
    ("light", "#F0F0F0"),
    ("dark", "#404040"),
];

/// Resolves a display color for a variant.
///
/// Priority: explicit color field, then catalog-info color, then a `Color`
/// entry in the option list, then keyword matching against the title, then
/// a neutral gray. This is a heuristic for swatch rendering, not data.
pub fn swatch_color(variant: &UnifiedVariant) -> String {
    if let Some(color) = &variant.color {
        return color.clone();
    }

    if let Some(color) = variant
        .catalog_info
        .as_ref()
        .and_then(|info| info.get("color"))
        .and_then(|value| value.as_str())
    {
        return color.to_string();
    }

    if let Some(option) = variant.options.iter().find(|opt| opt.name == "Color") {
        return option.value.clone();
    }

    let title = variant.title.to_lowercase();
    for (keyword, hex) in COLOR_PATTERNS {
        if title.contains(keyword) {
            return (*hex).to_string();
        }
    }

    DEFAULT_SWATCH.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::product::VariantOption;
    use rust_decimal_macros::dec;

    fn variant(title: &str) -> UnifiedVariant {
        UnifiedVariant {
            id: "1".to_string(),
            title: title.to_string(),
            price: dec!(25.00),
            currency: "USD".to_string(),
            is_enabled: true,
            color: None,
            size: None,
            catalog_info: None,
            options: Vec::new(),
        }
    }

    #[test]
    fn explicit_color_wins() {
        let mut v = variant("Large - Navy Blue");
        v.color = Some("Heather Midnight".to_string());
        assert_eq!(swatch_color(&v), "Heather Midnight");
    }

    #[test]
    fn catalog_info_color_beats_title_parsing() {
        let mut v = variant("Large - Navy Blue");
        v.catalog_info = Some(serde_json::json!({"color": "Midnight"}));
        assert_eq!(swatch_color(&v), "Midnight");
    }

    #[test]
    fn color_option_beats_title_parsing() {
        let mut v = variant("Large - Navy Blue");
        v.options = vec![VariantOption {
            name: "Color".to_string(),
            value: "Ocean".to_string(),
        }];
        assert_eq!(swatch_color(&v), "Ocean");
    }

    #[test]
    fn navy_wins_over_blue_in_title_fallback() {
        assert_eq!(swatch_color(&variant("Large - Navy Blue")), "#000080");
    }

    #[test]
    fn title_matching_is_case_insensitive() {
        assert_eq!(swatch_color(&variant("SMALL - BLACK")), "#000000");
    }

    #[test]
    fn extended_shade_names_resolve() {
        assert_eq!(swatch_color(&variant("Throw - Thistle")), "#D8BFD8");
        assert_eq!(swatch_color(&variant("Tote / Seashell")), "#FFF5EE");
        assert_eq!(swatch_color(&variant("Misty Rose Tee")), "#FFE4E1");
    }

    #[test]
    fn unresolvable_title_falls_back_to_neutral_gray() {
        assert_eq!(swatch_color(&variant("Standard")), DEFAULT_SWATCH);
    }
}
