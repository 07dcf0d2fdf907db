//! Markdown rendering of places and suggestion views

use crate::geocoding::{PlaceSuggestion, ProviderKind};
use crate::reconcile::{Phase, SuggestionSource, SuggestionView};

/// Numbered list of provider results
pub fn format_places(
    provider: ProviderKind,
    query: &str,
    places: &[PlaceSuggestion],
    attribution: bool,
) -> String {
    let mut out = format!("# Results for \"{}\" ({})\n\n", query, provider);

    if places.is_empty() {
        out.push_str("_No matches._\n");
        return out;
    }

    for (i, place) in places.iter().enumerate() {
        out.push_str(&format!("{}. **{}**", i + 1, place.label));
        if let (Some(lat), Some(lon)) = (place.lat, place.lon) {
            out.push_str(&format!(" ({:.5}, {:.5})", lat, lon));
        }
        out.push_str(&format!("\n   id: `{}`\n", place.id));
    }

    if attribution {
        out.push_str("\nPowered by Google\n");
    }
    out
}

/// Current state of the suggestion list
pub fn format_view(view: &SuggestionView) -> String {
    match view.phase {
        Phase::Idle => return "_Type an address to see suggestions._\n".to_string(),
        Phase::Dismissed => return format!("Selected \"{}\"\n", view.query),
        _ => {}
    }

    let source = match view.source {
        SuggestionSource::Live => "live",
        SuggestionSource::Fallback => "saved addresses",
        SuggestionSource::None => "none",
    };
    let mut out = format!("Suggestions for \"{}\" ({})\n", view.query, source);

    if !view.is_visible() {
        out.push_str("  _No suggestions._\n");
    }
    for (i, item) in view.items.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, item.label));
    }
    if view.loading {
        out.push_str("  _searching..._\n");
    }
    if let Some(mark) = &view.attribution {
        out.push_str(&format!("  {} ({})\n", mark.text, mark.logo_url));
    }
    out
}
