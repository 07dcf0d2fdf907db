use super::{FallbackList, Reconciler, Resolution};
use crate::geocoding::{PlaceSuggestion, ProviderKind, SearchOutcome, MAX_SUGGESTIONS};
use proptest::prelude::*;

fn live_for(query: &str, count: usize) -> SearchOutcome {
    SearchOutcome::Live(
        (0..count)
            .map(|i| PlaceSuggestion::new(i.to_string(), format!("{}#{}", query, i)))
            .collect(),
    )
}

// Fallback filtering: capped, and every entry really contains the query
proptest! {
    #[test]
    fn fallback_matches_are_capped_and_relevant(
        entries in prop::collection::vec("[A-Za-z0-9 ,]{1,24}", 0..20),
        query in "[A-Za-z ]{1,4}",
    ) {
        let list = FallbackList::new(entries);
        let found = list.matching(&query);
        prop_assert!(found.len() <= MAX_SUGGESTIONS);

        let needle = query.trim().to_lowercase();
        for place in &found {
            prop_assert!(place.label.to_lowercase().contains(&needle));
        }
    }
}

// Whatever order responses arrive in, only the latest query's results show
proptest! {
    #[test]
    fn only_latest_query_results_become_visible(
        queries in prop::collection::hash_set("[a-z]{1,6}", 2..6)
            .prop_map(|set| set.into_iter().collect::<Vec<_>>()),
        order_seed in prop::collection::vec(any::<u8>(), 6),
    ) {
        let mut reconciler = Reconciler::new(ProviderKind::MapsCo, FallbackList::default());
        for q in &queries {
            reconciler.begin(q);
        }
        let latest = queries.last().unwrap().clone();

        // Deliver every response in a scrambled order.
        let mut arrivals: Vec<&String> = queries.iter().collect();
        for (i, seed) in order_seed.iter().enumerate().take(arrivals.len()) {
            let j = *seed as usize % arrivals.len();
            arrivals.swap(i, j);
        }

        for q in arrivals {
            let applied = reconciler.resolve(q, live_for(q, 2));
            prop_assert_eq!(applied == Resolution::Applied, *q == latest);

            let view = reconciler.view();
            for label in view.labels() {
                let origin = label.split('#').next().unwrap_or_default();
                // Live labels carry their query; fallback labels carry none.
                if label.contains('#') {
                    prop_assert_eq!(origin, latest.as_str());
                }
            }
        }
    }
}

// Live result sets of any size never show more than five entries
proptest! {
    #[test]
    fn live_results_never_exceed_cap(count in 0usize..30) {
        let mut reconciler = Reconciler::new(ProviderKind::Mapbox, FallbackList::default());
        reconciler.begin("main");
        reconciler.resolve("main", live_for("main", count));
        prop_assert!(reconciler.view().items.len() <= MAX_SUGGESTIONS);
    }
}
