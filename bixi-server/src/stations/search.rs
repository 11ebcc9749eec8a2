//! Station name search.
//!
//! Ranking is tiered: an exact (normalized) name beats a name that starts
//! with the query, which beats a name that merely contains it. Within a
//! tier, shorter names come first as the more specific match, then lower
//! station IDs (numerically, for numeric IDs).

use crate::gbfs::Station;

use super::index::compare_station_ids;
use super::normalize::normalize;

/// How well a name matched a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    Exact,
    Prefix,
    Substring,
}

/// Classify a normalized name against a normalized query.
pub fn match_tier(query: &str, name: &str) -> Option<MatchTier> {
    if name == query {
        Some(MatchTier::Exact)
    } else if name.starts_with(query) {
        Some(MatchTier::Prefix)
    } else if name.contains(query) {
        Some(MatchTier::Substring)
    } else {
        None
    }
}

/// Orders stations by relevance to a query.
///
/// Implementations return only matching stations, best first.
pub trait NameRanker: Send + Sync {
    fn rank<'a>(&self, query: &str, stations: &'a [Station]) -> Vec<&'a Station>;
}

/// The default tiered ranker.
#[derive(Debug, Clone, Copy, Default)]
pub struct TieredRanker;

impl NameRanker for TieredRanker {
    fn rank<'a>(&self, query: &str, stations: &'a [Station]) -> Vec<&'a Station> {
        let query = normalize(query);

        let mut matches: Vec<(MatchTier, usize, &'a Station)> = stations
            .iter()
            .filter_map(|station| {
                let name = normalize(&station.name);
                let tier = match_tier(&query, &name)?;
                Some((tier, name.chars().count(), station))
            })
            .collect();

        matches.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then(a.1.cmp(&b.1))
                .then_with(|| compare_station_ids(&a.2.station_id, &b.2.station_id))
        });

        matches.into_iter().map(|(_, _, station)| station).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn station(id: &str, name: &str) -> Station {
        Station {
            station_id: id.to_string(),
            name: name.to_string(),
            short_name: None,
            latitude: 45.5,
            longitude: -73.5,
            capacity: 20,
            rental_methods: Default::default(),
            external_id: None,
            is_charging: None,
        }
    }

    fn ids<'a>(stations: &[&'a Station]) -> Vec<&'a str> {
        stations.iter().map(|s| s.station_id.as_str()).collect()
    }

    #[test]
    fn tiers() {
        assert_eq!(match_tier("berri", "berri"), Some(MatchTier::Exact));
        assert_eq!(match_tier("berri", "berri-uqam"), Some(MatchTier::Prefix));
        assert_eq!(
            match_tier("berri", "metro berri-uqam"),
            Some(MatchTier::Substring)
        );
        assert_eq!(match_tier("berri", "atwater"), None);
        assert!(MatchTier::Exact < MatchTier::Prefix);
        assert!(MatchTier::Prefix < MatchTier::Substring);
    }

    #[test]
    fn accent_and_case_tolerant() {
        let stations = vec![
            station("1", "Métro Champ-de-Mars (Viger / Sanguinet)"),
            station("2", "Atwater / Sherbrooke"),
        ];

        let found = TieredRanker.rank("metro", &stations);
        assert_eq!(ids(&found), vec!["1"]);

        let found = TieredRanker.rank("CHAMP DE", &stations);
        assert!(found.is_empty(), "hyphens are significant");

        let found = TieredRanker.rank("CHAMP-DE-MARS", &stations);
        assert_eq!(ids(&found), vec!["1"]);
    }

    #[test]
    fn exact_match_ranks_first() {
        let stations = vec![
            station("1", "Métro Berri-UQAM (Berri / de Maisonneuve)"),
            station("2", "Berri / Cherrier"),
            station("3", "Berri"),
            station("4", "Saint-Denis / Berri"),
        ];

        let found = TieredRanker.rank("Berri", &stations);
        assert_eq!(ids(&found), vec!["3", "2", "4", "1"]);
    }

    #[test]
    fn shorter_names_then_ids_break_ties() {
        let stations = vec![
            station("20", "Parc La Fontaine / Rachel"),
            station("5", "Parc Jarry"),
            station("11", "Parc Jarry"),
        ];

        let found = TieredRanker.rank("parc", &stations);
        assert_eq!(ids(&found), vec!["5", "11", "20"]);
    }

    #[test]
    fn no_matches() {
        let stations = vec![station("1", "Atwater")];
        assert!(TieredRanker.rank("verdun", &stations).is_empty());
    }

    proptest! {
        #[test]
        fn every_result_contains_the_query(
            names in prop::collection::vec("[a-zé ]{1,12}", 1..20),
            query in "[a-zé]{1,3}",
        ) {
            let stations: Vec<Station> = names
                .iter()
                .enumerate()
                .map(|(i, n)| station(&i.to_string(), n))
                .collect();

            let found = TieredRanker.rank(&query, &stations);
            let q = normalize(&query);
            for s in &found {
                prop_assert!(normalize(&s.name).contains(&q));
            }

            let expected = stations
                .iter()
                .filter(|s| normalize(&s.name).contains(&q))
                .count();
            prop_assert_eq!(found.len(), expected);
        }
    }
}
