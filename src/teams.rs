use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::record::MatchRecord;

// Historical and alternate spellings seen across the results and fixture
// sources. Canonical names follow the results archive.
const TEAM_ALIASES: &[(&str, &str)] = &[
    ("Adelaide Crows", "Adelaide"),
    ("Brisbane", "Brisbane Lions"),
    ("Brisbane Bears", "Brisbane Lions"),
    ("Carlton Blues", "Carlton"),
    ("Collingwood Magpies", "Collingwood"),
    ("Essendon Bombers", "Essendon"),
    ("Fremantle Dockers", "Fremantle"),
    ("Geelong Cats", "Geelong"),
    ("Gold Coast Suns", "Gold Coast"),
    ("GW Sydney", "GWS"),
    ("GWS Giants", "GWS"),
    ("Greater Western Sydney", "GWS"),
    ("Hawthorn Hawks", "Hawthorn"),
    ("Kangaroos", "North Melbourne"),
    ("North Melbourne Kangaroos", "North Melbourne"),
    ("Port Adelaide Power", "Port Adelaide"),
    ("Richmond Tigers", "Richmond"),
    ("South Melbourne", "Sydney"),
    ("St Kilda Saints", "St Kilda"),
    ("Sydney Swans", "Sydney"),
    ("West Coast Eagles", "West Coast"),
    ("Western Bulldogs", "Footscray"),
    ("Bulldogs", "Footscray"),
];

static DEFAULT_TABLE: Lazy<TeamAliasTable> =
    Lazy::new(|| TeamAliasTable::from_pairs(TEAM_ALIASES.iter().copied()));

#[derive(Debug, Clone, Default)]
pub struct TeamAliasTable {
    aliases: HashMap<String, String>,
}

impl TeamAliasTable {
    pub fn from_pairs<A, C>(pairs: impl IntoIterator<Item = (A, C)>) -> Self
    where
        A: Into<String>,
        C: Into<String>,
    {
        let aliases = pairs
            .into_iter()
            .map(|(alias, canonical)| (alias.into(), canonical.into()))
            .collect();
        Self { aliases }
    }

    /// Returns the canonical spelling, or the trimmed input when the name is
    /// not a known alias.
    pub fn canonicalize(&self, name: &str) -> String {
        let trimmed = name.trim();
        self.aliases
            .get(trimmed)
            .cloned()
            .unwrap_or_else(|| trimmed.to_string())
    }

    pub fn canonicalize_record(&self, mut record: MatchRecord) -> MatchRecord {
        record.home_team = self.canonicalize(&record.home_team);
        record.away_team = self.canonicalize(&record.away_team);
        record
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

pub fn default_table() -> &'static TeamAliasTable {
    &DEFAULT_TABLE
}

pub fn canonicalize(name: &str) -> String {
    DEFAULT_TABLE.canonicalize(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_aliases_map_to_canonical() {
        assert_eq!(canonicalize("Kangaroos"), "North Melbourne");
        assert_eq!(canonicalize("Western Bulldogs"), "Footscray");
        assert_eq!(canonicalize("South Melbourne"), "Sydney");
        assert_eq!(canonicalize("GW Sydney"), "GWS");
    }

    #[test]
    fn unknown_names_pass_through() {
        assert_eq!(canonicalize("XYZ"), "XYZ");
        assert_eq!(canonicalize("Richmond"), "Richmond");
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(canonicalize("  Kangaroos \n"), "North Melbourne");
        assert_eq!(canonicalize(" Carlton "), "Carlton");
    }

    #[test]
    fn custom_table_overrides_defaults() {
        let table = TeamAliasTable::from_pairs([("Footscray", "Western Bulldogs")]);
        assert_eq!(table.canonicalize("Footscray"), "Western Bulldogs");
        assert_eq!(table.canonicalize("Kangaroos"), "Kangaroos");
        assert_eq!(table.len(), 1);
    }
}
