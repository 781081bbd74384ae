//! Builtin signal data
//!
//! Used when the signals backend is unreachable, and as the whole catalog
//! for offline play.

use std::collections::BTreeSet;

use super::{Hitbox, Hotspot, SignalCatalog};
use crate::consts::TEST_SIGNALS_PER_LINE;
use crate::error::{EngineError, Result};
use crate::settings::SignalSet;

/// Catalog backed by the tables below
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalog {
    set: SignalSet,
}

impl StaticCatalog {
    pub fn new(set: SignalSet) -> Self {
        Self { set }
    }

    pub fn set(&self) -> SignalSet {
        self.set
    }

    fn truncate(&self, mut signals: Vec<String>) -> Vec<String> {
        if self.set == SignalSet::Test {
            signals.truncate(TEST_SIGNALS_PER_LINE);
        }
        signals
    }
}

type Table = &'static [(&'static str, &'static [&'static str])];

fn lookup(table: Table, line: &str) -> Option<&'static [&'static str]> {
    table
        .iter()
        .find(|(name, _)| *name == line)
        .map(|(_, signals)| *signals)
}

fn known(table: Table, line: &str) -> Result<&'static [&'static str]> {
    lookup(table, line).ok_or_else(|| EngineError::UnknownLine(line.to_string()))
}

impl SignalCatalog for StaticCatalog {
    fn lines(&self) -> Vec<String> {
        CORRECT_SIGNALS
            .iter()
            .map(|(line, _)| line.to_string())
            .collect()
    }

    fn answer_sequence(&self, line: &str) -> Result<Vec<String>> {
        let signals = known(CORRECT_SIGNALS, line)?;
        Ok(self.truncate(signals.iter().map(|s| s.to_string()).collect()))
    }

    fn distractor_pool(&self, line: &str) -> Result<BTreeSet<String>> {
        known(CORRECT_SIGNALS, line)?;
        Ok(lookup(INCORRECT_SIGNALS, line)
            .unwrap_or_default()
            .iter()
            .map(|s| s.to_string())
            .collect())
    }

    fn keypad_sequence(&self, line: &str) -> Result<Vec<String>> {
        known(CORRECT_SIGNALS, line)?;
        match lookup(KEYPAD_SIGNALS, line) {
            Some(signals) => Ok(self.truncate(signals.iter().map(|s| s.to_string()).collect())),
            None => Ok(super::keypad_form(&self.answer_sequence(line)?)),
        }
    }

    fn hotspots(&self, line: &str) -> Result<Vec<Hotspot>> {
        known(CORRECT_SIGNALS, line)?;
        Ok(SCHEMA_PAGES
            .iter()
            .enumerate()
            .flat_map(|(index, page)| {
                page.iter().map(move |(code, x, y)| Hotspot {
                    code: code.to_string(),
                    page: index as u32 + 1,
                    hitbox: Hitbox::point(*x, *y),
                })
            })
            .collect())
    }
}

/// Demo schematic pages: (signal, x, y) point hotspots
const SCHEMA_PAGES: &[&[(&str, f32, f32)]] = &[
    &[
        ("Signal 1", 91.0, 310.0),
        ("Signal 2", 124.0, 312.0),
        ("Signal 3", 138.0, 312.0),
        ("Signal 4", 177.0, 313.0),
        ("Signal 5", 192.0, 311.0),
    ],
    &[
        ("Signal 6", 91.0, 268.0),
        ("Signal 7", 124.0, 268.0),
        ("Signal 8", 143.0, 267.0),
        ("Signal 9", 179.0, 267.0),
        ("Signal 10", 193.0, 266.0),
    ],
];

/// Correct signals per line, in solve order
const CORRECT_SIGNALS: Table = &[
    (
        "Blue Line North East",
        &[
            "O2RA", "O2LB", "O046", "O089", "O086", "O123", "O6RA", "O6LB", "O162", "O193",
            "O192", "O10RA", "O10LB", "O258", "O296", "O295", "O14RA", "O14LB", "O18RA",
            "O18LB", "O22RA", "O22LB", "O26RA", "O26LB", "O456", "O524", "O527", "O589",
            "O34RA", "O34LB", "O664", "O665", "O709", "O38RA", "O38LB", "O792", "O793", "O862",
            "O863", "O46RA", "O46LB", "O1036", "O1055", "O1142", "O1173", "O54RA", "O54LB",
            "O1223", "O1232", "O1259", "O1268", "O58RA", "O58LB", "O1323", "O62RA", "O62LB",
            "O1376", "O1397", "O1413", "O1422", "O66RA", "O66LB", "O1454", "O1457",
        ],
    ),
    (
        "Blue Line North West",
        &[
            "O2RB", "O2LA", "O048", "O087", "O088", "O121", "O6RB", "O6LA", "O164", "O191",
            "O10RB", "O10LA", "O298", "O297", "O14RB", "O14LA", "O18RB", "O18LA", "O22RB",
            "O22LA", "O26RB", "O26LA", "O458", "O526", "O525", "O587", "O34RB", "O34LA", "O666",
            "O663", "O707", "O38RB", "O38LA", "O794", "O791", "O864", "O861", "O46RB", "O46LA",
            "O46LC", "O1053", "O1146", "O1145", "O1171", "O54RB", "O54LAS", "O1221", "O1234",
            "O1257", "O1270", "O58RB", "O58LA", "O1321", "O62RB", "O62LA", "O1378", "O1395",
            "O1411", "O1424", "O66RB", "O66LA", "O1456", "O1455",
        ],
    ),
    (
        "Blue Line South East",
        &[
            "S154", "S16RA", "S16LB", "S226", "S287", "S296", "S356", "S406", "S24RA", "S24LB",
            "S32RA", "S32LB", "S592", "S633", "S662", "S40RA", "S40LB", "S816", "S819", "S44RA",
            "S44LB", "S916", "S984", "S54RA", "S54LB", "S1172", "S1175", "S58RA", "S58LB",
            "S1332", "S1333", "S62RA", "S62LB", "S1472", "S98RA", "S98LB",
        ],
    ),
    (
        "Blue Line South West",
        &[
            "S16RB", "S16LA", "S285", "S298", "S345", "S387", "S24RB", "S24LA", "S32RB",
            "S32LA", "S543", "S632", "S631", "S681", "S40RB", "S40LA", "S818", "S817", "S44RB",
            "S44LC", "S44LA", "S48RC", "S48RB", "S48LB", "S48LA", "S50RC", "S50RB", "S50LA",
            "S54RB", "S54LA", "S1174", "S1173", "S58RB", "S58LA", "S1334", "S1331", "S62RB",
            "S62LA", "S94R", "S94LA", "S94LB", "S98LA", "S98RB",
        ],
    ),
    (
        "Orange Line East",
        &[
            "E358", "E466", "E6RA", "E6LB", "E8RA", "E8LB", "E10RA", "E10LB", "E954", "E12RA",
            "E12LB", "E1136", "E1194", "E1236", "E18RA", "E18LB", "E20RA", "E20LB", "E22RA",
            "E22LB", "E1340", "E1366", "E1392", "E1416", "E1454", "E1478", "E1500", "E24RA",
            "E24LB", "E1572", "E1620", "E26RA", "E26LB", "E1682", "E28RA", "E28LB", "E30RA",
            "E30LB", "E1874", "E32RA", "E32LB", "E34RA",
        ],
    ),
    (
        "Orange Line West",
        &[
            "E439", "E509", "E6RB", "E6LA", "E8RB", "E8LA", "E10LA", "E10RB", "E925", "E12RB",
            "E12LA", "E1147", "E1221", "E18LA", "E18RB", "E20RB", "E20LA", "E22LA", "E22RB",
            "E1353", "E1383", "E1417", "E1445", "E1473", "E1501", "E24LA", "E24RB", "E1559",
            "E1585", "E1625", "E26RB", "E26LA", "E1684", "E1729", "E28RB", "E28LA", "E30RB",
            "E30LA", "E1845", "E32RB", "E32LA", "E34RB", "E34L",
        ],
    ),
    (
        "Green Line East",
        &[
            "M2LB", "M404", "M434", "M4RA", "M4LB", "M504", "M538", "M570", "M6RA", "M6LB",
            "M650", "M694", "M8RA", "M8LB", "M760", "M812", "M840", "M12R", "M12L", "M14RB",
            "M14RA", "M14L", "M20R", "M20L", "M24RA", "M24L", "M996", "M26RA", "M26LB", "M1122",
            "M1184", "M30RA", "M30LB", "M1284", "M1342", "M34RA", "M34LB", "M1432", "M1474",
            "M38RA",
        ],
    ),
    (
        "Green Line West",
        &[
            "M2LA", "M415", "M4RB", "M4LA", "M503", "M537", "M571", "M6RB", "M6LA", "M649",
            "M695", "M8RB", "M8LA", "M771", "M813", "M841", "M10R", "M10LA", "M10LB", "M16L",
            "M16R", "M18LA", "M18R", "M18LB", "M22L", "M22RB", "M1001", "M26LA", "M26RB",
            "M1127", "M1183", "M30LA", "M30RB", "M1257", "M1315", "M34LA", "M34RB", "M1445",
            "M38RB",
        ],
    ),
];

/// Decoy signals per line (may contain repeats; they collapse in the pool)
const INCORRECT_SIGNALS: Table = &[
    (
        "Blue Line North East",
        &[
            "O2RX", "O2LC", "O047", "O090", "O087X", "O124", "O6RC", "O6LC", "O163", "O194",
            "O193X", "O10RC", "O10LC", "O259", "O297", "O296X", "O15RA", "O15LB", "O19RA",
            "O19LB", "O23RA", "O23LB", "O2RZ", "O2LDX", "O048X", "O091", "O088Y", "O125",
            "O6RD", "O6LDX", "O164X", "O195", "O194X", "O10RD", "O10LD", "O260", "O298",
            "O297X", "O16RA", "O16LB", "O20RA", "O20LB", "O24RA", "O24LB", "O2RW", "O2LE",
            "O049Y", "O092", "O089Z", "O126", "O6RE", "O6LE", "O165X", "O196", "O195X",
        ],
    ),
    (
        "Blue Line North West",
        &[
            "O2RY", "O2LD", "O049", "O088X", "O089", "O122", "O6RD", "O6LD", "O165", "O192",
            "O10RD", "O10LD", "O2RZ", "O2LDX", "O050", "O089X", "O090", "O123", "O6RE", "O6LDX",
            "O166", "O193", "O10RE", "O10LE", "O2RW", "O2LE", "O051", "O090X", "O091", "O124",
            "O6RF", "O6LEX", "O167", "O194", "O10RF", "O10LF",
        ],
    ),
    (
        "Blue Line South East",
        &[
            "S155", "S17RA", "S17LB", "S227", "S288", "S297", "S357", "S407", "S25RA", "S25LB",
            "S156", "S18RA", "S18LB", "S228", "S289", "S298", "S358", "S408", "S26RA", "S26LB",
            "S157", "S19RA", "S19LB", "S229", "S290", "S299", "S359", "S409", "S27RA", "S27LB",
        ],
    ),
    (
        "Blue Line South West",
        &[
            "S17RB", "S17LA", "S286", "S299", "S346", "S388", "S25RB", "S25LA", "S18RB",
            "S18LA", "S287", "S300", "S347", "S389", "S26RB", "S26LA", "S19RB", "S19LA", "S288",
            "S301", "S348", "S390", "S27RB", "S27LA",
        ],
    ),
    (
        "Orange Line East",
        &[
            "E359", "E467", "E7RA", "E7LB", "E9RA", "E9LB", "E11RA", "E11LB", "E955", "E360",
            "E468", "E8RA", "E8LB", "E10RA", "E10LB", "E12RA", "E12LB", "E956", "E361", "E469",
            "E9RA", "E9LB", "E11RA", "E11LB", "E13RA", "E13LB", "E957",
        ],
    ),
    (
        "Orange Line West",
        &[
            "E440", "E510", "E7RB", "E7LA", "E9RB", "E9LA", "E11LA", "E11RB", "E926", "E441",
            "E511", "E8RB", "E8LA", "E10RB", "E10LA", "E12LA", "E12RB", "E927", "E442", "E512",
            "E9RB", "E9LA", "E11LB", "E11RA", "E13LA", "E13RB", "E928",
        ],
    ),
    (
        "Green Line East",
        &[
            "M2LC", "M405", "M435", "M5RA", "M5LB", "M505", "M539", "M571", "M2LD", "M406",
            "M436", "M6RA", "M6LB", "M506", "M540", "M572", "M2LE", "M407", "M437", "M7RA",
            "M7LB", "M507", "M541", "M573",
        ],
    ),
    (
        "Green Line West",
        &[
            "M2LBX", "M416", "M5RB", "M5LA", "M504", "M538", "M572", "M7RB", "M7LA", "M2LBY",
            "M417", "M6RB", "M6LA", "M505", "M539", "M573", "M8RB", "M8LA", "M2LBZ", "M418",
            "M7RB", "M7LA", "M506", "M540", "M574", "M9RB", "M9LA",
        ],
    ),
];

/// Keypad-enterable signal numbers per line, in recall order
const KEYPAD_SIGNALS: Table = &[
    (
        "Blue Line North East",
        &[
            "2", "046", "089", "086", "123",
        ],
    ),
    (
        "Blue Line North West",
        &[
            "2", "048", "087", "088", "121",
        ],
    ),
    (
        "Blue Line South East",
        &[
            "154", "16", "226", "287", "296",
        ],
    ),
    (
        "Blue Line South West",
        &[
            "16", "285", "298", "345", "387",
        ],
    ),
    (
        "Orange Line East",
        &[
            "358", "466", "6", "8", "10",
        ],
    ),
    (
        "Orange Line West",
        &[
            "439", "509", "6", "8", "10",
        ],
    ),
    (
        "Green Line East",
        &[
            "2", "404", "434", "4", "504",
        ],
    ),
    (
        "Green Line West",
        &[
            "2", "406", "436", "4", "506",
        ],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_line_has_enough_distractors() {
        let catalog = StaticCatalog::new(SignalSet::Full);
        for line in catalog.lines() {
            let answers = catalog.answer_sequence(&line).unwrap();
            let pool = catalog.distractor_pool(&line).unwrap();
            for answer in &answers {
                let available = pool.iter().filter(|p| *p != answer).count();
                assert!(available >= 2, "{line}: {answer} has {available} distractors");
            }
        }
    }

    #[test]
    fn test_test_set_is_truncated() {
        let catalog = StaticCatalog::new(SignalSet::Test);
        assert_eq!(
            catalog.answer_sequence("Blue Line North East").unwrap(),
            vec!["O2RA", "O2LB", "O046"]
        );
        assert_eq!(
            catalog.keypad_sequence("Blue Line North East").unwrap(),
            vec!["2", "046", "089"]
        );
    }

    #[test]
    fn test_full_set() {
        let catalog = StaticCatalog::new(SignalSet::Full);
        assert_eq!(catalog.lines().len(), 8);
        assert_eq!(catalog.answer_sequence("Green Line West").unwrap().len(), 39);
        assert_eq!(catalog.keypad_sequence("Orange Line East").unwrap().len(), 5);
    }

    #[test]
    fn test_pool_collapses_repeats() {
        let catalog = StaticCatalog::new(SignalSet::Full);
        let pool = catalog.distractor_pool("Orange Line East").unwrap();
        let raw = lookup(INCORRECT_SIGNALS, "Orange Line East").unwrap();
        assert!(pool.len() < raw.len());
        assert!(pool.contains("E9RA"));
    }

    #[test]
    fn test_hotspots_span_two_pages() {
        let catalog = StaticCatalog::default();
        let hotspots = catalog.hotspots("Green Line East").unwrap();
        assert_eq!(hotspots.len(), 10);
        assert_eq!(hotspots[0].page, 1);
        assert_eq!(hotspots[9].page, 2);
        assert_eq!(hotspots[9].code, "Signal 10");
    }

    #[test]
    fn test_unknown_line() {
        let catalog = StaticCatalog::default();
        assert!(matches!(
            catalog.answer_sequence("Purple Line"),
            Err(EngineError::UnknownLine(_))
        ));
        assert!(catalog.distractor_pool("Purple Line").is_err());
    }
}
