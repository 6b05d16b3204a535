use log::warn;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::prelude::ChannelTable;

/// Total number of channels in the built-in table.
pub const NUMBER_OF_CHANNELS: usize = 54;

const BAND_III: [(&str, u32); 38] = [
    ("5A", 174_928_000),
    ("5B", 176_640_000),
    ("5C", 178_352_000),
    ("5D", 180_064_000),
    ("6A", 181_936_000),
    ("6B", 183_648_000),
    ("6C", 185_360_000),
    ("6D", 187_072_000),
    ("7A", 188_928_000),
    ("7B", 190_640_000),
    ("7C", 192_352_000),
    ("7D", 194_064_000),
    ("8A", 195_936_000),
    ("8B", 197_648_000),
    ("8C", 199_360_000),
    ("8D", 201_072_000),
    ("9A", 202_928_000),
    ("9B", 204_640_000),
    ("9C", 206_352_000),
    ("9D", 208_064_000),
    ("10A", 209_936_000),
    ("10B", 211_648_000),
    ("10C", 213_360_000),
    ("10D", 215_072_000),
    ("11A", 216_928_000),
    ("11B", 218_640_000),
    ("11C", 220_352_000),
    ("11D", 222_064_000),
    ("12A", 223_936_000),
    ("12B", 225_648_000),
    ("12C", 227_360_000),
    ("12D", 229_072_000),
    ("13A", 230_784_000),
    ("13B", 232_496_000),
    ("13C", 234_208_000),
    ("13D", 235_776_000),
    ("13E", 237_488_000),
    ("13F", 239_200_000),
];

const L_BAND: [(&str, u32); 16] = [
    ("LA", 1_452_960_000),
    ("LB", 1_454_672_000),
    ("LC", 1_456_384_000),
    ("LD", 1_458_096_000),
    ("LE", 1_459_808_000),
    ("LF", 1_461_520_000),
    ("LG", 1_463_232_000),
    ("LH", 1_464_944_000),
    ("LI", 1_466_656_000),
    ("LJ", 1_468_368_000),
    ("LK", 1_470_080_000),
    ("LL", 1_471_792_000),
    ("LM", 1_473_504_000),
    ("LN", 1_475_216_000),
    ("LO", 1_476_928_000),
    ("LP", 1_478_640_000),
];

/// Which part of the DAB allocation to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    #[default]
    All,
    Band3,
    LBand,
}

impl FromStr for Band {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Band::All),
            "band3" | "bandiii" | "iii" => Ok(Band::Band3),
            "lband" | "l" => Ok(Band::LBand),
            other => Err(format!("unknown band '{}'", other)),
        }
    }
}

/// Ordered list of named DAB channels with their centre frequencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DabChannels {
    entries: Vec<(String, u32)>,
}

impl DabChannels {
    pub fn new(band: Band) -> Self {
        let band_iii = BAND_III.iter();
        let l_band = L_BAND.iter();
        let entries = match band {
            Band::All => band_iii.chain(l_band).collect::<Vec<_>>(),
            Band::Band3 => band_iii.collect(),
            Band::LBand => l_band.collect(),
        };

        Self {
            entries: entries
                .into_iter()
                .map(|(name, freq)| (name.to_string(), *freq))
                .collect(),
        }
    }

    /// Builds a table from explicit entries, in the given order. A repeated
    /// name keeps its first entry; later repeats are dropped.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut unique: Vec<(String, u32)> = Vec::new();
        for (name, freq) in entries {
            let name: String = name.into();
            if unique.iter().any(|(n, _)| *n == name) {
                warn!("dropping repeated channel {} ({} Hz)", name, freq);
                continue;
            }
            unique.push((name, freq));
        }
        Self { entries: unique }
    }

    /// Keeps only the named channels, preserving table order.
    /// Names are matched case-insensitively; unknown names are reported back.
    pub fn restrict_to(&self, names: &[String]) -> Result<Self, String> {
        if let Some(unknown) = names
            .iter()
            .find(|name| !self.entries.iter().any(|(n, _)| n.eq_ignore_ascii_case(name)))
        {
            return Err(unknown.clone());
        }

        let entries = self
            .entries
            .iter()
            .filter(|(n, _)| names.iter().any(|name| n.eq_ignore_ascii_case(name)))
            .cloned()
            .collect();
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(name, freq)| (name.as_str(), *freq))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }
}

impl Default for DabChannels {
    fn default() -> Self {
        Self::new(Band::All)
    }
}

impl ChannelTable for DabChannels {
    fn first_channel(&self) -> Option<&str> {
        self.entries.first().map(|(name, _)| name.as_str())
    }

    fn next_channel(&self, current: &str) -> Option<&str> {
        let idx = self.position(current)?;
        self.entries.get(idx + 1).map(|(name, _)| name.as_str())
    }

    fn frequency_of(&self, name: &str) -> Option<u32> {
        self.position(name).map(|idx| self.entries[idx].1)
    }

    fn channel_count(&self) -> usize {
        self.entries.len()
    }
}
