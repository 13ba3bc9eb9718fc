use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parses `#rrggbb` or `rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// `schemeCategory10` followed by `schemeSet3`.
pub const PALETTE: [Rgb; 22] = [
    Rgb(0x1f, 0x77, 0xb4),
    Rgb(0xff, 0x7f, 0x0e),
    Rgb(0x2c, 0xa0, 0x2c),
    Rgb(0xd6, 0x27, 0x28),
    Rgb(0x94, 0x67, 0xbd),
    Rgb(0x8c, 0x56, 0x4b),
    Rgb(0xe3, 0x77, 0xc2),
    Rgb(0x7f, 0x7f, 0x7f),
    Rgb(0xbc, 0xbd, 0x22),
    Rgb(0x17, 0xbe, 0xcf),
    Rgb(0x8d, 0xd3, 0xc7),
    Rgb(0xff, 0xff, 0xb3),
    Rgb(0xbe, 0xba, 0xda),
    Rgb(0xfb, 0x80, 0x72),
    Rgb(0x80, 0xb1, 0xd3),
    Rgb(0xfd, 0xb4, 0x62),
    Rgb(0xb3, 0xde, 0x69),
    Rgb(0xfc, 0xcd, 0xe5),
    Rgb(0xd9, 0xd9, 0xd9),
    Rgb(0xbc, 0x80, 0xbd),
    Rgb(0xcc, 0xeb, 0xc5),
    Rgb(0xff, 0xed, 0x6f),
];

/// Fill for names outside the domain.
pub const FALLBACK: Rgb = Rgb(0xcc, 0xcc, 0xcc);

/// Ordinal scale from category name to palette color.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorMap {
    domain: Vec<String>,
}

impl ColorMap {
    pub fn from_categories<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut domain: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !domain.contains(&name) {
                domain.push(name);
            }
        }
        if domain.len() > PALETTE.len() {
            tracing::warn!(
                categories = domain.len(),
                palette = PALETTE.len(),
                "more categories than palette colors; colors will repeat"
            );
        }
        Self { domain }
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    pub fn len(&self) -> usize {
        self.domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domain.is_empty()
    }

    pub fn get(&self, name: &str) -> Rgb {
        match self.domain.iter().position(|d| d == name) {
            Some(i) => PALETTE[i % PALETTE.len()],
            None => FALLBACK,
        }
    }

    pub fn for_category(&self, category: Option<&str>) -> Rgb {
        category.map(|c| self.get(c)).unwrap_or(FALLBACK)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, Rgb)> + '_ {
        self.domain.iter().map(|d| (d.as_str(), self.get(d)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hex_round_trip() {
        assert_eq!(Rgb::from_hex("#1f77b4"), Some(PALETTE[0]));
        assert_eq!(PALETTE[21].to_hex(), "#ffed6f");
        assert_eq!(Rgb::from_hex("zzzzzz"), None);
        assert_eq!(Rgb::from_hex("#fff"), None);
    }

    #[test]
    fn first_names_take_first_colors() {
        let colors = ColorMap::from_categories(["Wii", "DS", "Wii", "X360"]);
        assert_eq!(colors.domain(), ["Wii", "DS", "X360"]);
        assert_eq!(colors.get("Wii"), PALETTE[0]);
        assert_eq!(colors.get("DS"), PALETTE[1]);
        assert_eq!(colors.get("X360"), PALETTE[2]);
        assert_eq!(colors.get("PS4"), FALLBACK);
        assert_eq!(colors.for_category(None), FALLBACK);
    }

    #[test]
    fn palette_cycles_past_its_end() {
        let names: Vec<String> = (0..24).map(|i| format!("c{i}")).collect();
        let colors = ColorMap::from_categories(names);
        assert_eq!(colors.get("c22"), PALETTE[0]);
        assert_eq!(colors.get("c23"), PALETTE[1]);
    }

    proptest! {
        #[test]
        fn prop_same_input_same_colors(names in prop::collection::vec("[a-z]{1,6}", 0..30)) {
            let a = ColorMap::from_categories(names.clone());
            let b = ColorMap::from_categories(names);
            let pa: Vec<_> = a.entries().map(|(n, c)| (n.to_string(), c)).collect();
            let pb: Vec<_> = b.entries().map(|(n, c)| (n.to_string(), c)).collect();
            prop_assert_eq!(pa, pb);
        }
    }
}
