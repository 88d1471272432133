use crate::error::{Result, VisError};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    static ref COLUMN_SUFFIX: Regex = Regex::new("([0-9]+)$").expect("Invalid column regex");
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum PartType {
    Plasmid,
    Origin,
    Resistance,
    Promoter,
    Gene,
}

impl PartType {
    pub const ALL: [PartType; 5] = [
        Self::Plasmid,
        Self::Origin,
        Self::Resistance,
        Self::Promoter,
        Self::Gene,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plasmid => "plasmid",
            Self::Origin => "origin",
            Self::Resistance => "resistance",
            Self::Promoter => "promoter",
            Self::Gene => "gene",
        }
    }

    /// Exact, case-sensitive lookup of a type name.
    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == text)
    }
}

impl fmt::Display for PartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One part slot of a construct, written `<type><column>_<level>`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PartToken {
    pub part_type: PartType,
    pub column_index: u32,
    pub level: u32,
}

impl PartToken {
    pub fn new(part_type: PartType, column_index: u32, level: u32) -> Self {
        Self {
            part_type,
            column_index,
            level,
        }
    }

    pub fn parse(token: &str) -> Result<Self> {
        let (prefix, level) = token
            .rsplit_once('_')
            .ok_or_else(|| VisError::malformed(token, "missing '_<level>' suffix"))?;
        if level.is_empty() || !level.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VisError::malformed(token, format!("level '{level}' is not a number")));
        }
        let level: u32 = level
            .parse()
            .map_err(|_| VisError::malformed(token, format!("level '{level}' is not a number")))?;
        let digits = COLUMN_SUFFIX
            .find(prefix)
            .ok_or_else(|| VisError::malformed(token, "missing column index"))?;
        let name = &prefix[..digits.start()];
        if name.is_empty() {
            return Err(VisError::malformed(token, "missing part type"));
        }
        let part_type = PartType::parse(name).ok_or_else(|| VisError::UnknownPartType {
            token: token.to_string(),
            part_type: name.to_string(),
        })?;
        let column_index: u32 = digits
            .as_str()
            .parse()
            .map_err(|_| VisError::malformed(token, "column index out of range"))?;
        if column_index == 0 {
            return Err(VisError::malformed(token, "column index must be at least 1"));
        }
        if level == 0 {
            return Err(VisError::malformed(token, "level must be at least 1"));
        }
        Ok(Self::new(part_type, column_index, level))
    }

    /// Palette position derived from the token alone. Coding parts are coloured
    /// by column, origins and promoters by level; plasmid backbones stay plain.
    /// May be negative for low columns, see `palette::resolve_index`.
    pub fn color_index(&self) -> Option<i64> {
        match self.part_type {
            PartType::Resistance | PartType::Gene => Some(i64::from(self.column_index / 2) - 2),
            PartType::Origin | PartType::Promoter => Some(i64::from(self.level) - 1),
            PartType::Plasmid => None,
        }
    }

    /// High-index, high-level promoter variants are never synthesized, so
    /// tab-separated identifier files leave no column for them.
    pub fn is_elided_promoter(&self) -> bool {
        self.part_type == PartType::Promoter && self.column_index > 3 && self.level >= 3
    }
}

impl fmt::Display for PartToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}_{}", self.part_type, self.column_index, self.level)
    }
}

/// Expands the one-letter type prefixes used in library files
/// (`p3_2` -> `promoter3_2`). Anything else is returned unchanged.
pub fn expand_abbreviation(token: &str) -> String {
    let split = token
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(token.len());
    let (name, rest) = token.split_at(split);
    let expanded = match name {
        "l" => "plasmid",
        "p" => "promoter",
        "g" => "gene",
        _ => return token.to_string(),
    };
    format!("{expanded}{rest}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token() {
        let token = PartToken::parse("promoter4_2").unwrap();
        assert_eq!(token.part_type, PartType::Promoter);
        assert_eq!(token.column_index, 4);
        assert_eq!(token.level, 2);
    }

    #[test]
    fn test_format_parse_round_trip() {
        for part_type in PartType::ALL {
            for (column, level) in [(1, 1), (7, 3), (12, 10)] {
                let token = PartToken::new(part_type, column, level);
                assert_eq!(PartToken::parse(&token.to_string()).unwrap(), token);
            }
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            PartToken::parse("promoter4"),
            Err(VisError::MalformedToken { .. })
        ));
        assert!(matches!(
            PartToken::parse("promoter_2"),
            Err(VisError::MalformedToken { .. })
        ));
        assert!(matches!(
            PartToken::parse("4_2"),
            Err(VisError::MalformedToken { .. })
        ));
        assert!(matches!(
            PartToken::parse("gene5_x"),
            Err(VisError::MalformedToken { .. })
        ));
        assert!(matches!(
            PartToken::parse("gene5_+3"),
            Err(VisError::MalformedToken { .. })
        ));
        assert!(matches!(
            PartToken::parse("gene5_"),
            Err(VisError::MalformedToken { .. })
        ));
        assert!(matches!(
            PartToken::parse("gene0_1"),
            Err(VisError::MalformedToken { .. })
        ));
        assert!(matches!(
            PartToken::parse("Gene5_1"),
            Err(VisError::UnknownPartType { .. })
        ));
        assert!(matches!(
            PartToken::parse("rbs3_1"),
            Err(VisError::UnknownPartType { .. })
        ));
    }

    #[test]
    fn test_color_index() {
        let idx = |s: &str| PartToken::parse(s).unwrap().color_index();
        assert_eq!(idx("gene5_2"), Some(0));
        assert_eq!(idx("gene7_1"), Some(1));
        assert_eq!(idx("resistance2_1"), Some(-1));
        assert_eq!(idx("origin1_3"), Some(2));
        assert_eq!(idx("promoter4_1"), Some(0));
        assert_eq!(idx("plasmid1_1"), None);
    }

    #[test]
    fn test_elided_promoter() {
        assert!(PartToken::parse("promoter4_3").unwrap().is_elided_promoter());
        assert!(!PartToken::parse("promoter3_3").unwrap().is_elided_promoter());
        assert!(!PartToken::parse("promoter4_2").unwrap().is_elided_promoter());
        assert!(!PartToken::parse("gene5_3").unwrap().is_elided_promoter());
    }

    #[test]
    fn test_expand_abbreviation() {
        assert_eq!(expand_abbreviation("p3_2"), "promoter3_2");
        assert_eq!(expand_abbreviation("g5_1"), "gene5_1");
        assert_eq!(expand_abbreviation("l1_1"), "plasmid1_1");
        assert_eq!(expand_abbreviation("origin1_1"), "origin1_1");
    }
}
