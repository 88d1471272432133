use crate::error::{Result, VisError};
use crate::part_token::{PartToken, PartType};

pub const PALETTE: [&str; 10] = [
    "red",
    "blue",
    "green",
    "cyan",
    "magenta",
    "grey",
    "lavender",
    "darksalmon",
    "chartreuse",
    "orange",
];

pub fn palette_size() -> usize {
    PALETTE.len()
}

pub fn color_name(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Maps a derived index onto the palette. Negative indices count back from
/// the end of the palette, which is where the low-column resistance markers
/// have always been drawn.
pub fn resolve_index(token: &PartToken, index: i64) -> Result<usize> {
    let size = PALETTE.len() as i64;
    let resolved = if index < 0 { index + size } else { index };
    if (0..size).contains(&resolved) {
        Ok(resolved as usize)
    } else {
        Err(VisError::ColorIndexOutOfRange {
            token: token.to_string(),
            index,
            palette_size: PALETTE.len(),
        })
    }
}

/// Palette position for a token, `None` for uncoloured parts.
///
/// With `variant` set, genes are spread across the palette by level so that
/// several variants sharing a column stay distinguishable.
pub fn color_for(token: &PartToken, variant: bool) -> Result<Option<usize>> {
    let Some(base) = token.color_index() else {
        return Ok(None);
    };
    if variant && token.part_type == PartType::Gene {
        let size = PALETTE.len() as i64;
        let spread = (base + i64::from(token.level) - 1).rem_euclid(size);
        return Ok(Some(spread as usize));
    }
    resolve_index(token, base).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(s: &str) -> PartToken {
        PartToken::parse(s).unwrap()
    }

    #[test]
    fn test_standard_colors() {
        assert_eq!(color_for(&token("origin1_1"), false).unwrap(), Some(0));
        assert_eq!(color_for(&token("promoter4_2"), false).unwrap(), Some(1));
        assert_eq!(color_for(&token("gene9_1"), false).unwrap(), Some(2));
        assert_eq!(color_for(&token("plasmid1_1"), false).unwrap(), None);
    }

    #[test]
    fn test_negative_index_counts_from_end() {
        let idx = color_for(&token("resistance2_1"), false).unwrap().unwrap();
        assert_eq!(color_name(idx), "orange");
    }

    #[test]
    fn test_out_of_range_is_error() {
        assert!(matches!(
            color_for(&token("promoter4_11"), false),
            Err(VisError::ColorIndexOutOfRange { .. })
        ));
        assert!(matches!(
            color_for(&token("gene30_1"), false),
            Err(VisError::ColorIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_variant_mode_spreads_genes() {
        for s in ["gene5_1", "gene5_3", "gene7_4", "gene13_2", "gene11_9"] {
            let t = token(s);
            let standard = color_for(&t, false).unwrap().unwrap();
            let variant = color_for(&t, true).unwrap().unwrap();
            assert_eq!(variant, (standard + t.level as usize - 1) % palette_size());
        }
    }

    #[test]
    fn test_variant_mode_wraps_instead_of_failing() {
        assert_eq!(color_for(&token("gene30_1"), true).unwrap(), Some(3));
        // Only genes are affected
        assert_eq!(
            color_for(&token("promoter4_2"), true).unwrap(),
            color_for(&token("promoter4_2"), false).unwrap()
        );
    }
}
