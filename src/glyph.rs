use serde::{Deserialize, Serialize};

/// Vertical position of the backbone in glyph-local coordinates. Every local
/// shape is shifted by `(x, y - BACKBONE_Y)` when placed.
pub const BACKBONE_Y: f64 = 50.0;

pub const CDS_OUTLINE: [(f64, f64); 5] = [
    (9.0, 65.0),
    (27.0, 65.0),
    (42.0, 50.0),
    (27.0, 35.0),
    (9.0, 35.0),
];
pub const PROMOTER_ARROW: [(f64, f64); 3] = [(31.5, 15.5), (40.0, 23.0), (31.5, 30.333)];
pub const PROMOTER_STEM: [(f64, f64); 3] = [(10.0, 50.0), (10.0, 23.0), (39.0, 23.0)];
pub const TERMINATOR_STEM: [(f64, f64); 2] = [(25.0, 50.0), (25.0, 26.0)];
pub const TERMINATOR_BAR: [(f64, f64); 2] = [(10.0, 25.0), (40.0, 25.0)];
pub const ORIGIN_RADIUS: f64 = 12.0;

/// Terminators are drawn this far right of their cursor slot.
pub const TERMINATOR_OFFSET: f64 = 40.0;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum GlyphKind {
    Title,
    Promoter,
    Cds,
    Terminator,
    Origin,
    Connector,
}

impl GlyphKind {
    /// Prefix of generated element ids.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Promoter => "prom",
            Self::Cds => "cds",
            Self::Terminator => "term",
            Self::Origin => "ori",
            Self::Connector => "line",
        }
    }

    /// Whether the palette colour fills the shape (as opposed to stroking it).
    pub fn is_filled(self) -> bool {
        matches!(self, Self::Cds | Self::Origin)
    }
}

/// A positioned primitive. `inbound`/`outbound` are the x coordinates where
/// connectors attach on either side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub kind: GlyphKind,
    pub id: String,
    /// Position the glyph was requested at, before its own offsets.
    pub origin_x: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub inbound: f64,
    pub outbound: f64,
    pub color: Option<usize>,
    pub label: String,
}

impl Placement {
    pub fn title(id: String, text: &str, x: f64, y: f64, width: f64) -> Self {
        Self {
            kind: GlyphKind::Title,
            id,
            origin_x: x,
            x,
            y,
            width,
            height: 0.0,
            inbound: x,
            outbound: x + width,
            color: None,
            label: text.to_string(),
        }
    }

    pub fn cds(id: String, label: &str, x: f64, y: f64, color: Option<usize>) -> Self {
        let (left, _) = CDS_OUTLINE[0];
        let (tip, _) = CDS_OUTLINE[2];
        let (_, bottom) = CDS_OUTLINE[0];
        let (_, top) = CDS_OUTLINE[3];
        Self {
            kind: GlyphKind::Cds,
            id,
            origin_x: x,
            x: x + left,
            y,
            width: tip - left,
            height: bottom - top,
            inbound: x + left,
            outbound: x + tip,
            color,
            label: label.to_string(),
        }
    }

    /// Arrow over a stem. Both anchors sit at the placement x.
    pub fn promoter(id: String, label: &str, x: f64, y: f64, color: Option<usize>) -> Self {
        Self {
            kind: GlyphKind::Promoter,
            id,
            origin_x: x,
            x,
            y,
            width: PROMOTER_ARROW[1].0 - PROMOTER_STEM[0].0,
            height: PROMOTER_STEM[0].1 - PROMOTER_ARROW[0].1,
            inbound: x,
            outbound: x,
            color,
            label: label.to_string(),
        }
    }

    pub fn terminator(id: String, x: f64, y: f64, color: Option<usize>) -> Self {
        let drawn = x + TERMINATOR_OFFSET;
        Self {
            kind: GlyphKind::Terminator,
            id,
            origin_x: x,
            x: drawn,
            y,
            width: TERMINATOR_BAR[1].0 - TERMINATOR_BAR[0].0,
            height: TERMINATOR_STEM[0].1 - TERMINATOR_BAR[0].1,
            inbound: drawn,
            outbound: drawn,
            color,
            label: String::new(),
        }
    }

    pub fn origin(id: String, label: &str, x: f64, y: f64, color: Option<usize>) -> Self {
        Self {
            kind: GlyphKind::Origin,
            id,
            origin_x: x,
            x,
            y,
            width: 2.0 * ORIGIN_RADIUS,
            height: 2.0 * ORIGIN_RADIUS,
            inbound: x,
            outbound: x + 2.0 * ORIGIN_RADIUS,
            color,
            label: label.to_string(),
        }
    }

    /// Line from the outbound anchor of `from` to the inbound anchor of `to`.
    pub fn connector(id: String, from: &Placement, to: &Placement) -> Self {
        let (x1, y1) = (from.outbound, from.y);
        let (x2, y2) = (to.inbound, to.y);
        Self {
            kind: GlyphKind::Connector,
            id,
            origin_x: x1,
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
            inbound: x1,
            outbound: x2,
            color: None,
            label: String::new(),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Shifts a glyph-local polyline to this placement.
    pub fn shift(&self, points: &[(f64, f64)]) -> Vec<(f64, f64)> {
        points
            .iter()
            .map(|(px, py)| (px + self.origin_x, py + self.y - BACKBONE_Y))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cds_geometry() {
        let cds = Placement::cds("cds1".into(), "SBC001", 150.0, 200.0, Some(0));
        assert_eq!(cds.x, 159.0);
        assert_eq!(cds.width, 33.0);
        assert_eq!(cds.height, 30.0);
        assert_eq!((cds.inbound, cds.outbound), (159.0, 192.0));
        assert_eq!(cds.shift(&CDS_OUTLINE)[2], (192.0, 200.0));
    }

    #[test]
    fn test_promoter_anchors_coincide() {
        let prom = Placement::promoter("prom1".into(), "SBC002", 100.0, 200.0, Some(1));
        assert_eq!(prom.inbound, 100.0);
        assert_eq!(prom.outbound, 100.0);
        assert_eq!(prom.width, 30.0);
        assert_eq!(prom.height, 34.5);
    }

    #[test]
    fn test_terminator_is_drawn_behind_its_slot() {
        let term = Placement::terminator("term1".into(), 100.0, 200.0, None);
        assert_eq!(term.x, 140.0);
        assert_eq!((term.inbound, term.outbound), (140.0, 140.0));
        assert_eq!((term.width, term.height), (30.0, 25.0));
        // Shapes are still drawn relative to the requested position
        assert_eq!(term.shift(&TERMINATOR_BAR)[0], (110.0, 175.0));
    }

    #[test]
    fn test_connector_joins_anchors() {
        let origin = Placement::origin("ori1".into(), "SBC001", 50.0, 200.0, Some(0));
        let cds = Placement::cds("cds2".into(), "SBC002", 150.0, 200.0, Some(1));
        let line = Placement::connector("line3".into(), &origin, &cds);
        assert_eq!(line.x, 74.0);
        assert_eq!(line.right(), 159.0);
        assert_eq!(line.height, 0.0);
    }
}
