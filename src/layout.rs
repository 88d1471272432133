use crate::error::Result;
use crate::glyph::{GlyphKind, Placement};
use crate::library::ConstructDescriptor;
use crate::palette::color_for;
use crate::part_token::{PartToken, PartType};
use crate::settings::RenderSettings;
use serde::Serialize;

/// Cells reserved for an absent promoter (room for its terminator too).
const ABSENT_PROMOTER_CELLS: u32 = 4;
const ABSENT_PART_CELLS: u32 = 2;
const PART_CELLS: u32 = 2;
const PLASMID_CELLS: u32 = 1;

/// One laid out construct row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagram {
    pub key: String,
    pub display_id: String,
    pub base_y: f64,
    pub placements: Vec<Placement>,
    /// Cursor position after the last real part, before the closing terminator.
    pub final_cursor: u32,
    pub right_edge: f64,
}

impl Diagram {
    pub fn count(&self, kind: GlyphKind) -> usize {
        self.placements.iter().filter(|p| p.kind == kind).count()
    }
}

/// Turns constructs into placed glyphs. Element ids (`cds7`, `term3`, ...)
/// come from a counter owned by the engine and reset for every diagram;
/// parts named after their identifier still advance it.
#[derive(Clone, Debug)]
pub struct LayoutEngine {
    cell_width: f64,
    slot_height: f64,
    variant_colors: bool,
    next_id: usize,
}

/// Per-diagram state threaded through the walk over the part slots.
struct RowState {
    placements: Vec<Placement>,
    /// Index of the glyph the next connector starts from.
    trailing: usize,
    cursor: u32,
    row_y: f64,
}

impl RowState {
    fn has_parts(&self) -> bool {
        self.placements.len() > 1
    }

    fn place(&mut self, glyph: Placement) {
        self.placements.push(glyph);
        self.trailing = self.placements.len() - 1;
    }
}

impl LayoutEngine {
    pub fn new(cell_width: f64, slot_height: f64, variant_colors: bool) -> Self {
        Self {
            cell_width,
            slot_height,
            variant_colors,
            next_id: 0,
        }
    }

    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self::new(
            settings.cell_width,
            settings.slot_height,
            settings.variant_colors,
        )
    }

    fn next_id(&mut self, kind: GlyphKind) -> String {
        self.next_id += 1;
        format!("{}{}", kind.id_prefix(), self.next_id)
    }

    fn cursor_x(&self, cursor: u32) -> f64 {
        f64::from(cursor) * self.cell_width
    }

    fn color(&self, token: &PartToken) -> Result<Option<usize>> {
        color_for(token, self.variant_colors)
    }

    /// Appends `glyph`, preceded by a connector from the trailing glyph.
    fn attach(&mut self, row: &mut RowState, glyph: Placement) {
        let line_id = self.next_id(GlyphKind::Connector);
        let line = Placement::connector(line_id, &row.placements[row.trailing], &glyph);
        row.placements.push(line);
        row.place(glyph);
    }

    pub fn layout(
        &mut self,
        key: &str,
        construct: &ConstructDescriptor,
        base_y: f64,
    ) -> Result<Diagram> {
        self.next_id = 0;
        let title_id = self.next_id(GlyphKind::Title);
        let title = Placement::title(
            title_id,
            construct.display_id(),
            self.cell_width,
            base_y + 0.5 * self.slot_height,
            self.cell_width,
        );
        let mut row = RowState {
            placements: vec![title],
            trailing: 0,
            cursor: 1,
            row_y: base_y + self.slot_height,
        };

        for (token, identifier) in construct.slots() {
            let Some(identifier) = identifier else {
                row.cursor += match token.part_type {
                    PartType::Promoter => ABSENT_PROMOTER_CELLS,
                    _ => ABSENT_PART_CELLS,
                };
                continue;
            };
            self.place_part(&mut row, token, identifier)?;
        }

        let final_cursor = row.cursor;
        let term_id = self.next_id(GlyphKind::Terminator);
        let term = Placement::terminator(term_id, self.cursor_x(row.cursor), row.row_y, None);
        self.attach(&mut row, term);

        let right_edge = row
            .placements
            .iter()
            .map(Placement::right)
            .fold(self.cell_width, f64::max);
        tracing::trace!(construct = key, placements = row.placements.len(), "laid out");
        Ok(Diagram {
            key: key.to_string(),
            display_id: construct.display_id().to_string(),
            base_y,
            placements: row.placements,
            final_cursor,
            right_edge,
        })
    }

    fn place_part(
        &mut self,
        row: &mut RowState,
        token: &PartToken,
        identifier: &str,
    ) -> Result<()> {
        let x = self.cursor_x(row.cursor);
        let y = row.row_y;
        match token.part_type {
            PartType::Plasmid => {
                // Anchored to the backbone start rather than the cursor
                let x = row.placements.len() as f64 * self.cell_width;
                let glyph = Placement::promoter(identifier.to_string(), identifier, x, y, None);
                self.next_id += 1;
                row.place(glyph);
                row.cursor += PLASMID_CELLS;
            }
            PartType::Origin => {
                let color = self.color(token)?;
                let glyph = Placement::origin(identifier.to_string(), identifier, x, y, color);
                self.next_id += 1;
                row.place(glyph);
                row.cursor += PART_CELLS;
            }
            PartType::Resistance | PartType::Gene => {
                let color = self.color(token)?;
                let glyph = Placement::cds(identifier.to_string(), identifier, x, y, color);
                self.next_id += 1;
                self.attach(row, glyph);
                row.cursor += PART_CELLS;
            }
            PartType::Promoter => {
                let color = self.color(token)?;
                // Each transcriptional unit after the first is closed first
                if row.has_parts() {
                    let term_id = self.next_id(GlyphKind::Terminator);
                    let term = Placement::terminator(term_id, self.cursor_x(row.cursor), y, color);
                    self.attach(row, term);
                    row.cursor += PART_CELLS;
                }
                let x = self.cursor_x(row.cursor);
                let glyph = Placement::promoter(identifier.to_string(), identifier, x, y, color);
                self.next_id += 1;
                self.attach(row, glyph);
                row.cursor += PART_CELLS;
            }
        }
        Ok(())
    }
}
