use crate::assembler::Assembly;
use crate::glyph::{
    CDS_OUTLINE, GlyphKind, ORIGIN_RADIUS, PROMOTER_ARROW, PROMOTER_STEM, Placement,
    TERMINATOR_BAR, TERMINATOR_STEM,
};
use crate::palette::color_name;
use crate::settings::RenderSettings;
use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Group, Line, Path, Text};

fn px(value: f64) -> f32 {
    value as f32
}

fn polyline(points: &[(f64, f64)], closed: bool) -> Data {
    let mut data = Data::new();
    for (idx, (x, y)) in points.iter().enumerate() {
        let point = (px(*x), px(*y));
        data = if idx == 0 {
            data.move_to(point)
        } else {
            data.line_to(point)
        };
    }
    if closed { data.close() } else { data }
}

fn styled_group(glyph: &Placement, settings: &RenderSettings) -> Group {
    let mut group = Group::new()
        .set("id", glyph.id.clone())
        .set("stroke", settings.stroke_color.clone())
        .set("stroke-width", px(settings.stroke_width))
        .set("stroke-linecap", "round")
        .set("stroke-linejoin", "round")
        .set("font-family", settings.font_family.clone())
        .set("font-size", px(settings.font_size));
    if let Some(color) = glyph.color {
        let attribute = if glyph.kind.is_filled() { "fill" } else { "stroke" };
        group = group.set(attribute, color_name(color));
    }
    group
}

fn label(glyph: &Placement, settings: &RenderSettings) -> Text {
    let fill = match (glyph.kind, glyph.color) {
        (GlyphKind::Origin, _) | (_, None) => settings.stroke_color.clone(),
        (_, Some(color)) => color_name(color).to_string(),
    };
    Text::new(glyph.label.clone())
        .set("x", px(glyph.x))
        .set("y", px(glyph.y + settings.label_offset))
        .set("stroke", "none")
        .set("fill", fill)
}

fn glyph_node(glyph: &Placement, settings: &RenderSettings) -> Group {
    let group = styled_group(glyph, settings);
    match glyph.kind {
        GlyphKind::Title => group.add(
            Text::new(glyph.label.clone())
                .set("x", px(glyph.x))
                .set("y", px(glyph.y))
                .set("stroke", "none")
                .set("fill", "#000000")
                .set("font-size", px(settings.title_font_size)),
        ),
        GlyphKind::Cds => group
            .add(Path::new().set("d", polyline(&glyph.shift(&CDS_OUTLINE), true)))
            .add(label(glyph, settings)),
        GlyphKind::Promoter => group
            .add(
                Path::new()
                    .set("d", polyline(&glyph.shift(&PROMOTER_ARROW), false))
                    .set("fill", "none"),
            )
            .add(
                Path::new()
                    .set("d", polyline(&glyph.shift(&PROMOTER_STEM), false))
                    .set("fill", "none"),
            )
            .add(label(glyph, settings)),
        GlyphKind::Terminator => group
            .add(
                Path::new()
                    .set("d", polyline(&glyph.shift(&TERMINATOR_STEM), false))
                    .set("fill", "none"),
            )
            .add(
                Path::new()
                    .set("d", polyline(&glyph.shift(&TERMINATOR_BAR), false))
                    .set("fill", "none"),
            ),
        GlyphKind::Origin => group
            .add(
                Circle::new()
                    .set("cx", px(glyph.origin_x + ORIGIN_RADIUS))
                    .set("cy", px(glyph.y))
                    .set("r", px(ORIGIN_RADIUS)),
            )
            .add(label(glyph, settings)),
        GlyphKind::Connector => group.add(
            Line::new()
                .set("x1", px(glyph.x))
                .set("y1", px(glyph.y))
                .set("x2", px(glyph.x + glyph.width))
                .set("y2", px(glyph.y + glyph.height)),
        ),
    }
}

pub fn export_library_document(assembly: &Assembly, settings: &RenderSettings) -> Document {
    let width = assembly.canvas_width + settings.cell_width;
    let mut doc = Document::new().set(
        "viewBox",
        (0, 0, px(width), px(assembly.canvas_height)),
    );
    for diagram in &assembly.diagrams {
        for glyph in &diagram.placements {
            doc = doc.add(glyph_node(glyph, settings));
        }
    }
    doc
}

pub fn export_library_svg(assembly: &Assembly, settings: &RenderSettings) -> String {
    export_library_document(assembly, settings).to_string()
}
