use crate::layout::{Diagram, LayoutEngine};
use crate::library::{ConstructFailure, LibraryIndex};
use crate::settings::RenderSettings;
use rayon::prelude::*;

/// All diagrams of a library stacked on one canvas.
#[derive(Debug, Default)]
pub struct Assembly {
    pub diagrams: Vec<Diagram>,
    pub failures: Vec<ConstructFailure>,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

/// Top of the slot of the `index`-th construct.
pub fn slot_base(index: usize, slot_height: f64) -> f64 {
    (2.0 * index as f64 + 0.5) * slot_height
}

/// Lays out every construct in key order. A construct that fails keeps its
/// row empty, so the remaining rows do not move.
pub fn assemble(library: &LibraryIndex, settings: &RenderSettings) -> Assembly {
    let constructs = library.iter().collect::<Vec<_>>();
    let results = constructs
        .par_iter()
        .enumerate()
        .map(|(index, (key, construct))| {
            let base_y = slot_base(index, settings.slot_height);
            LayoutEngine::from_settings(settings)
                .layout(key, construct, base_y)
                .map_err(|error| ConstructFailure {
                    key: key.to_string(),
                    error,
                })
        })
        .collect::<Vec<_>>();

    let mut assembly = Assembly {
        canvas_width: settings.cell_width,
        canvas_height: settings.slot_height * (2.0 * constructs.len() as f64 + 0.5),
        ..Default::default()
    };
    for result in results {
        match result {
            Ok(diagram) => {
                assembly.canvas_width = assembly.canvas_width.max(diagram.right_edge);
                assembly.diagrams.push(diagram);
            }
            Err(failure) => {
                tracing::warn!(
                    construct = %failure.key,
                    error = %failure.error,
                    "construct not drawn"
                );
                assembly.failures.push(failure);
            }
        }
    }
    assembly
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::ConstructDescriptor;
    use crate::part_token::PartToken;

    fn library(rows: &[(&str, &[&str])]) -> LibraryIndex {
        let mut library = LibraryIndex::default();
        for (key, tokens) in rows {
            let tokens = tokens
                .iter()
                .map(|t| PartToken::parse(t).unwrap())
                .collect::<Vec<_>>();
            let ids = tokens.iter().map(|t| Some(t.to_string())).collect();
            library
                .insert(key, ConstructDescriptor::new(key, tokens, ids).unwrap())
                .unwrap();
        }
        library
    }

    #[test]
    fn test_assemble_stacks_in_key_order() {
        let library = library(&[
            ("C2", &["origin1_1", "gene5_1"][..]),
            ("C1", &["origin1_2", "promoter4_1", "gene5_2", "gene7_1"][..]),
        ]);
        let assembly = assemble(&library, &RenderSettings::default());
        assert!(assembly.failures.is_empty());
        let keys = assembly.diagrams.iter().map(|d| d.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["C1", "C2"]);
        assert_eq!(assembly.diagrams[0].base_y, 50.0);
        assert_eq!(assembly.diagrams[1].base_y, 250.0);
        assert_eq!(assembly.canvas_height, 450.0);
        let widest = assembly
            .diagrams
            .iter()
            .map(|d| d.right_edge)
            .fold(0.0, f64::max);
        assert_eq!(assembly.canvas_width, widest);
    }

    #[test]
    fn test_failed_construct_is_omitted() {
        let library = library(&[
            ("C1", &["origin1_1", "gene5_1"][..]),
            ("C2", &["origin1_1", "gene41_1"][..]),
            ("C3", &["origin1_1"][..]),
        ]);
        let assembly = assemble(&library, &RenderSettings::default());
        assert_eq!(assembly.failures.len(), 1);
        assert_eq!(assembly.failures[0].key, "C2");
        assert_eq!(assembly.diagrams.len(), 2);
        // C3 keeps the third slot
        assert_eq!(assembly.diagrams[1].base_y, slot_base(2, 100.0));
        assert_eq!(assembly.canvas_height, 650.0);
    }

    #[test]
    fn test_empty_library() {
        let assembly = assemble(&LibraryIndex::default(), &RenderSettings::default());
        assert!(assembly.diagrams.is_empty());
        assert_eq!(assembly.canvas_width, 50.0);
        assert_eq!(assembly.canvas_height, 50.0);
    }
}
