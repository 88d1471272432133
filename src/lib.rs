pub mod assembler;
pub mod doe_file;
pub mod error;
pub mod external;
pub mod glyph;
pub mod layout;
pub mod library;
pub mod palette;
pub mod part_token;
pub mod render_svg;
pub mod resolver;
pub mod settings;

use assembler::{Assembly, assemble};
use library::ConstructFailure;
use resolver::{ResolveInput, resolve};
use settings::RenderSettings;

/// Resolves and lays out a whole library. Constructs that fail at either
/// stage are listed in `Assembly::failures`, resolution failures first.
pub fn build_assembly(input: &ResolveInput, settings: &RenderSettings) -> Assembly {
    let resolution = resolve(input);
    let mut assembly = assemble(&resolution.library, settings);
    let mut failures: Vec<ConstructFailure> = resolution.failures;
    failures.append(&mut assembly.failures);
    assembly.failures = failures;
    assembly
}
