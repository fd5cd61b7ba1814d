//! Loaders command implementation.

use stratum_segment::LoaderRegistry;

/// Runs the loaders command.
pub fn run() {
    for name in LoaderRegistry::with_builtin().names() {
        println!("{name}");
    }
}
