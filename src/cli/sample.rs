//! The `sample` command: generate and display one random program.

use super::symreg;
use super::CliError;
use arbor::{Tree, UniformSource};

/// Execute the sample command.
pub(crate) fn execute(
    params: usize,
    max_depth: usize,
    max_width: usize,
    seed: Option<u64>,
) -> Result<(), CliError> {
    if params == 0 {
        return Err(CliError::new("programs need at least one parameter"));
    }

    let mut rng = seed.map_or_else(UniformSource::from_entropy, UniformSource::seeded);
    let tree = Tree::random(params, max_depth, max_width, &symreg::palette(), &mut rng);

    print!("{tree}");

    let inputs = vec![1i64; params];
    println!("output: {}", tree.call(&inputs)?);

    Ok(())
}
