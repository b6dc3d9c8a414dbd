use vergen_gitcl::{CargoBuilder, Emitter, GitclBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
	let cargo = CargoBuilder::default().target_triple(true).build()?;
	let gitcl = GitclBuilder::default().sha(true).build()?;

	// Outside a git checkout the git instructions fall back to idempotent placeholder values.
	Emitter::default().add_instructions(&cargo)?.add_instructions(&gitcl)?.emit()?;

	Ok(())
}
