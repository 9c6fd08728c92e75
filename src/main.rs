use std::path::PathBuf;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use kiln::{reflect, ResourceType, SetLayoutAggregator};

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let paths = std::env::args_os().skip(1).map(PathBuf::from).collect::<Vec<_>>();
    if paths.is_empty() {
        return Err(eyre!("usage: kiln <shader.spv>..."));
    }

    let mut aggregator = SetLayoutAggregator::new();
    for path in &paths {
        let code = std::fs::read(path)?;
        let reflection = reflect(&code)
            .map_err(|err| eyre!("{}: {}", path.display(), err))?;

        println!("{} ({:?})", path.display(), reflection.stage);
        for binding in &reflection.bindings {
            println!(
                "  set {} slot {}: {:?} x{}",
                binding.set, binding.slot, binding.resource_type, binding.count,
            );
        }

        aggregator.add(&reflection)?;
    }

    let description = aggregator.describe()?;
    println!();
    println!("pipeline layout ({:?})", aggregator.stages());
    for (set, bindings) in description.sets.iter().enumerate() {
        println!("  set {}", set);
        if bindings.is_empty() {
            println!("    (empty)");
        }
        for binding in bindings {
            println!(
                "    slot {}: {:?} x{} {:?}",
                binding.slot, binding.resource_type, binding.count, binding.stage_flags,
            );
        }
    }

    println!();
    println!("pool sizing per draw");
    if description.pool_sizing.is_empty() {
        println!("  (none)");
    }
    for &ty in ResourceType::ALL {
        let count = description.pool_sizing.get(ty);
        if count > 0 {
            println!("  {:?}: {}", ty, count);
        }
    }

    Ok(())
}
