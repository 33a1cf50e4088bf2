use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
};

use clap::Parser;
use octpath::{
    find_path, spatial::BoxField, tree::SerializeError, Octree, OctreeSettings, PathResult,
    StepBudget, Unbounded,
};

mod cli;
use cli::Cli;

fn run(cli: &Cli) -> Result<(), octpath::Error> {
    let field: BoxField = cli.blocks.iter().copied().collect();

    let tree = match &cli.load {
        Some(path) => {
            let file = File::open(path).map_err(SerializeError::from)?;
            let tree = Octree::read_from(BufReader::new(file))?;
            tracing::info!(?path, octants = tree.len(), "loaded octree");
            tree
        }
        None => {
            let settings = OctreeSettings::new(cli.center, cli.size, cli.depth)
                .with_connection(cli.connection.into());
            let mut tree = Octree::new(settings)?;
            let stats = tree.bake(&field)?;
            tracing::info!(
                octants = tree.len(),
                leaves = stats.leaves(),
                links = stats.connections,
                queries = stats.queries,
                finest = settings.min_octant_size(),
                "baked octree"
            );
            tree
        }
    };

    if cli.print_tree {
        println!("{tree}");
    }

    if let Some(path) = &cli.output {
        let mut out = BufWriter::new(File::create(path).map_err(SerializeError::from)?);
        tree.write_to(&mut out)?;
        out.flush().map_err(SerializeError::from)?;
        tracing::info!(?path, "wrote octree");
    }

    if let (Some(from), Some(to)) = (cli.from, cli.to) {
        let nav = tree.navigator().with_sight(&field);
        let mode = cli.mode.into();
        let res = match cli.steps {
            Some(steps) => find_path(&nav, from, to, mode, StepBudget::new(steps))?,
            None => find_path(&nav, from, to, mode, Unbounded)?,
        };
        match res {
            PathResult::Found(path) => {
                println!("path of {} waypoints, cost {}", path.len(), path.cost);
                for p in &path.waypoints {
                    println!("  {:.3} {:.3} {:.3}", p.x, p.y, p.z);
                }
            }
            PathResult::NotFound => println!("no path"),
            PathResult::TimedOut => println!("search ran out of steps"),
        }
    }

    Ok(())
}

pub fn main() {
    let cli = Cli::parse();
    cli::initialize_tracing(&cli.log_filter, cli.log_format);
    tracing::trace!(?cli);

    if let Err(e) = run(&cli) {
        tracing::error!(error = %e, "navbake failed");
        std::process::exit(1);
    }
}
