use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs;

use luxplan::optimizer::Optimizer;
use luxplan::scene::{Scene, SceneOutput};
use luxplan::settings::{self, CliArgs};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();
    let settings = settings::load_config(&args)?;

    if args.print_config {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }
    println!("{}", settings);

    let path = args
        .scene
        .as_deref()
        .ok_or_else(|| anyhow!("no scene given, pass --scene <file.json>"))?;
    let (mut graph, rooms) = Scene::load(path)?.build(&settings);

    let report = Optimizer::new(settings).optimize(&mut graph, &rooms)?;
    println!("{}", report);

    let output = SceneOutput {
        lights: graph.lights().map(|(_, light)| light.clone()).collect(),
        graph: graph.to_indexed(),
        report,
    };
    let json = serde_json::to_string_pretty(&output).context("could not serialize result")?;
    match &args.output {
        Some(out) => {
            fs::write(out, json).with_context(|| format!("could not write {:?}", out))?;
            println!("Wrote {:?}", out);
        }
        None => println!("{}", json),
    }

    Ok(())
}
