use anyhow::Result;
use log::info;
use std::{env, fs};

use energy_mix::config::{Options, USAGE};
use energy_mix::data;
use energy_mix::energy::dashboard;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(options) = Options::from_args(&args) else {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    };

    let table = data::load_table(options.input())?;

    let metadata = match dashboard::describe(&table, options.filter()) {
        Ok(metadata) => metadata,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(2);
        },
    };
    println!("{}", metadata.summary());

    let selection = if options.columns().is_empty() {
        metadata.default_selection().clone()
    } else {
        options.columns().clone()
    };

    let plots = match dashboard::make_plots(&table, &selection) {
        Ok(plots) => plots,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(2);
        },
    };

    fs::create_dir_all(options.output_dir())?;
    for artifact in [plots.csv(), plots.bundle()] {
        let path = options.output_dir().join(artifact.file_name());
        fs::write(&path, artifact.bytes())?;
        info!("wrote {}", path.display());
    }

    Ok(())
}
