#[cfg(feature = "cli")]
use clap::Parser;
use color_eyre::eyre::{Report, Result, WrapErr};
#[cfg(feature = "cli")]
use lcenv::{cli::Command, Cli};

fn main() -> Result<(), Report> {
    #[cfg(feature = "cli")]
    {
        // ------------------------------------------------------------------------
        // CLI Setup

        // Parse CLI parameters
        let args = Cli::parse();

        // initialize color_eyre crate for colorized logs
        color_eyre::install()?;

        // Set logging/verbosity level via RUST_LOG
        std::env::set_var("RUST_LOG", args.verbosity.to_string());

        // initialize env_logger crate for logging/verbosity level
        env_logger::init();

        // check which CLI command we're running (normalize, environment, samples)
        match args.command {
            // Normalize
            Command::Normalize(args) => _ = lcenv::normalize(&args)?,
            // Environment
            Command::Environment(args) => {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(args.threads)
                    .build_global()
                    .wrap_err("Failed to configure the thread pool.")?;
                let environments = lcenv::run(&args)?;
                println!("{}", environments.primary().summary());
            }
            // Samples
            Command::Samples(args) => _ = lcenv::samples(&args)?,
        }
    }

    Ok(())
}
