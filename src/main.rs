use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use env_logger::Env;
use log::error;
use ngemeng::build::build_site;
use ngemeng::config::Config;
use std::path::PathBuf;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let matches = App::new("ngemeng")
        .version(crate_version!())
        .about("A static blog generator")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site")
                .arg(
                    Arg::with_name("project")
                        .short("p")
                        .long("project")
                        .takes_value(true)
                        .help("A directory inside the project (defaults to the working directory)"),
                )
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .help("Overrides the output directory from the project file"),
                ),
        )
        .get_matches();

    if let Some(matches) = matches.subcommand_matches("build") {
        if let Err(e) = build(matches) {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn build(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let project = std::fs::canonicalize(matches.value_of("project").unwrap_or("."))?;
    let mut config = Config::from_directory(&project)?;
    if let Some(output) = matches.value_of("output") {
        config.output_directory = PathBuf::from(output);
    }
    build_site(&config)?;
    Ok(())
}
