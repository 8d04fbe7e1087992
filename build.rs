// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("melpazoid")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Check MELPA recipes and the packages they point at")
        .subcommand_required(false)
        .arg(
            Arg::new("no_build")
                .long("no-build")
                .global(true)
                .action(clap::ArgAction::SetTrue)
                .help("Skip the containerized build"),
        )
        .subcommand(
            Command::new("recipe")
                .about("Check a recipe given as text")
                .arg(Arg::new("recipe").required(true).help("Recipe expression")),
        )
        .subcommand(
            Command::new("recipe-file")
                .about("Check a recipe stored in a file")
                .arg(Arg::new("path").required(true).help("Path to the recipe file")),
        )
        .subcommand(
            Command::new("pr")
                .about("Check a MELPA pull request")
                .arg(Arg::new("url").required(true).help("Pull request URL")),
        )
        .subcommand(Command::new("watch").about("Watch the clipboard for MELPA pull request URLs"))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("melpazoid.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
