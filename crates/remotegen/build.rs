// Renders man pages for `remotegen` and each visible subcommand into
// `$OUT_DIR/man`. Only the clap definitions are compiled in here.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;

#[path = "src/cli.rs"]
mod cli;

fn main() -> io::Result<()> {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = std::env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::other("OUT_DIR not set by Cargo"))?;
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir)?;

    render_pages(&cli::Cli::command(), &man_dir)
}

/// `remotegen.1`, `remotegen-generate.1`, `remotegen-manifest-show.1`, ...
fn render_pages(cmd: &clap::Command, dir: &Path) -> io::Result<()> {
    let name = cmd.get_name().to_owned();
    let mut page = Vec::new();
    clap_mangen::Man::new(cmd.clone()).render(&mut page)?;
    fs::write(dir.join(format!("{name}.1")), page)?;

    for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
        let sub = sub.clone().name(format!("{name}-{}", sub.get_name()));
        render_pages(&sub, dir)?;
    }
    Ok(())
}
