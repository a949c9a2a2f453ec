//! Config subcommand handlers.

use remotegen_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

/// Copy of `cfg` safe to print.
fn redacted(cfg: &Config) -> Config {
    let mut shown = cfg.clone();
    if shown.source.token.is_some() {
        shown.source.token = Some(REDACTED.into());
    }
    shown
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { path, force } => {
            let target = path.unwrap_or_else(remotegen_config::config_path);
            if target.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: target.display().to_string(),
                });
            }
            let written = remotegen_config::save_config(&Config::default(), Some(&target))?;
            if !global.quiet {
                eprintln!("Wrote {}", written.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(&crate::config::resolve(global)?);
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg)
                    .map_err(|e| CliError::Render(e.to_string()))?,
                _ => output::render_single(&global.output, &cfg, |_| String::new(), |_| String::new())?,
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", remotegen_config::config_path().display());
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn token_is_redacted_for_display() {
        let mut cfg = Config::default();
        cfg.source.token = Some("s3cret".into());
        let shown = redacted(&cfg);
        assert_eq!(shown.source.token.as_deref(), Some(REDACTED));
        assert_eq!(cfg.source.token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn absent_token_stays_absent() {
        assert!(redacted(&Config::default()).source.token.is_none());
    }
}
