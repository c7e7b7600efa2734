use tokio::task::LocalSet;

use stitch::error::Result;

use crate::site::Seamstress;

mod config;
mod site;

pub const CONFIG_FILE: &str = "seamstress.toml";

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// Composes a static site's pages from shared partials.
        cmd seamstress {
            /// Log debug output. `RUST_LOG` takes precedence.
            optional -v, --verbose

            /// Compose every page under `input` into `output`.
            cmd build {
                required input: PathBuf
                required output: PathBuf
                /// Render the event feed as of `YYYY-MM-DD[THH:MM[:SS]]`.
                optional --now now: String
                /// The locale to render the event feed in.
                optional --locale locale: String
            }

            /// Print the rendered event feed of the site at `input`.
            cmd events {
                required input: PathBuf
                optional --now now: String
                optional --locale locale: String
            }
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

async fn run(flags: flags::Seamstress) -> Result<()> {
    match flags.subcommand {
        flags::SeamstressCmd::Build(cmd) => {
            let site = Seamstress::new(&cmd.input, cmd.now.as_deref(), cmd.locale.as_deref())?;
            let summary = site.build(&cmd.output).await?;
            tracing::info!(?summary, output = %cmd.output.display(), "site built");
        }
        flags::SeamstressCmd::Events(cmd) => {
            let site = Seamstress::new(&cmd.input, cmd.now.as_deref(), cmd.locale.as_deref())?;
            let (state, container) = site.render_events().await?;
            tracing::debug!(?state, "rendered event feed");
            println!("{}", container.html());
        }
    }

    Ok(())
}

pub fn main() {
    let flags = flags::Seamstress::from_env_or_exit();
    init_logging(flags.verbose);

    let result = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(stitch::error::Error::from)
        .and_then(|runtime| LocalSet::new().block_on(&runtime, run(flags)));

    if let Err(e) = result {
        println!("error: {e}");
        std::process::exit(1);
    }
}
