use clap::{Parser, Subcommand};

mod commands;
mod errors;
mod validation;

pub use commands::run;

use crate::surface::panel::TimeWindow;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start maarifa as a service.
    Daemon {
        /// Address to listen on, overrides `daemon.listen` from config.yaml
        #[clap(short, long)]
        listen: Option<String>,
    },
    /// Save a page (or a selection from it) to the knowledge base
    Save {
        /// Page url
        #[clap(allow_hyphen_values = true)]
        url: String,

        /// Title of the tab, the page title is used otherwise
        #[clap(short, long)]
        title: Option<String>,

        /// Save this text instead of the whole page
        #[clap(short, long)]
        selection: Option<String>,
    },
    /// Search the knowledge base
    Search {
        query: String,

        /// Print the count
        #[clap(short = 'c', long, default_value = "false")]
        count: bool,
    },
    /// Print saved entries, newest first
    List {
        #[clap(short, long, value_enum, default_value_t)]
        window: TimeWindow,
    },
    /// Totals for all time, today and the last seven days
    Stats {},
    /// Rewrite a note in a more formal tone
    Rewrite { text: String },
    /// Show which AI capabilities are usable
    Capabilities {},
    /// Interactive popup
    Popup {},
    /// Interactive side panel
    Panel {
        #[clap(short, long, value_enum, default_value_t)]
        window: TimeWindow,
    },
    /// Open a saved entry in the browser
    Open { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_save() {
        let args = Args::try_parse_from([
            "maarifa",
            "save",
            "https://example.com",
            "--selection",
            "some text",
        ])
        .unwrap();

        match args.command {
            Command::Save {
                url,
                title,
                selection,
            } => {
                assert_eq!(url, "https://example.com");
                assert_eq!(title, None);
                assert_eq!(selection.as_deref(), Some("some text"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_window_defaults_to_all() {
        let args = Args::try_parse_from(["maarifa", "list"]).unwrap();
        assert!(matches!(args.command, Command::List { window: TimeWindow::All }));

        let args = Args::try_parse_from(["maarifa", "panel", "--window", "week"]).unwrap();
        assert!(matches!(args.command, Command::Panel { window: TimeWindow::Week }));

        assert!(Args::try_parse_from(["maarifa", "list", "-w", "decade"]).is_err());
    }
}
