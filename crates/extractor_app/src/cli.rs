use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use extractor_core::{MapsForm, Msg, ServiceKind};
use log::LevelFilter;

use crate::platform::logging::LogDestination;

#[derive(Parser, Debug)]
#[command(name = "extractor")]
#[command(about = "Run web extraction jobs and watch their progress")]
#[command(version)]
pub struct Cli {
    /// Settings file (defaults to ./extractor.ron when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Where log output goes
    #[arg(long, value_enum, global = true, default_value_t = LogTarget::File)]
    pub log: LogTarget,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: ServiceCommand,
}

impl Cli {
    pub fn level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
    Off,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
            LogTarget::Off => LogDestination::Off,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ServiceCommand {
    /// Crawl a website and extract its content
    Crawl {
        /// Website address, with or without a scheme
        url: String,
    },
    /// Search several engines for a topic
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Find the best Reddit posts for a query
    Reddit {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Crawl Google Maps for places
    Maps(MapsArgs),
    /// Describe a maps request in plain language
    MapsAdvanced {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
}

#[derive(Args, Debug)]
pub struct MapsArgs {
    /// Where to search, e.g. "Sabha, Libya"
    #[arg(long)]
    pub location: String,

    /// Comma-separated search terms
    #[arg(long)]
    pub search: String,

    #[arg(long, default_value_t = 10)]
    pub max_places: u32,

    #[arg(long, default_value = "ar")]
    pub language: String,

    #[arg(long, default_value_t = 5)]
    pub max_reviews: u32,

    /// Do not collect reviewer personal data
    #[arg(long)]
    pub no_review_personal_data: bool,
}

impl ServiceCommand {
    pub fn service(&self) -> ServiceKind {
        match self {
            ServiceCommand::Crawl { .. } => ServiceKind::Crawl,
            ServiceCommand::Search { .. } => ServiceKind::Search,
            ServiceCommand::Reddit { .. } => ServiceKind::Reddit,
            ServiceCommand::Maps(_) => ServiceKind::Maps,
            ServiceCommand::MapsAdvanced { .. } => ServiceKind::MapsAdvanced,
        }
    }

    /// The messages that fill in the form for this command, ending with the
    /// submit.
    pub fn into_msgs(self) -> Vec<Msg> {
        let select = Msg::ServiceSelected(self.service());
        let input = match self {
            ServiceCommand::Crawl { url } => Msg::InputChanged(url),
            ServiceCommand::Search { query } | ServiceCommand::Reddit { query } => {
                Msg::InputChanged(query.join(" "))
            }
            ServiceCommand::MapsAdvanced { message } => Msg::InputChanged(message.join(" ")),
            ServiceCommand::Maps(args) => Msg::MapsFormChanged(MapsForm {
                location_query: args.location,
                search_terms: args.search,
                max_places: args.max_places,
                language: args.language,
                scrape_reviews_personal_data: !args.no_review_personal_data,
                max_reviews: args.max_reviews,
            }),
        };
        vec![select, input, Msg::Submitted]
    }
}
