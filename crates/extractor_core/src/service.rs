//! The catalog of extraction services a user can pick from.

use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Crawl,
    Search,
    Reddit,
    Maps,
    MapsAdvanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Url,
    Text,
    /// The map crawl form instead of a single input.
    Places,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobModeKind {
    Streaming,
    Polling,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 5] = [
        ServiceKind::Crawl,
        ServiceKind::Search,
        ServiceKind::Reddit,
        ServiceKind::Maps,
        ServiceKind::MapsAdvanced,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ServiceKind::Crawl => "Website crawl",
            ServiceKind::Search => "Smart search",
            ServiceKind::Reddit => "Reddit search",
            ServiceKind::Maps => "Google Maps crawl",
            ServiceKind::MapsAdvanced => "Maps advanced mode",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ServiceKind::Crawl => "Extract the full content and data of any website",
            ServiceKind::Search => "Find specific information across several search engines",
            ServiceKind::Reddit => "Find the best Reddit posts and discussions for a query",
            ServiceKind::Maps => "Extract places, restaurants and businesses from Google Maps",
            ServiceKind::MapsAdvanced => "Describe a maps request in plain language",
        }
    }

    pub fn input_kind(self) -> InputKind {
        match self {
            ServiceKind::Crawl => InputKind::Url,
            ServiceKind::Search | ServiceKind::Reddit | ServiceKind::MapsAdvanced => InputKind::Text,
            ServiceKind::Maps => InputKind::Places,
        }
    }

    pub fn input_label(self) -> &'static str {
        match self {
            ServiceKind::Crawl => "Website URL",
            ServiceKind::Search => "What do you want to search for?",
            ServiceKind::Reddit => "What do you want to search for on Reddit?",
            ServiceKind::Maps => "Search settings",
            ServiceKind::MapsAdvanced => "Describe your maps request",
        }
    }

    pub fn mode(self) -> JobModeKind {
        match self {
            ServiceKind::Maps => JobModeKind::Polling,
            _ => JobModeKind::Streaming,
        }
    }

    pub fn step_names(self) -> [&'static str; 3] {
        match self {
            ServiceKind::Crawl => ["Crawler", "Content processor", "Data organizer"],
            ServiceKind::Search => ["Search engine", "Wikipedia", "Reddit"],
            ServiceKind::Reddit => ["Request analyser", "Reddit researcher", "Result ranker"],
            ServiceKind::Maps => ["Sending to API", "Analysing data", "Formatting data"],
            ServiceKind::MapsAdvanced => {
                ["Sending message", "Analysing request", "Preparing results"]
            }
        }
    }

    /// Instruction text sent to the workflow, with `{url}` or `{query}` still
    /// in place. `None` for services that do not send a job instruction.
    pub fn job_template(self) -> Option<&'static str> {
        match self {
            ServiceKind::Crawl => Some(
                "Crawl the website {url} and extract all of its content in an organized, detailed form",
            ),
            ServiceKind::Search => Some(
                "Search for '{query}' using the available search tools and provide comprehensive, detailed results",
            ),
            ServiceKind::Reddit => Some(
                "Search Reddit for '{query}'. Analyse the request and pick the most suitable subreddit and search keyword. Return the highest-voted post with a short summary of the replies.",
            ),
            ServiceKind::Maps | ServiceKind::MapsAdvanced => None,
        }
    }

    /// Fills the job template with `input`.
    pub fn job_text(self, input: &str) -> Option<String> {
        let placeholder = match self.input_kind() {
            InputKind::Url => "{url}",
            _ => "{query}",
        };
        self.job_template()
            .map(|template| template.replacen(placeholder, input, 1))
    }
}

/// Accepts `example.com` as well as `https://example.com`; returns `None` if
/// the input cannot be read as an http(s) URL with a host.
pub fn normalize_site_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = Url::parse(trimmed)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .or_else(|| {
            if trimmed.contains("://") {
                None
            } else {
                Url::parse(&format!("https://{trimmed}")).ok()
            }
        })?;
    parsed.host_str()?;
    Some(parsed.to_string())
}
