// Strategy presets - the configuration bundles tried against yt-dlp.
//
// Each preset pairs a player client with the spoofed identity that client
// expects. The iOS client with a matching mobile Safari user agent is the
// least-blocked combination; android and tv are fallbacks; the web client
// only pulls its weight when cookies are available.

use rand::seq::SliceRandom;

/// Where the strategy sources credentials from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieSource {
    None,
    /// Netscape-format cookies.txt
    File(String),
    /// Cookies lifted from an installed browser profile
    Browser(&'static str),
}

/// One extraction attempt preset.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    /// Short name for logs and diagnostics
    pub name: &'static str,
    /// yt-dlp player_client extractor arg
    pub player_client: &'static str,
    pub user_agent: &'static str,
    pub referer: &'static str,
    pub cookies: CookieSource,
    /// Whether to point yt-dlp at the loopback PO-token provider
    pub use_po_token: bool,
}

const IOS_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

const ANDROID_USER_AGENT: &str =
    "com.google.android.youtube/19.09.37 (Linux; U; Android 11) gzip";

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

const YOUTUBE_REFERER: &str = "https://www.youtube.com/";

impl StrategyConfig {
    pub fn ios() -> Self {
        Self {
            name: "ios",
            player_client: "ios",
            user_agent: IOS_USER_AGENT,
            referer: YOUTUBE_REFERER,
            cookies: CookieSource::None,
            use_po_token: false,
        }
    }

    pub fn android() -> Self {
        Self {
            name: "android",
            player_client: "android",
            user_agent: ANDROID_USER_AGENT,
            referer: YOUTUBE_REFERER,
            cookies: CookieSource::None,
            use_po_token: false,
        }
    }

    pub fn tv() -> Self {
        Self {
            name: "tv",
            player_client: "tv",
            user_agent: DESKTOP_USER_AGENT,
            referer: YOUTUBE_REFERER,
            cookies: CookieSource::None,
            use_po_token: false,
        }
    }

    /// Web client: only attempt it with credentials, and with the PO-token
    /// provider when one is deployed, since bare web requests are the
    /// first thing the platform blocks.
    pub fn web(cookies: CookieSource) -> Self {
        Self {
            name: "web",
            player_client: "web",
            user_agent: DESKTOP_USER_AGENT,
            referer: YOUTUBE_REFERER,
            cookies,
            use_po_token: true,
        }
    }
}

/// Whether the strategy list is tried as-is or reshuffled per resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyOrder {
    #[default]
    Fixed,
    Shuffled,
}

impl std::str::FromStr for StrategyOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "shuffled" | "random" => Ok(Self::Shuffled),
            other => Err(format!("unknown strategy order '{}'", other)),
        }
    }
}

/// Build the full preset list. Mobile clients go first; web last because
/// it is the most likely to hit bot protection.
pub fn build_strategies(cookies_path: Option<&str>) -> Vec<StrategyConfig> {
    let web_cookies = match cookies_path {
        Some(path) => CookieSource::File(path.to_string()),
        None => CookieSource::Browser("chrome"),
    };

    vec![
        StrategyConfig::ios(),
        StrategyConfig::android(),
        StrategyConfig::tv(),
        StrategyConfig::web(web_cookies),
    ]
}

/// Produce the attempt order for one resolution.
pub fn plan(strategies: &[StrategyConfig], order: StrategyOrder) -> Vec<StrategyConfig> {
    let mut plan: Vec<StrategyConfig> = strategies.to_vec();
    if order == StrategyOrder::Shuffled {
        plan.shuffle(&mut rand::thread_rng());
    }
    plan
}
