use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:5173,http://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// Shared secret used to sign and verify bearer tokens. Operations that
    /// need it fail as a misconfiguration when unset; it is never defaulted.
    #[arg(long, env = "JWT_SECRET")]
    jwt_secret: Option<String>,

    /// Lifetime in seconds of issued bearer tokens
    #[arg(long, env, default_value_t = 3600)]
    pub token_ttl_secs: i64,

    /// Passive expiry in seconds stamped on registered subscriber connections
    #[arg(long, env, default_value_t = 86400)]
    pub connection_ttl_secs: i64,

    /// Maximum number of in-flight deliveries during a broadcast fan-out
    #[arg(long, env, default_value_t = 16)]
    pub broadcast_concurrency: usize,

    /// Time bound in milliseconds on a single outbound delivery attempt
    #[arg(long, env, default_value_t = 5000)]
    pub delivery_timeout_ms: u64,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        // Parse with no CLI arguments so the declared defaults apply; used by
        // tests. Environment variables still take precedence over defaults
        // (clap reads the `env` attributes even here), so callers asserting
        // on default values assume the matching variables are unset.
        Config::parse_from(["incident_platform_rs"])
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn jwt_secret(&self) -> Option<String> {
        self.jwt_secret.clone()
    }

    pub fn set_jwt_secret(mut self, jwt_secret: String) -> Self {
        self.jwt_secret = Some(jwt_secret);
        self
    }
}
