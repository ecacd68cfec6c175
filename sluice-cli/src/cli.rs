use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "sluice",
    version,
    about = "Continuously harvests a live HLS playlist to exercise a network path.\n\
             Segments are downloaded once each, counted, and discarded."
)]
pub struct Args {
    /// Manifest URL to harvest from. May be repeated; one URL is picked at
    /// random per worker run. Defaults to the built-in source list.
    #[arg(long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// Number of recently seen segment URLs kept for deduplication.
    #[arg(long, default_value_t = 20, value_name = "N")]
    pub cache_capacity: usize,

    /// Seconds to wait before restarting a failed harvest worker.
    #[arg(long, default_value_t = 5, value_name = "SECONDS")]
    pub cooldown: u64,

    /// Enable debug logging.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_arguments() {
        let args = Args::parse_from(["sluice"]);
        assert!(args.urls.is_empty());
        assert_eq!(args.cache_capacity, 20);
        assert_eq!(args.cooldown, 5);
    }

    #[test]
    fn url_may_be_repeated() {
        let args = Args::parse_from([
            "sluice",
            "--url",
            "http://example.com/a.m3u8",
            "--url",
            "http://example.com/b.m3u8",
        ]);
        assert_eq!(args.urls.len(), 2);
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Args::try_parse_from(["sluice", "-v", "-q"]).is_err());
    }
}
