use tracing::level_filters::LevelFilter;

/// Installs the global fmt subscriber. `-verbose` also shows debug events.
pub fn init_tracing(verbose: bool) {
    let max_level = match verbose {
        true => LevelFilter::DEBUG,
        false => LevelFilter::INFO,
    };
    tracing_subscriber::fmt::SubscriberBuilder::default()
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_target(false)
        .with_max_level(max_level)
        .init();
}
