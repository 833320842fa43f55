fn main() {
    use clap::Parser;
    use std::error::Error;
    let args = chapterfeed::cli::Args::parse();
    let default_filter = if args.verbose {
        "chapterfeed=debug,info"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_target(false)
        .init();
    if let Err(e) = chapterfeed::cli::run(&args) {
        log::error!("{}", e);
        if args.verbose {
            let mut source = e.source();
            while let Some(s) = source {
                log::error!("  cause: {}", s);
                source = s.source();
            }
        }
        std::process::exit(e.exit_code());
    }
}
