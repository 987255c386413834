use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = geo2coco::run() {
        eprintln!("Error: {err}");
        if let geo2coco::Geo2CocoError::ValidationFailed { report, .. } = &err {
            eprint!("{report}");
        }
        std::process::exit(1);
    }
}
