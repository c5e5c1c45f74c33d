fn main() {
    sqlchain_cli::init_logging();
    if let Err(e) = sqlchain_cli::run(std::env::args().collect()) {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
