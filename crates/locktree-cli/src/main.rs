fn main() {
    if let Err(error) = locktree_cli::run() {
        eprintln!("Error: {error:#}");
        std::process::exit(1);
    }
}
