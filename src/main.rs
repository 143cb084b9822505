fn main() {
    if let Err(e) = augsync::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
