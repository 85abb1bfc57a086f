fn main() {
    if let Err(e) = segue::runtime::run() {
        eprintln!("segue: {e}");
        std::process::exit(1);
    }
}
