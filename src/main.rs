fn main() {
    if let Err(err) = complexity_tree::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
