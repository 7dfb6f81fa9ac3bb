fn main() {
    if let Err(err) = lineage_graph::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
