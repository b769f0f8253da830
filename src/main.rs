fn main() {
    std::process::exit(flakewatch::run());
}
