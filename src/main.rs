fn main() {
    // Install miette's pretty panic hook early for better panic reports
    miette::set_panic_hook();
    parsegen::cli::run();
}
