fn main() -> std::process::ExitCode {
    roster_import_lib::run()
}
