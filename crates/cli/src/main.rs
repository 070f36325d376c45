use std::process::ExitCode;

fn main() -> ExitCode {
    smartmenu_cli::run()
}
