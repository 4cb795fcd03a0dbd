use std::io::{self, Read, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    ifjc_drv::init_tracing();

    let mut source = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut source) {
        eprintln!("INTERNAL COMPILER ERROR: failed to read stdin: {e}");
        return ExitCode::from(99);
    }

    match ifjc_drv::compile(&source) {
        Ok(assembly) => {
            if let Err(e) = io::stdout().write_all(&assembly) {
                eprintln!("INTERNAL COMPILER ERROR: failed to write output: {e}");
                return ExitCode::from(99);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}{err}", err.banner());
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
