use csv2sqlite::error::LoadError;

fn main() {
    if let Err(err) = csv2sqlite::run() {
        match err.downcast_ref::<LoadError>() {
            Some(LoadError::Argument(usage)) => {
                eprint!("{usage}");
                std::process::exit(2);
            }
            Some(kind) => {
                eprintln!("error: {err:#}");
                std::process::exit(kind.exit_code());
            }
            None => {
                eprintln!("error: {err:#}");
                std::process::exit(1);
            }
        }
    }
}
