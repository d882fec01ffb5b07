mod cli;

#[tokio::main]
async fn main() {
    let code = match cli::run_from_args().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("slidefetch error: {:#}", err);
            1
        }
    };
    std::process::exit(code);
}
