use gitpost::{config::Config, github::GithubClient};

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("❌ {msg}");
    std::process::exit(1);
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if std::env::args().nth(1).is_some() {
        eprintln!("Usage: gitpost-check");
        eprintln!("Reads the same configuration as the server and checks repository access.");
        std::process::exit(1);
    }

    let config = Config::from_env().unwrap_or_else(|e| fail(e));
    let client = GithubClient::new(&config.github).unwrap_or_else(|e| fail(e));

    match client.diagnose(&config.posts_path).await {
        Ok(diagnosis) => {
            println!("✅ Repository reachable");
            println!("{diagnosis}");
            if diagnosis.posts.is_none() {
                println!(
                    "ℹ️ Posts directory `{}` not found, it is created on first save",
                    config.posts_path
                );
            }
        }
        Err(e) => fail(format_args!("Failed to reach repository: {e}")),
    }
}
