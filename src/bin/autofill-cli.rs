use clap::{Parser, Subcommand};
use reqwest::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CACHE_CONTROL,
};
use reqwest::{Method, Response};

#[derive(Parser)]
#[command(name = "autofill-cli")]
#[command(about = "Client for a running recipe autofill proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    proxy: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a page through the proxy
    Fetch {
        /// Page to fetch
        url: String,

        /// Send the target in a JSON body instead of the query string
        #[arg(long)]
        post: bool,

        /// Print only status and headers
        #[arg(long)]
        headers_only: bool,
    },
    /// Send a CORS preflight and show the granted permissions
    Preflight,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Fetch { url, post, headers_only } => {
            let res = if post {
                client
                    .post(&cli.proxy)
                    .json(&serde_json::json!({ "url": url }))
                    .send()
                    .await?
            } else {
                client.get(&cli.proxy).query(&[("url", url.as_str())]).send().await?
            };
            print_response(res, !headers_only).await?;
        }
        Commands::Preflight => {
            let res = client.request(Method::OPTIONS, &cli.proxy).send().await?;
            print_response(res, false).await?;
        }
    }

    Ok(())
}

async fn print_response(res: Response, with_body: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("Status: {}", res.status());
    for name in [
        ACCESS_CONTROL_ALLOW_ORIGIN,
        ACCESS_CONTROL_ALLOW_HEADERS,
        ACCESS_CONTROL_ALLOW_METHODS,
        CACHE_CONTROL,
    ] {
        if let Some(value) = res.headers().get(&name) {
            println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
        }
    }

    if with_body {
        let text = res.text().await?;
        println!();
        println!("{}", text);
    }
    Ok(())
}
