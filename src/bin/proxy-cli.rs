use std::path::PathBuf;

use axum::http::Method;
use clap::{Parser, Subcommand};
use serde_json::Value;

use api_proxy::http::STATUS_PATH;
use api_proxy::routing::{split_path, RouteTable};

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Operator CLI for the kraken API proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the status line of a running proxy
    Status,
    /// List the routes defined in a route file
    Routes {
        #[arg(short, long, default_value = "routes/kraken.routes")]
        file: PathBuf,
    },
    /// Show which route a request would match, without resolving names
    Map {
        #[arg(short, long, default_value = "routes/kraken.routes")]
        file: PathBuf,
        method: String,
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Status => {
            let res = reqwest::get(format!("{}{}", cli.url.trim_end_matches('/'), STATUS_PATH)).await?;
            print_response(res).await?;
        }
        Commands::Routes { file } => {
            let table = RouteTable::load(&file)?;
            for (i, route) in table.routes().iter().enumerate() {
                println!("{:>3}  {}", i + 1, route);
            }
            println!("{} routes", table.len());
        }
        Commands::Map { file, method, path } => {
            let table = RouteTable::load(&file)?;
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
            let segments = split_path(&path);

            match table.find(&method, &segments) {
                Some(route) => {
                    println!("matched: {}", route);
                    for (index, (segment, input)) in route.segments().iter().zip(&segments).enumerate() {
                        let action = if segment.is_named() {
                            "resolve to user ID"
                        } else {
                            "keep"
                        };
                        println!("  #{} {:<16} {:<24} {}", index, segment.to_string(), input, action);
                    }
                }
                None => println!("no route matched; {} {} is forwarded unchanged", method, path),
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: proxy returned status {}", status);
        match serde_json::from_str::<Value>(&text) {
            Ok(json) => eprintln!("{}", serde_json::to_string_pretty(&json)?),
            Err(_) => eprintln!("Response: {}", text),
        }
        return Ok(());
    }

    println!("{}", text);
    Ok(())
}
