use clap::{Parser, Subcommand};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use std::fs;

const TOKEN_FILE: &str = ".catalog_token";

#[derive(Parser)]
#[command(name = "catalog-cli")]
#[command(about = "CLI for the product catalog API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    List {
        #[arg(short, long, default_value_t = 0)]
        skip: usize,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    Get {
        #[arg(short, long)]
        id: u64,
    },
    Create {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        description: String,
        #[arg(short, long)]
        price: f64,
    },
    Update {
        #[arg(short, long)]
        id: u64,
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        description: String,
        #[arg(short, long)]
        price: f64,
    },
    Delete {
        #[arg(short, long)]
        id: u64,
    },
    Logout,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

fn with_token(request: RequestBuilder) -> RequestBuilder {
    match fs::read_to_string(TOKEN_FILE) {
        Ok(token) => request.bearer_auth(token.trim()),
        Err(_) => request,
    }
}

async fn print_response(request: RequestBuilder) -> Result<(), Box<dyn std::error::Error>> {
    let res = request.send().await?;
    let status = res.status();
    let body = res.text().await?;
    if body.is_empty() {
        println!("{}", status);
    } else {
        println!("{} {}", status, body);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Login { username, password } => {
            let res = client
                .post(format!("{}/token", cli.url))
                .form(&[("username", username), ("password", password)])
                .send()
                .await?;
            if res.status().is_success() {
                let body: TokenResponse = res.json().await?;
                fs::write(TOKEN_FILE, body.access_token)?;
                println!("Logged in. Token saved to {}", TOKEN_FILE);
            } else {
                println!("Login failed: {}", res.text().await?);
            }
        }
        Commands::List { skip, limit } => {
            let request = client
                .get(format!("{}/products", cli.url))
                .query(&[("skip", skip), ("limit", limit)]);
            print_response(request).await?;
        }
        Commands::Get { id } => {
            let request = with_token(client.get(format!("{}/products/{}", cli.url, id)));
            print_response(request).await?;
        }
        Commands::Create { title, description, price } => {
            let request = client
                .post(format!("{}/products", cli.url))
                .json(&json!({ "title": title, "description": description, "price": price }));
            print_response(request).await?;
        }
        Commands::Update { id, title, description, price } => {
            let request = client
                .put(format!("{}/products/{}", cli.url, id))
                .json(&json!({ "title": title, "description": description, "price": price }));
            print_response(request).await?;
        }
        Commands::Delete { id } => {
            let request = with_token(client.delete(format!("{}/product/{}", cli.url, id)));
            print_response(request).await?;
        }
        Commands::Logout => {
            let _ = fs::remove_file(TOKEN_FILE);
            println!("Logged out (token removed).");
        }
    }

    Ok(())
}
