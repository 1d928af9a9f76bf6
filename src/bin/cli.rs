use clap::{Parser, Subcommand};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::fs;

const TOKEN_FILE: &str = ".pethaven_token";

#[derive(Parser)]
#[command(name = "pethaven-cli")]
#[command(about = "CLI for the Pet Haven API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, default_value = "http://localhost:5589")]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a bearer token for an email and save it locally
    Token {
        #[arg(short, long)]
        email: String,
    },
    /// Register a user (no-op if the email already exists)
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Search pet listings
    Pets {
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List your own pet listings, paginated
    MyPets {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, default_value = "1")]
        page: String,
        #[arg(short, long, default_value = "10")]
        size: String,
    },
    /// Elevate a user to admin (requires an admin token)
    Promote {
        #[arg(short, long)]
        id: String,
    },
    Logout,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

fn saved_token() -> String {
    fs::read_to_string(TOKEN_FILE).unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Token { email } => {
            let res = client
                .post(format!("{}/jwt", cli.url))
                .json(&json!({ "email": email }))
                .send()
                .await?;
            if res.status().is_success() {
                let body: TokenResponse = res.json().await?;
                fs::write(TOKEN_FILE, body.token)?;
                println!("Token saved to {TOKEN_FILE}");
            } else {
                println!("Token request failed: {}", res.text().await?);
            }
        }
        Commands::Register { email, name } => {
            let mut user = json!({ "email": email });
            if let Some(name) = name {
                user["name"] = json!(name);
            }
            let res = client
                .post(format!("{}/users", cli.url))
                .json(&user)
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Pets { search, category } => {
            let mut params = Vec::new();
            if let Some(search) = &search {
                params.push(("search", search.as_str()));
            }
            if let Some(category) = &category {
                params.push(("category", category.as_str()));
            }
            let res = client
                .get(format!("{}/pets", cli.url))
                .query(&params)
                .header("Authorization", format!("Bearer {}", saved_token()))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::MyPets { email, page, size } => {
            let res = client
                .get(format!("{}/pets/mine", cli.url))
                .query(&[
                    ("lister_email", email.as_str()),
                    ("page", page.as_str()),
                    ("size", size.as_str()),
                ])
                .header("Authorization", format!("Bearer {}", saved_token()))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Promote { id } => {
            let res = client
                .patch(format!("{}/users/admin/{}", cli.url, id))
                .header("Authorization", format!("Bearer {}", saved_token()))
                .send()
                .await?;
            println!("Response: {}", res.text().await?);
        }
        Commands::Logout => {
            let _ = fs::remove_file(TOKEN_FILE);
            println!("Logged out (token removed).");
        }
    }

    Ok(())
}
