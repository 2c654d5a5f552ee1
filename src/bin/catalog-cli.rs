use clap::{Parser, Subcommand};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "catalog-cli")]
#[command(about = "Moderation CLI for the catalog connector", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Session token from `login`.
    #[arg(short, long, env = "CATALOG_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Exchange the admin PIN for a session token
    Login {
        #[arg(env = "ADMIN_PIN")]
        pin: String,
    },
    /// List every item, optionally only one status
    Items {
        #[arg(short, long)]
        status: Option<String>,
    },
    /// List contact leads
    Leads,
    /// Print leads as CSV
    Export,
    /// Make an item live
    Approve { id: String },
    /// Hide an item from the public catalog
    Hide { id: String },
    /// Delete an item
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = |method: Method, path: &str| -> RequestBuilder {
        let req = client.request(method, format!("{base}{path}"));
        match &cli.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    };

    match &cli.command {
        Commands::Login { pin } => {
            let body = expect_json(request(Method::POST, "/api/login").json(&json!({ "pin": pin }))).await?;
            println!("{}", body["token"].as_str().unwrap_or_default());
        }
        Commands::Items { status } => {
            let body = expect_json(request(Method::GET, "/api/gpts")).await?;
            let items = body.as_array().cloned().unwrap_or_default();
            for item in items
                .iter()
                .filter(|i| status.as_deref().map_or(true, |s| i["status"] == s))
            {
                println!(
                    "{}\t{}\t{}\t{}",
                    item["id"].as_str().unwrap_or_default(),
                    item["status"].as_str().unwrap_or_default(),
                    item["title"].as_str().unwrap_or_default(),
                    item["url"].as_str().unwrap_or_default(),
                );
            }
        }
        Commands::Leads => {
            let body = expect_json(request(Method::GET, "/api/leads")).await?;
            println!("{}", serde_json::to_string_pretty(&body["items"])?);
        }
        Commands::Export => {
            let res = request(Method::GET, "/api/leads/export").send().await?;
            if !res.status().is_success() {
                return Err(format!("export failed with status {}", res.status()).into());
            }
            print!("{}", res.text().await?);
        }
        Commands::Approve { id } => set_status(&request, id, "live").await?,
        Commands::Hide { id } => set_status(&request, id, "hidden").await?,
        Commands::Delete { id } => {
            expect_json(request(Method::DELETE, &format!("/api/gpts/{id}"))).await?;
            println!("deleted {id}");
        }
    }

    Ok(())
}

async fn set_status<F>(request: &F, id: &str, status: &str) -> Result<(), Box<dyn std::error::Error>>
where
    F: Fn(Method, &str) -> RequestBuilder,
{
    let item = expect_json(request(Method::PUT, &format!("/api/gpts/{id}")).json(&json!({ "status": status }))).await?;
    println!(
        "{}\t{}",
        item["id"].as_str().unwrap_or_default(),
        item["status"].as_str().unwrap_or_default()
    );
    Ok(())
}

async fn expect_json(req: RequestBuilder) -> Result<Value, Box<dyn std::error::Error>> {
    let res = req.send().await?;
    let status = res.status();
    let body: Value = res.json().await.unwrap_or(Value::Null);
    if !status.is_success() {
        let message = body["error"].as_str().unwrap_or("request failed");
        return Err(format!("{status}: {message}").into());
    }
    Ok(body)
}
