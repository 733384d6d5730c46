use clap::{Args, Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "calc-cli")]
#[command(about = "Command-line client for the calculator API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Access token from `calc-cli login`
    #[arg(short, long, env = "CALC_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Operands {
    #[arg(allow_negative_numbers = true)]
    number1: f64,
    #[arg(allow_negative_numbers = true)]
    number2: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// Exchange a pseudo for an access token
    Login { pseudo: String },
    /// number1 + number2
    Add(Operands),
    /// number1 - number2
    Subtract(Operands),
    /// number1 * number2
    Multiply(Operands),
    /// number1 / number2
    Divide(Operands),
    /// Sum of two or more numbers
    Sum {
        #[arg(num_args = 2.., required = true, allow_negative_numbers = true)]
        numbers: Vec<f64>,
    },
    /// Show your operation history
    History,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = format!("{}/api/v1", cli.url.trim_end_matches('/'));

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))?,
        );
    }

    let binary = |op: &str, operands: Operands| {
        client
            .post(format!("{base}/{op}"))
            .headers(headers.clone())
            .json(&json!({ "number1": operands.number1, "number2": operands.number2 }))
    };

    let request = match cli.command {
        Commands::Login { pseudo } => client
            .post(format!("{base}/login"))
            .json(&json!({ "pseudo": pseudo })),
        Commands::Add(operands) => binary("add", operands),
        Commands::Subtract(operands) => binary("subtract", operands),
        Commands::Multiply(operands) => binary("multiply", operands),
        Commands::Divide(operands) => binary("divide", operands),
        Commands::Sum { numbers } => client
            .post(format!("{base}/sum"))
            .headers(headers.clone())
            .json(&numbers),
        Commands::History => client
            .get(format!("{base}/operations"))
            .headers(headers.clone()),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if let Some(remaining) = res.headers().get("x-ratelimit-remaining") {
        eprintln!("Rate limit remaining: {}", remaining.to_str().unwrap_or("?"));
    }

    if !status.is_success() {
        eprintln!("Error: calculator API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
