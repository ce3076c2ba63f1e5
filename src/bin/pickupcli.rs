use std::rc::Rc;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use pp_checkout::{
    fragment::extract_locations, options::URL_KEY, FetchParams, HttpTransport, ListController,
    LoadOutcome, MemoryPage, Options, PickupLocation, ShippingMethod,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct CliArgs {
    #[command(subcommand)]
    pub subcommand: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    #[clap(name = "get-list", about = "Print the pickup list fragment for a shipping method")]
    List {
        #[command(flatten)]
        request_opts: RequestOpts,
    },

    #[clap(
        name = "get-locations",
        about = "Print the pickup locations embedded in the list fragment as JSON"
    )]
    Locations {
        #[command(flatten)]
        request_opts: RequestOpts,
    },
}

#[derive(Args, Debug, PartialEq)]
struct RequestOpts {
    #[arg(short = 'u', long, help = "Base URL of the pickup list endpoint")]
    pub url: String,

    #[arg(short = 'm', long, help = "Shipping method code")]
    pub method: String,

    #[arg(short = 'i', long, default_value = "0", help = "Shipping method index")]
    pub index: String,

    #[arg(
        short = 'p',
        long = "param",
        value_parser = parse_key_val,
        help = "Search field sent with the request, as key=value"
    )]
    pub params: Vec<(String, String)>,
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}

async fn fetch_list(http: reqwest::Client, request_opts: RequestOpts) -> Result<String> {
    let method = ShippingMethod::pickup(&request_opts.method, &request_opts.index);
    let page = Rc::new(MemoryPage::new(vec![method.clone()]));
    let list = ListController::new(Rc::clone(&page), HttpTransport::new(http));
    list.configure(Options::new().with(URL_KEY, request_opts.url));

    let params: FetchParams = request_opts.params.into_iter().collect();
    match list
        .load(&method, &method.index, &method.code, params)
        .await
    {
        LoadOutcome::Loaded { markup, .. } => Ok(markup),
        LoadOutcome::Failed(error) => Err(error.into()),
        LoadOutcome::Superseded => Err(anyhow!("the pickup list request was superseded")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let http = reqwest::Client::builder()
        .gzip(true)
        .brotli(true)
        .build()?;

    match args.subcommand {
        Command::List { request_opts } => {
            println!("{}", fetch_list(http, request_opts).await?);
        }
        Command::Locations { request_opts } => {
            let markup = fetch_list(http, request_opts).await?;
            let locations: Vec<PickupLocation> =
                extract_locations(&markup).into_iter().flatten().collect();
            tracing::info!(count = locations.len(), "pickup locations extracted");
            println!("{}", serde_json::to_string_pretty(&locations)?);
        }
    }

    Ok(())
}
