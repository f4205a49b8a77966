//! ipfx CLI: read ledger state, call views, and submit IP Fractionizer transactions.

use clap::{Parser, Subcommand, ValueEnum};
use ipfx_client::fractionizer::{
    add_liquidity, create_proposal, distribute_royalties, fetch_patent_details,
    fetch_payment_history, fetch_proposals, patent_pool, patent_token_type,
    swap_exact_apt_for_token, swap_exact_token_for_apt, vote, PatentRegistration, ProposalKind,
    ValidationError,
};
use ipfx_client::{
    Address, Argument, ClientConfig, Ed25519Signer, FunctionId, Journal, LedgerClient,
    ResourcePath, Signer, StructTag, TransactionHandle, TransactionPayload, TransactionStatus,
    TypeTag, ViewCall,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::info;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const PRIVATE_KEY_ENV: &str = "IPFX_PRIVATE_KEY";

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(cli))
}

#[derive(Parser)]
#[command(name = "ipfx")]
#[command(author = "gorusys <goru.connector@outlook.com>")]
#[command(about = "Ledger client for IP Fractionizer (patent tokens, royalties, governance, liquidity)")]
struct Cli {
    /// Node REST endpoint; overrides config and IPFX_NODE_URL.
    #[arg(long, global = true)]
    node_url: Option<String>,
    /// Config file; defaults to IPFX_CONFIG_PATH, ./config/ipfx.json, ./ipfx.json.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true, default_value = "./data/ipfx/journal.sqlite")]
    journal: PathBuf,
    /// Seconds to wait for confirmation after submitting.
    #[arg(long, global = true, default_value_t = 30)]
    wait_secs: u64,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chain id, ledger version and ledger time.
    Info,
    /// Read and decode one resource.
    Resource {
        #[arg(long)]
        owner: Address,
        /// Fully qualified struct type, e.g. 0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>.
        #[arg(long = "type")]
        resource_type: StructTag,
    },
    /// Call a view function. Arguments are read using the function's ABI parameter types.
    View {
        #[arg(long)]
        function: FunctionId,
        #[arg(long = "type-arg")]
        type_args: Vec<TypeTag>,
        #[arg(long = "arg")]
        args: Vec<String>,
    },
    /// Reserves of the APT/patent-token pool.
    Quote {
        /// Account holding the patent token module; defaults to the configured deployment.
        #[arg(long)]
        modules: Option<Address>,
    },
    /// One observation of a transaction.
    Status {
        hash: String,
        #[arg(long)]
        sender: Option<Address>,
    },
    /// Wait for a transaction to reach a terminal state.
    Wait {
        hash: String,
        #[arg(long)]
        sender: Option<Address>,
    },
    #[command(flatten)]
    Write(WriteCommand),
    /// List governance proposals.
    Proposals {
        #[arg(long)]
        owner: Address,
        #[arg(long)]
        modules: Option<Address>,
    },
    /// Patent details and royalty payment history of an owner.
    Royalties {
        #[arg(long)]
        owner: Address,
        #[arg(long)]
        modules: Option<Address>,
    },
    /// Transactions submitted from this machine.
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

/// Commands that sign and submit a transaction.
#[derive(Subcommand)]
enum WriteCommand {
    /// Register a patent and mint its fractional token supply.
    RegisterPatent {
        #[arg(long)]
        patent_id: String,
        #[arg(long)]
        total_supply: u64,
        /// Percent of revenue distributed to holders (0..=100).
        #[arg(long)]
        royalty_rate: u64,
    },
    /// Distribute royalties to token holders.
    Distribute {
        #[arg(long)]
        patent_id: String,
        #[arg(long)]
        amount: u64,
    },
    /// Open a governance proposal.
    Propose {
        #[arg(long)]
        patent_id: String,
        #[arg(long, value_enum)]
        kind: KindArg,
        #[arg(long)]
        description: String,
    },
    /// Vote on a proposal.
    Vote {
        #[arg(long)]
        patent_id: String,
        #[arg(long)]
        proposal_id: u64,
        /// Vote against instead of for.
        #[arg(long)]
        reject: bool,
    },
    /// Provide APT and patent tokens to the pool.
    AddLiquidity {
        #[arg(long)]
        apt: u64,
        #[arg(long)]
        tokens: u64,
        #[arg(long, default_value_t = 0)]
        min_apt: u64,
        #[arg(long, default_value_t = 0)]
        min_tokens: u64,
    },
    /// Swap through the APT/patent-token pool.
    Swap {
        #[arg(long, value_enum)]
        direction: Direction,
        #[arg(long)]
        amount_in: u64,
        #[arg(long, default_value_t = 0)]
        min_out: u64,
    },
}

impl WriteCommand {
    /// Entry-function payload for this command. `modules` hosts the IP Fractionizer contracts.
    fn payload(
        self,
        modules: Address,
        exchange: Address,
    ) -> Result<TransactionPayload, ValidationError> {
        let token = patent_token_type(modules);
        match self {
            WriteCommand::RegisterPatent {
                patent_id,
                total_supply,
                royalty_rate,
            } => PatentRegistration {
                patent_id,
                total_supply,
                royalty_rate,
            }
            .payload(modules),
            WriteCommand::Distribute { patent_id, amount } => {
                distribute_royalties(modules, &patent_id, amount)
            }
            WriteCommand::Propose {
                patent_id,
                kind,
                description,
            } => create_proposal(modules, &patent_id, kind.into(), &description),
            WriteCommand::Vote {
                patent_id,
                proposal_id,
                reject,
            } => vote(modules, &patent_id, proposal_id, !reject),
            WriteCommand::AddLiquidity {
                apt,
                tokens,
                min_apt,
                min_tokens,
            } => add_liquidity(exchange, &token, apt, tokens, min_apt, min_tokens),
            WriteCommand::Swap {
                direction: Direction::AptToToken,
                amount_in,
                min_out,
            } => swap_exact_apt_for_token(exchange, &token, amount_in, min_out),
            WriteCommand::Swap {
                direction: Direction::TokenToApt,
                amount_in,
                min_out,
            } => swap_exact_token_for_apt(exchange, &token, amount_in, min_out),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    License,
    Royalty,
    Transfer,
}

impl From<KindArg> for ProposalKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::License => ProposalKind::License,
            KindArg::Royalty => ProposalKind::Royalty,
            KindArg::Transfer => ProposalKind::Transfer,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    AptToToken,
    TokenToApt,
}

fn load_config(path: Option<&Path>, node_url: Option<String>) -> CliResult<ClientConfig> {
    let mut config = match path {
        Some(p) => ClientConfig::load_from_path(p)?,
        None => ClientConfig::load()?,
    };
    if let Some(url) = node_url {
        config.node_url = url;
    }
    Ok(config)
}

fn signer_from_env() -> CliResult<Ed25519Signer> {
    let secret = std::env::var(PRIVATE_KEY_ENV)
        .map_err(|_| format!("{} is not set; write commands need a signing key", PRIVATE_KEY_ENV))?;
    Ok(Ed25519Signer::from_hex(&secret)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = load_config(cli.config.as_deref(), cli.node_url)?;
    let deployment = config.deployment.clone();
    let client = LedgerClient::connect(config)?;
    let wait = Duration::from_secs(cli.wait_secs);

    match cli.command {
        Command::Info => print_json(&client.ledger_info().await?),
        Command::Resource {
            owner,
            resource_type,
        } => {
            let path = ResourcePath::new(owner, resource_type);
            print_json(&client.read_resource(owner, &path).await?)
        }
        Command::View {
            function,
            type_args,
            args,
        } => {
            let args = typed_arguments(&client, &function, &args).await?;
            let values = client
                .call_view(&ViewCall::new(function, type_args, args))
                .await?;
            print_json(&values)
        }
        Command::Quote { modules } => {
            let modules = modules
                .or(deployment.module_address)
                .ok_or("--modules is required when no module address is configured")?;
            let pool = patent_pool(deployment.liquidswap_address, &patent_token_type(modules));
            let quote = client.quote_pool(&pool).await?;
            print_json(&json!({ "pool": pool.resource_path().resource_type().to_string(), "quote": quote }))
        }
        Command::Status { hash, sender } => {
            let handle = TransactionHandle::from_hash(&hash, sender.unwrap_or(Address::ZERO));
            match client.transaction_status(&handle).await? {
                TransactionStatus::Unknown => print_json(&json!({ "hash": hash, "status": "unknown" })),
                TransactionStatus::Pending => print_json(&json!({ "hash": hash, "status": "pending" })),
                TransactionStatus::Committed(result) => print_json(&result),
            }
        }
        Command::Wait { hash, sender } => {
            let handle = TransactionHandle::from_hash(&hash, sender.unwrap_or(Address::ZERO));
            let confirmation = client.await_confirmation(&handle, wait).await?;
            let journal = Journal::open(&cli.journal)?;
            if journal.get(&hash)?.is_some() {
                journal.record_confirmation(&confirmation)?;
            }
            print_json(&confirmation)
        }
        Command::Proposals { owner, modules } => {
            let modules = modules.unwrap_or_else(|| deployment.modules_for(owner));
            print_json(&fetch_proposals(&client, modules, owner).await?)
        }
        Command::Royalties { owner, modules } => {
            let modules = modules.unwrap_or_else(|| deployment.modules_for(owner));
            let details = fetch_patent_details(&client, modules, owner).await?;
            let history = fetch_payment_history(&client, modules, owner).await?;
            print_json(&json!({ "patent": details, "payments": history }))
        }
        Command::History { limit } => {
            let journal = Journal::open(&cli.journal)?;
            let rows = journal
                .recent(limit)?
                .into_iter()
                .map(|e| {
                    let submitted = OffsetDateTime::from_unix_timestamp(e.submitted_utc)
                        .ok()
                        .and_then(|t| t.format(&Rfc3339).ok());
                    json!({ "submitted": submitted, "entry": e })
                })
                .collect::<Vec<_>>();
            print_json(&rows)
        }
        Command::Write(write) => {
            let signer = signer_from_env()?;
            let modules = deployment.modules_for(signer.address());
            let payload = write.payload(modules, deployment.liquidswap_address)?;
            let journal = Journal::open(&cli.journal)?;
            submit_and_wait(&client, &journal, &signer, &payload, wait).await
        }
    }
}

async fn submit_and_wait(
    client: &LedgerClient,
    journal: &Journal,
    signer: &Ed25519Signer,
    payload: &TransactionPayload,
    wait: Duration,
) -> CliResult<()> {
    let function = payload.invocation().function().clone();
    let handle = client.submit_transaction(payload, Some(signer)).await?;
    journal.record_submitted(&handle, &function)?;
    info!(hash = %handle.hash, "waiting for confirmation");
    let confirmation = client.await_confirmation(&handle, wait).await?;
    journal.record_confirmation(&confirmation)?;
    print_json(&confirmation)?;
    if confirmation.is_success() {
        Ok(())
    } else {
        Err(format!("transaction {} did not succeed", handle.hash).into())
    }
}

/// Read each `--arg` as the type of the matching non-signer ABI parameter.
async fn typed_arguments(
    client: &LedgerClient,
    function: &FunctionId,
    raw: &[String],
) -> CliResult<Vec<Argument>> {
    use ipfx_client::NodeApi;

    let abi = client.node().module_abi(&function.module).await?;
    let f = abi
        .function(&function.name)
        .ok_or_else(|| format!("{} is not exposed by its module", function))?;
    let params = f
        .params
        .iter()
        .map(|p| p.parse::<TypeTag>())
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|p| !p.is_signer())
        .collect::<Vec<_>>();
    if params.len() != raw.len() {
        return Err(format!("{} takes {} arguments, got {}", function, params.len(), raw.len()).into());
    }
    Ok(raw
        .iter()
        .zip(&params)
        .map(|(text, ty)| Argument::parse_typed(text, ty))
        .collect::<Result<Vec<_>, _>>()?)
}
