use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_primitives::{Address, B256, U256};
use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use chop::accounts::AccountManager;
use chop::app::{commands, App, Services};
use chop::chain::Chain;
use chop::config::{self, Config};
use chop::domain::validate::{parse_address, parse_hex_bytes, parse_u256};
use chop::domain::{CallParams, CallType};
use chop::evm::{BackendFactory, BlockEnv, EvmBackend, Hardfork, LocalEvm};
use chop::infrastructure::server::{self, RpcState};
use chop::infrastructure::RuntimeBridge;
use chop::logging::{self, LogTarget};
use chop::store::{CallStore, JsonStateFile};
use chop::ui;

#[derive(Debug, Parser)]
#[command(
    name = "chop",
    version,
    about = "chop: an interactive console for a local EVM"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive TUI (default)
    Run,
    /// Execute bytecode once and print the result as JSON
    Call(CallArgs),
    /// JSON-RPC server over the local chain
    Serve(ServeArgs),
}

#[derive(Debug, ClapArgs)]
struct CallArgs {
    /// Runtime bytecode installed at --address
    #[arg(long, default_value = "0x6000600055")]
    bytecode: String,
    #[arg(long, default_value_t = 30_000_000)]
    gas: u64,
    #[arg(long, default_value = "0x0000000000000000000000000000000000000001")]
    caller: String,
    #[arg(long, default_value = "0x0000000000000000000000000000000000000002")]
    address: String,
    #[arg(long, default_value = "0")]
    value: String,
    #[arg(long, default_value = "0x")]
    calldata: String,
    #[arg(long, default_value = "cancun")]
    hardfork: String,
    #[arg(long, default_value = "none")]
    log_level: String,
    #[arg(long, default_value_t = 1)]
    chain_id: u64,
    #[arg(long, default_value_t = 1)]
    block_number: u64,
    #[arg(long, default_value_t = 1_234_567_890)]
    block_timestamp: u64,
    #[arg(long, default_value = "0")]
    block_difficulty: String,
    #[arg(long, default_value = "0x0")]
    block_prevrandao: String,
    #[arg(long, default_value = "0x0")]
    block_coinbase: String,
    #[arg(long, default_value_t = 30_000_000)]
    block_gas_limit: u64,
    #[arg(long, default_value = "0")]
    block_base_fee: String,
    #[arg(long, default_value = "1")]
    blob_base_fee: String,
}

#[derive(Debug, ClapArgs)]
struct ServeArgs {
    #[arg(long, env = "CHOP_PORT", default_value_t = 8545)]
    port: u16,
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,
    /// Log every request at debug level
    #[arg(long)]
    verbose: bool,
    /// Server only, no TUI
    #[arg(long)]
    headless: bool,
    /// Upstream RPC to fork from (unsupported)
    #[arg(long)]
    fork: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = config::load();

    match args.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let _guard = init_file_logging(&config.log_level);
            let bridge = RuntimeBridge::new()?;
            let services = build_services(&config, &bridge)?;
            run_tui(services, config.call.clone(), &bridge)
        }
        Commands::Call(call) => run_call(call),
        Commands::Serve(serve) => run_serve(serve, &config),
    }
}

fn init_file_logging(level: &str) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let target = config::log_dir()
        .map(LogTarget::File)
        .unwrap_or(LogTarget::Off);
    logging::init(target, level)
}

fn backend_factory(accounts: Arc<AccountManager>, block: BlockEnv) -> BackendFactory {
    Arc::new(move || {
        let evm = LocalEvm::new(Hardfork::default(), block.clone())
            .with_genesis(accounts.genesis_alloc());
        Ok(Arc::new(evm) as Arc<dyn EvmBackend>)
    })
}

/// Collaborators for the TUI and server, with persisted calls replayed.
fn build_services(config: &Config, bridge: &RuntimeBridge) -> Result<Services> {
    let accounts = Arc::new(AccountManager::new(
        config.chain.account_count,
        config.chain.initial_balance_eth,
    ));
    let chain = Arc::new(Chain::new(config.chain.gas_limit));
    let block = BlockEnv {
        gas_limit: config.chain.gas_limit,
        ..BlockEnv::default()
    };
    let mut services = Services::new(backend_factory(accounts.clone(), block), chain, accounts)?;

    if let Some(dir) = config::exports_dir() {
        services = services.with_export_dir(dir);
    }
    if let Some(path) = config.state_file_path() {
        let store: Arc<dyn CallStore> = Arc::new(JsonStateFile::new(path));
        match bridge.block_on(store.load_calls()) {
            Some(Ok(calls)) => {
                commands::replay_calls(&services, calls);
            }
            Some(Err(err)) => tracing::warn!(error = %err, "failed to load state file"),
            None => {}
        }
        services = services.with_store(store);
    }
    Ok(services)
}

fn run_tui(services: Services, defaults: CallParams, bridge: &RuntimeBridge) -> Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let app = App::new(services, defaults);
    let res = run_app(&mut terminal, app, bridge);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    bridge: &RuntimeBridge,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        pump_messages(&mut app, bridge);
        terminal.draw(|f| ui::draw(f, &app))?;
        if app.quitting {
            app.shutdown();
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if let Some(command) = app.handle_key(key) {
                    bridge.spawn(command);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

fn pump_messages(app: &mut App, bridge: &RuntimeBridge) {
    for message in bridge.poll_messages() {
        if let Some(command) = app.update(message) {
            bridge.spawn(command);
        }
    }
}

/// Lenient word parse for block fields: decimal or hex of any width.
fn parse_word(raw: &str, name: &str) -> Result<U256> {
    parse_u256(raw).map_err(|err| anyhow::anyhow!("invalid --{name}: {err}"))
}

fn run_call(args: CallArgs) -> Result<()> {
    let _guard = logging::init(LogTarget::Stderr, &args.log_level);

    let hardfork: Hardfork = args.hardfork.parse().map_err(anyhow::Error::msg)?;
    let coinbase = parse_word(&args.block_coinbase, "block-coinbase")?;
    let block = BlockEnv {
        chain_id: args.chain_id,
        number: args.block_number,
        timestamp: args.block_timestamp,
        coinbase: Address::from_word(B256::from(coinbase.to_be_bytes::<32>())),
        gas_limit: args.block_gas_limit,
        base_fee: parse_word(&args.block_base_fee, "block-base-fee")?,
        prevrandao: B256::from(
            parse_word(&args.block_prevrandao, "block-prevrandao")?.to_be_bytes::<32>(),
        ),
        difficulty: parse_word(&args.block_difficulty, "block-difficulty")?,
        blob_base_fee: parse_word(&args.blob_base_fee, "blob-base-fee")?,
    };

    let address = parse_address(&args.address).map_err(anyhow::Error::msg)?;
    let caller = parse_address(&args.caller).map_err(anyhow::Error::msg)?;
    let code = parse_hex_bytes(&args.bytecode).map_err(anyhow::Error::msg)?;
    let value = parse_word(&args.value, "value")?;
    if args.gas == 0 {
        bail!("--gas must be greater than zero");
    }

    let evm = LocalEvm::new(hardfork, block);
    evm.set_code(address, code);
    evm.set_balance(caller, value);

    let params = CallParams {
        call_type: CallType::Call,
        caller: args.caller,
        target: args.address,
        value: args.value,
        input_data: args.calldata,
        gas_limit: args.gas.to_string(),
        ..CallParams::default()
    };
    tracing::info!(%address, %hardfork, "one-shot call");
    let result = evm.execute(&params).context("execution failed")?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn run_serve(args: ServeArgs, config: &Config) -> Result<()> {
    if let Some(url) = args.fork {
        bail!("forking is not supported (requested {url})");
    }
    let level = if args.verbose { "debug" } else { config.log_level.as_str() };
    let _guard = if args.headless {
        logging::init(LogTarget::Stderr, level)
    } else {
        init_file_logging(level)
    };

    let bridge = RuntimeBridge::new()?;
    let services = build_services(config, &bridge)?;
    let addr = SocketAddr::new(args.host, args.port);
    let state = RpcState {
        chain: services.chain.clone(),
        accounts: services.accounts.clone(),
        chain_id: BlockEnv::default().chain_id,
    };

    if args.headless {
        println!("chop JSON-RPC listening on http://{addr}");
        return bridge
            .block_on(server::serve(addr, state))
            .unwrap_or_else(|| Err(anyhow::anyhow!("runtime unavailable")));
    }

    let Some(handle) = bridge.handle() else {
        bail!("runtime unavailable");
    };
    handle.spawn(async move {
        if let Err(err) = server::serve(addr, state).await {
            tracing::error!(error = %err, %addr, "json-rpc server stopped");
        }
    });
    run_tui(services, config.call.clone(), &bridge)
}
