//! scripted-dialog コマンド
//!
//! シナリオファイルを標準入出力で対話的に実行します。
//! 状態は JSON ファイルに保存されるため、途中で終了しても次回起動時に続きから再開します。
//! ログは会話と混ざらないよう、ファイルに出力します。

use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use scripted_dialog::config::Scenario;
use scripted_dialog::engine::{Session, Transport};
use scripted_dialog::storage::JsonFileStorage;

#[derive(Debug, Parser)]
#[command(name = "scripted-dialog", version, about = "ツリー定義の会話を実行する")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// シナリオを対話的に実行（中断した会話は再開）
    Run(RunArgs),

    /// シナリオを検証し、正規化した TOML を表示
    Check {
        /// シナリオファイル
        scenario: PathBuf,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// シナリオファイル
    scenario: PathBuf,

    /// 状態ファイル（既定: `<SCENARIO>.state.json`）
    #[arg(long)]
    state: Option<PathBuf>,

    /// 結果の JSON を書き出すファイル（既定: 標準出力）
    #[arg(long)]
    output: Option<PathBuf>,

    /// ログの出力先ディレクトリ
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// ログを JSON 形式で出力
    #[arg(long)]
    json_logs: bool,
}

/// 標準出力への送信
struct StdoutTransport;

impl Transport for StdoutTransport {
    fn send(&mut self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{text}")?;
        stdout.flush()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => run(args).await,
        Command::Check { scenario } => check(&scenario),
    }
}

async fn run(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let _guard = init_logging(&args.log_dir, args.json_logs)?;

    let scenario = Scenario::from_file(&args.scenario)?;
    let state_path = args
        .state
        .unwrap_or_else(|| default_state_path(&args.scenario));
    let storage = JsonFileStorage::open(&state_path)?;
    info!(
        scenario = scenario.name(),
        state = %state_path.display(),
        "running scenario"
    );

    let mut session = Session::start(
        scenario.root(),
        storage,
        StdoutTransport,
        scenario.session_config(),
    )?;
    session.advance(None)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while !session.is_finished() {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => session.advance(Some(line.trim_end_matches('\r')))?,
                None => {
                    info!("input closed, state kept for the next run");
                    return Ok(());
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, state kept for the next run");
                return Ok(());
            }
        }
    }

    let outcome = session.outcome();
    let snapshot = session.finalize()?;
    let json = serde_json::to_string_pretty(&snapshot)?;
    match args.output {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }
    info!(?outcome, answers = snapshot.len(), "conversation finished");

    Ok(())
}

fn check(path: &Path) -> Result<(), Box<dyn Error>> {
    let scenario = Scenario::from_file(path)?;
    print!("{}", scenario.to_toml()?);
    Ok(())
}

/// ファイルへのログ出力を初期化
///
/// 戻り値のガードが破棄されるまで、バッファされたログが書き出されます。
fn init_logging(log_dir: &Path, json: bool) -> io::Result<WorkerGuard> {
    fs::create_dir_all(log_dir)?;

    let appender = tracing_appender::rolling::never(log_dir, "scripted-dialog.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "scripted_dialog=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(writer).with_ansi(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .init();
    }

    Ok(guard)
}

fn default_state_path(scenario: &Path) -> PathBuf {
    scenario.with_extension("state.json")
}
