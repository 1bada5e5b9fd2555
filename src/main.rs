use book_analysis::api::HttpBackend;
use book_analysis::cli::{self, Cli, Commands, Phase};
use book_analysis::clock::TokioClock;
use book_analysis::config::Config;
use book_analysis::controller::{PhaseOutcome, PollingResultController};
use book_analysis::error::{ClientError, Result};
use book_analysis::prompt::{AcceptDefaults, DialoguerPrompt, SelectionPrompt};
use book_analysis::report::AnalysisReport;
use book_analysis::terminal::TerminalRenderer;
use book_analysis::{logging, messages};
use book_analysis_common::JobHandle;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("✖ {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;

    match cli.command {
        Commands::Run { job_id, title, titles_file, yes, output, match_interval_ms, analysis_interval_ms } => {
            if let Some(ms) = match_interval_ms {
                config.match_poll_interval_ms = ms;
            }
            if let Some(ms) = analysis_interval_ms {
                config.analysis_poll_interval_ms = ms;
            }
            let mut controller = build_controller(&config, cli.base_url.as_deref())?;
            cancel_on_ctrl_c(&controller);

            println!("📚 book-analysis - 書籍解析\n");

            let job = match job_id {
                Some(id) => {
                    let job = JobHandle::new(id);
                    controller.load_job(job.clone());
                    job
                }
                None => {
                    let file_content = match &titles_file {
                        Some(path) => Some(std::fs::read_to_string(path)?),
                        None => None,
                    };
                    let titles = cli::collect_titles(&title, file_content.as_deref());
                    controller.start_title_search(&titles).await?
                }
            };

            let mut prompt: Box<dyn SelectionPrompt> = if yes {
                Box::new(AcceptDefaults)
            } else {
                Box::new(DialoguerPrompt)
            };
            controller.run(&job, prompt.as_mut()).await?;

            if let Some(path) = output {
                save_report(&controller, &path)?;
            }

            println!("\n✅ 完了");
        }

        Commands::Poll { job_id, phase, output } => {
            let mut controller = build_controller(&config, cli.base_url.as_deref())?;
            cancel_on_ctrl_c(&controller);
            let job = JobHandle::new(job_id);

            let outcome = match phase {
                Phase::Matching => {
                    controller.load_job(job.clone());
                    controller.poll_matches(&job).await
                }
                Phase::Analysis => controller.poll_analysis(&job).await,
            };

            match outcome {
                PhaseOutcome::Done => {}
                PhaseOutcome::Stopped(message) => return Err(ClientError::Stopped(message)),
                PhaseOutcome::Cancelled => return Err(ClientError::Cancelled),
            }

            if let Some(path) = output {
                save_report(&controller, &path)?;
            }
        }

        Commands::Config { set_base_url, show } => {
            if let Some(url) = set_base_url {
                config.set_base_url(url)?;
                println!("✔ サーバURLを設定しました");
            }

            if show {
                println!("設定:");
                println!("  サーバURL: {}", config.resolve_base_url(cli.base_url.as_deref()));
                println!("  検索ポーリング間隔: {}ms", config.match_poll_interval_ms);
                println!("  解析ポーリング間隔: {}ms", config.analysis_poll_interval_ms);
                println!("  タイムアウト: {}秒", config.request_timeout_seconds);
            }
        }
    }

    Ok(())
}

fn build_controller(config: &Config, base_url: Option<&str>) -> Result<PollingResultController> {
    let base_url = config.resolve_base_url(base_url);
    tracing::debug!(base_url = %base_url, "using job server");

    let backend = HttpBackend::new(&base_url, config.request_timeout())?;
    Ok(PollingResultController::new(
        Arc::new(backend),
        Arc::new(TokioClock),
        Box::new(TerminalRenderer::new()),
        config.poll_settings(),
    ))
}

/// Ctrl-C で実行中のチェーンを止める
fn cancel_on_ctrl_c(controller: &PollingResultController) {
    let cancel = controller.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("{}", messages::CANCELLED);
            cancel.cancel();
            // 2回目はそのまま終了
            tokio::time::sleep(Duration::from_millis(100)).await;
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        }
    });
}

fn save_report(controller: &PollingResultController, path: &Path) -> Result<()> {
    match AnalysisReport::from_state(controller.state()) {
        Some(report) => {
            report.save(path)?;
            println!("✔ 結果を保存: {}", path.display());
        }
        None => println!("解析結果がないため保存しませんでした"),
    }
    Ok(())
}
